use da_square_erasure_commit::{verify_commitment, CommitmentError};
use da_square_primitives::{Blob, Namespace, NamespaceError, SHARE_VERSION_ZERO};
use thiserror::Error;

use crate::{
    error::{Error, Result},
    registry::Registry,
    tx::{BlobTx, Message, MsgPayForBlob, Tx},
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
    #[error("declared blob size {declared} does not match actual size {actual}")]
    SizeMismatch { declared: u64, actual: u64 },
    #[error("blob size must be greater than zero")]
    ZeroBlobSize,
    #[error("unsupported share version {0}")]
    UnsupportedShareVersion(u8),
    #[error(transparent)]
    Commitment(#[from] CommitmentError),
}

/// Stateless checks on a pay for blob message and the blob bytes it pays
/// for. The first failing check is returned.
pub fn validate_basic(msg: &MsgPayForBlob, data: &[u8]) -> Result<(), ValidationError> {
    let namespace = Namespace::blob_namespace(&msg.namespace)?;

    if msg.blob_size == 0 {
        return Err(ValidationError::ZeroBlobSize);
    }
    if msg.blob_size != data.len() as u64 {
        return Err(ValidationError::SizeMismatch {
            declared: msg.blob_size,
            actual: data.len() as u64,
        });
    }
    if msg.share_version != SHARE_VERSION_ZERO {
        return Err(ValidationError::UnsupportedShareVersion(msg.share_version));
    }

    let blob = Blob {
        namespace,
        share_version: msg.share_version,
        data: data.to_vec(),
    };
    verify_commitment(&blob, &msg.share_commitment)?;
    Ok(())
}

/// A decoded blob tx whose messages have all been checked against its blobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedBlobTx {
    pub tx: Tx,
    /// Encoded inner tx, which is what lands in the transaction shares.
    pub raw_tx: Vec<u8>,
    pub pfbs: Vec<MsgPayForBlob>,
    pub blobs: Vec<Blob>,
}

/// Decodes the inner tx of `blob_tx` and pairs every pay for blob message
/// with the blob at the same position.
pub fn process_blob_tx(registry: &Registry, blob_tx: &BlobTx) -> Result<ProcessedBlobTx> {
    let tx = registry.decode_tx(&blob_tx.tx)?;

    let mut pfbs = vec![];
    for message in registry.decode_messages(&tx)? {
        match message {
            Message::PayForBlob(msg) => pfbs.push(msg),
            Message::Send(_) => {}
        }
    }
    if pfbs.is_empty() {
        return Err(Error::NoPayForBlob);
    }
    if pfbs.len() != blob_tx.blobs.len() {
        return Err(Error::BlobCountMismatch {
            messages: pfbs.len(),
            blobs: blob_tx.blobs.len(),
        });
    }

    for (index, (msg, blob)) in pfbs.iter().zip(&blob_tx.blobs).enumerate() {
        if msg.namespace != blob.namespace.as_bytes() || msg.share_version != blob.share_version {
            return Err(Error::BlobMismatch { index });
        }
        validate_basic(msg, &blob.data)?;
    }

    log::trace!("processed blob tx with {} blobs", blob_tx.blobs.len());
    Ok(ProcessedBlobTx {
        tx,
        raw_tx: blob_tx.tx.clone(),
        pfbs,
        blobs: blob_tx.blobs.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::MsgSend;

    fn valid() -> (MsgPayForBlob, Vec<u8>) {
        let data = vec![1u8; 2000];
        let blob = Blob::new(Namespace::new([1, 2, 3, 4, 5, 6, 7, 8]), data.clone());
        (MsgPayForBlob::new("signer", &blob).unwrap(), data)
    }

    #[test]
    fn test_valid_message() {
        let (msg, data) = valid();
        validate_basic(&msg, &data).unwrap();
    }

    #[test]
    fn test_reserved_namespaces() {
        let (mut msg, data) = valid();
        for (ns, expected) in [
            (vec![0xff; 8], "ParityShares"),
            (vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe], "TailPadding"),
            (vec![0, 0, 0, 0, 0, 0, 0, 1], "Reserved"),
            (vec![0, 0, 0, 0, 0, 0, 0, 2], "Reserved"),
            (vec![0, 0, 0, 0, 0, 0, 0, 3], "Reserved"),
            (vec![0, 0, 0, 0, 0, 0, 0, 255], "Reserved"),
            (vec![1, 2, 3], "InvalidLength"),
        ] {
            msg.namespace = ns;
            let err = validate_basic(&msg, &data).unwrap_err();
            assert!(matches!(err, ValidationError::Namespace(_)));
            assert!(format!("{err:?}").contains(expected), "{err:?}");
        }
    }

    #[test]
    fn test_size_mismatch() {
        let data = vec![3u8; 12];
        let blob = Blob::new(Namespace::new([1, 2, 3, 4, 5, 6, 7, 8]), data.clone());
        let mut msg = MsgPayForBlob::new("signer", &blob).unwrap();
        msg.blob_size = 10;
        assert!(matches!(
            validate_basic(&msg, &data),
            Err(ValidationError::SizeMismatch {
                declared: 10,
                actual: 12
            })
        ));
    }

    #[test]
    fn test_commitment_checks() {
        let (mut msg, data) = valid();
        msg.share_commitment = vec![];
        assert!(matches!(
            validate_basic(&msg, &data),
            Err(ValidationError::Commitment(CommitmentError::Empty))
        ));

        msg.share_commitment = vec![0; 32];
        assert!(matches!(
            validate_basic(&msg, &data),
            Err(ValidationError::Commitment(CommitmentError::Mismatch { .. }))
        ));

        // same length payload, different bytes
        let (msg, mut data) = valid();
        data[0] = 2;
        assert!(validate_basic(&msg, &data).is_err());
    }

    #[test]
    fn test_share_version_and_zero_size() {
        let (mut msg, data) = valid();
        msg.share_version = 1;
        assert!(matches!(
            validate_basic(&msg, &data),
            Err(ValidationError::UnsupportedShareVersion(1))
        ));

        let (mut msg, _) = valid();
        msg.blob_size = 0;
        assert!(matches!(validate_basic(&msg, &[]), Err(ValidationError::ZeroBlobSize)));
    }

    fn blob_tx(blobs: Vec<Blob>, msgs: Vec<Message>) -> BlobTx {
        BlobTx::new(&Tx::new(msgs).unwrap(), blobs).unwrap()
    }

    #[test]
    fn test_process_blob_tx() {
        let registry = Registry::with_default_messages();
        let blob = Blob::new(Namespace::new([1; 8]), vec![5; 700]);
        let msg = MsgPayForBlob::new("signer", &blob).unwrap();

        let processed =
            process_blob_tx(&registry, &blob_tx(vec![blob.clone()], vec![Message::PayForBlob(msg.clone())]))
                .unwrap();
        assert_eq!(processed.pfbs, vec![msg.clone()]);
        assert_eq!(processed.blobs, vec![blob.clone()]);
        assert_eq!(processed.raw_tx, processed.tx.encode().unwrap());

        let send = Message::Send(MsgSend {
            from: "a".into(),
            to: "b".into(),
            amount: 1,
        });
        assert!(matches!(
            process_blob_tx(&registry, &blob_tx(vec![blob.clone()], vec![send])),
            Err(Error::NoPayForBlob)
        ));
        assert!(matches!(
            process_blob_tx(&registry, &blob_tx(vec![], vec![Message::PayForBlob(msg.clone())])),
            Err(Error::BlobCountMismatch { messages: 1, blobs: 0 })
        ));

        let other = Blob::new(Namespace::new([2; 8]), vec![5; 700]);
        assert!(matches!(
            process_blob_tx(&registry, &blob_tx(vec![other], vec![Message::PayForBlob(msg)])),
            Err(Error::BlobMismatch { index: 0 })
        ));
    }
}
