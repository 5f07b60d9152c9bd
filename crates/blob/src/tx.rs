use borsh::{BorshDeserialize, BorshSerialize};
use da_square_primitives::{Blob, Namespace};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{error::DecodeError, validate::ValidationError};

/// Marks a [`BlobTx`] envelope on the wire.
pub const BLOB_TX_TYPE_ID: [u8; 4] = *b"BLOB";

pub const URL_MSG_PAY_FOR_BLOB: &str = "/blob.MsgPayForBlob";
pub const URL_MSG_SEND: &str = "/bank.MsgSend";

/// A type tagged, encoded message.
#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Any {
    pub type_url: String,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub value: Vec<u8>,
}

/// A signed transaction. Signatures are checked before the square is built,
/// so only the messages travel here.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Tx {
    pub messages: Vec<Any>,
    pub memo: String,
}

impl Tx {
    pub fn new(messages: Vec<Message>) -> std::io::Result<Self> {
        Ok(Self {
            messages: messages
                .iter()
                .map(Message::to_any)
                .collect::<std::io::Result<_>>()?,
            memo: String::new(),
        })
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        borsh::to_vec(self)
    }
}

/// A transaction together with the blobs its pay for blob messages pay for.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct BlobTx {
    pub type_id: [u8; 4],
    pub tx: Vec<u8>,
    pub blobs: Vec<Blob>,
}

impl BlobTx {
    pub fn new(tx: &Tx, blobs: Vec<Blob>) -> std::io::Result<Self> {
        Ok(Self {
            type_id: BLOB_TX_TYPE_ID,
            tx: tx.encode()?,
            blobs,
        })
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        borsh::to_vec(self)
    }

    /// `Ok(None)` for bytes that are not a blob tx at all, an error for an
    /// envelope that is tagged but malformed.
    pub fn unmarshal(raw: &[u8]) -> Result<Option<Self>, DecodeError> {
        if !raw.starts_with(&BLOB_TX_TYPE_ID) {
            return Ok(None);
        }
        let tx = Self::try_from_slice(raw)?;
        Ok(Some(tx))
    }
}

/// Raw transactions of a block, in priority order.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockData {
    pub txs: Vec<Vec<u8>>,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MsgPayForBlob {
    pub signer: String,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub namespace: Vec<u8>,
    pub blob_size: u64,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub share_commitment: Vec<u8>,
    pub share_version: u8,
}

impl MsgPayForBlob {
    /// Builds the message paying for `blob`, computing its share commitment.
    pub fn new(signer: impl Into<String>, blob: &Blob) -> Result<Self, ValidationError> {
        blob.namespace.validate_for_blob()?;
        if blob.data.is_empty() {
            return Err(ValidationError::ZeroBlobSize);
        }
        let commitment = da_square_erasure_commit::create_blob_commitment(blob)?;
        Ok(Self {
            signer: signer.into(),
            namespace: blob.namespace.as_bytes().to_vec(),
            blob_size: blob.data.len() as u64,
            share_commitment: commitment.to_vec(),
            share_version: blob.share_version,
        })
    }

    /// Checks that need the message alone.
    pub fn validate_stateless(&self) -> Result<(), ValidationError> {
        Namespace::blob_namespace(&self.namespace)?;
        if self.blob_size == 0 {
            return Err(ValidationError::ZeroBlobSize);
        }
        if self.share_commitment.is_empty() {
            return Err(da_square_erasure_commit::CommitmentError::Empty.into());
        }
        Ok(())
    }
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MsgSend {
    pub from: String,
    pub to: String,
    pub amount: u64,
}

/// Every message kind the square builder understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    PayForBlob(MsgPayForBlob),
    Send(MsgSend),
}

impl Message {
    pub fn type_url(&self) -> &'static str {
        match self {
            Message::PayForBlob(_) => URL_MSG_PAY_FOR_BLOB,
            Message::Send(_) => URL_MSG_SEND,
        }
    }

    pub fn to_any(&self) -> std::io::Result<Any> {
        let value = match self {
            Message::PayForBlob(msg) => borsh::to_vec(msg)?,
            Message::Send(msg) => borsh::to_vec(msg)?,
        };
        Ok(Any {
            type_url: self.type_url().to_string(),
            value,
        })
    }
}
