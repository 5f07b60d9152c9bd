use std::collections::BTreeMap;

use borsh::BorshDeserialize;
use da_square_blob::{BlockData, DecodeError, Registry};
use da_square_primitives::Square;
use itertools::Itertools;

use crate::{builder::build, config::SquareConfig, error::Result};

/// Share count per hex encoded namespace.
pub type NamespaceSummary = BTreeMap<String, usize>;

/// Rebuilds the square of a borsh encoded [`BlockData`] and counts the shares
/// in every namespace.
pub fn namespace_summary(
    block: &[u8],
    config: &SquareConfig,
    registry: &Registry,
) -> Result<NamespaceSummary> {
    let data = BlockData::try_from_slice(block).map_err(DecodeError::from)?;
    let built = build(data.txs, config, registry)?;
    Ok(square_summary(&built.square))
}

pub fn square_summary(square: &Square) -> NamespaceSummary {
    square
        .shares()
        .iter()
        .map(|share| share.namespace().to_string())
        .counts()
        .into_iter()
        .collect()
}

pub fn to_json(summary: &NamespaceSummary) -> Result<String> {
    Ok(serde_json::to_string(summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use da_square_blob::{BlobTx, Message, MsgPayForBlob, Tx};
    use da_square_primitives::{Blob, Namespace};

    #[test]
    fn test_namespace_summary() {
        let blob = Blob::new(Namespace::new([0, 0, 0, 0, 0, 0, 1, 0]), vec![3; 2000]);
        let msg = MsgPayForBlob::new("signer", &blob).unwrap();
        let tx = Tx::new(vec![Message::PayForBlob(msg)]).unwrap();
        let raw = BlobTx::new(&tx, vec![blob]).unwrap().encode().unwrap();
        let block = borsh::to_vec(&BlockData { txs: vec![raw] }).unwrap();

        let summary = namespace_summary(
            &block,
            &SquareConfig::new(1, 64).unwrap(),
            &Registry::with_default_messages(),
        )
        .unwrap();
        assert_eq!(summary["0000000000000001"], 4);
        assert_eq!(summary["0000000000000100"], 4);
        assert_eq!(summary["fffffffffffffffe"], 8);
        assert_eq!(summary.values().sum::<usize>(), 16);

        let json = to_json(&summary).unwrap();
        assert_eq!(
            json,
            r#"{"0000000000000001":4,"0000000000000100":4,"fffffffffffffffe":8}"#
        );
    }

    #[test]
    fn test_empty_block_summary() {
        let block = borsh::to_vec(&BlockData::default()).unwrap();
        let summary = namespace_summary(
            &block,
            &SquareConfig::default(),
            &Registry::with_default_messages(),
        )
        .unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary["fffffffffffffffe"], 1);
    }

    #[test]
    fn test_malformed_block() {
        assert!(namespace_summary(
            &[1, 2],
            &SquareConfig::default(),
            &Registry::with_default_messages()
        )
        .is_err());
    }
}
