use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

pub mod namespace;
pub mod shares;
pub mod square;

pub use namespace::{
    Namespace, NamespaceError, EVIDENCE_NAMESPACE, INTERMEDIATE_STATE_ROOT_NAMESPACE,
    MAX_RESERVED_NAMESPACE, PARITY_SHARES_NAMESPACE, TAIL_PADDING_NAMESPACE, TX_NAMESPACE,
};
pub use shares::{Share, ShareError};
pub use square::{Square, SquareError};

pub type Data = Vec<u8>;
pub type ShareVersion = u8;
pub type Commitment = [u8; 32];

/// Size of a namespace identifier in bytes.
pub const NAMESPACE_SIZE: usize = 8;
/// Size of a share in bytes.
pub const SHARE_SIZE: usize = 512;
pub const SHARE_INFO_BYTES: usize = 1;
pub const SHARE_VERSION_ZERO: ShareVersion = 0;
/// The info byte spends its low bit on the sequence start flag.
pub const MAX_SHARE_VERSION: ShareVersion = 127;
pub const MIN_SQUARE_SIZE: usize = 1;
pub const DEFAULT_MAX_SQUARE_SIZE: usize = 128;
/// Largest width whose extended rows, `2k` shares, the erasure codec can take.
pub const MAX_SQUARE_SIZE: usize = 1 << 15;

/// A blob is what a user pays to have included: arbitrary bytes under a
/// namespace they chose.
#[serde_as]
#[derive(Deserialize, Serialize, BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub namespace: Namespace,
    pub share_version: ShareVersion,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub data: Data,
}

impl Blob {
    pub fn new(namespace: Namespace, data: Data) -> Self {
        Self {
            namespace,
            share_version: SHARE_VERSION_ZERO,
            data,
        }
    }

    pub fn to_shares(&self) -> Result<Vec<Share>, ShareError> {
        shares::split_sequence(self.namespace, self.share_version, &self.data)
    }

    pub fn share_count(&self) -> usize {
        shares::shares_needed(self.data.len())
    }
}
