use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use thiserror::Error;

use core::fmt;
use core::str::FromStr;

use crate::NAMESPACE_SIZE;

/// The namespace partitions shares by owner or kind. Ordering is lexicographic
/// over the raw bytes, which is what the namespaced merkle tree relies on.
#[serde_as]
#[derive(
    Clone,
    Copy,
    BorshSerialize,
    BorshDeserialize,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
pub struct Namespace(#[serde_as(as = "serde_with::hex::Hex")] pub [u8; NAMESPACE_SIZE]);

/// Transactions live here, always at the front of the square.
pub const TX_NAMESPACE: Namespace = Namespace([0, 0, 0, 0, 0, 0, 0, 1]);
pub const INTERMEDIATE_STATE_ROOT_NAMESPACE: Namespace = Namespace([0, 0, 0, 0, 0, 0, 0, 2]);
pub const EVIDENCE_NAMESPACE: Namespace = Namespace([0, 0, 0, 0, 0, 0, 0, 3]);
/// Everything up to and including this value is reserved for the protocol.
pub const MAX_RESERVED_NAMESPACE: Namespace = Namespace([0, 0, 0, 0, 0, 0, 0, 0xff]);
pub const TAIL_PADDING_NAMESPACE: Namespace =
    Namespace([0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]);
/// Assigned to every erasure coded share. Being the maximal value, it also
/// marks the namespace the tree ignores when tracking the max of a subtree.
pub const PARITY_SHARES_NAMESPACE: Namespace = Namespace([0xff; NAMESPACE_SIZE]);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NamespaceError {
    #[error("invalid namespace length: got {got} want {want}")]
    InvalidLength { got: usize, want: usize },
    #[error("reserved namespace: got {0} want > 00000000000000ff")]
    Reserved(Namespace),
    #[error("namespace {0} is reserved for parity shares")]
    ParityShares(Namespace),
    #[error("namespace {0} is reserved for tail padding")]
    TailPadding(Namespace),
    #[error("invalid namespace hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl Namespace {
    pub const fn new(id: [u8; NAMESPACE_SIZE]) -> Self {
        Self(id)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        *self <= MAX_RESERVED_NAMESPACE
    }

    pub fn is_parity(&self) -> bool {
        *self == PARITY_SHARES_NAMESPACE
    }

    pub fn is_tail_padding(&self) -> bool {
        *self == TAIL_PADDING_NAMESPACE
    }

    /// Checks that a namespace may carry user blobs.
    pub fn validate_for_blob(&self) -> Result<(), NamespaceError> {
        if self.is_reserved() {
            return Err(NamespaceError::Reserved(*self));
        }
        if self.is_parity() {
            return Err(NamespaceError::ParityShares(*self));
        }
        if self.is_tail_padding() {
            return Err(NamespaceError::TailPadding(*self));
        }
        Ok(())
    }

    /// Length checked conversion followed by [`Namespace::validate_for_blob`].
    pub fn blob_namespace(raw: &[u8]) -> Result<Self, NamespaceError> {
        let ns = Self::try_from(raw)?;
        ns.validate_for_blob()?;
        Ok(ns)
    }
}

impl TryFrom<&[u8]> for Namespace {
    type Error = NamespaceError;
    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        let id: [u8; NAMESPACE_SIZE] =
            raw.try_into()
                .map_err(|_| NamespaceError::InvalidLength {
                    got: raw.len(),
                    want: NAMESPACE_SIZE,
                })?;
        Ok(Self(id))
    }
}

impl From<[u8; NAMESPACE_SIZE]> for Namespace {
    fn from(id: [u8; NAMESPACE_SIZE]) -> Self {
        Self(id)
    }
}

impl AsRef<[u8]> for Namespace {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Namespace {
    type Err = NamespaceError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s.trim_start_matches("0x"))?;
        Self::try_from(raw.as_slice())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", hex::encode(self.0))
    }
}
