use da_square_primitives::{Namespace, ShareError};
use thiserror::Error;

/// Raised while pushing leaves. The tree is left as it was before the failed
/// push, but callers are expected to throw it away and start over.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreePushError {
    #[error(
        "pushed past predetermined square size: boundary at {capacity} index at {axis_index} {share_index}"
    )]
    Overflow {
        capacity: usize,
        axis_index: usize,
        share_index: usize,
    },
    #[error("data of {0} bytes is too short to contain a namespace")]
    TooShort(usize),
    #[error("namespace {pushed} pushed after {previous}")]
    OutOfOrder {
        previous: Namespace,
        pushed: Namespace,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("invalid proof range {start}..{end} over {len} leaves")]
    InvalidRange { start: usize, end: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum CommitmentError {
    #[error("share commitment is empty")]
    Empty,
    #[error("subtree width {0} is not a power of two")]
    InvalidSquareSize(usize),
    #[error("share commitment mismatch: computed {computed} carried {carried}")]
    Mismatch { computed: String, carried: String },
    #[error("blob at share {start} needs {len} shares, square only has {capacity}")]
    OutOfBounds {
        start: usize,
        len: usize,
        capacity: usize,
    },
    #[error("subtree of {size} shares at index {index} crosses a row of {square_size}")]
    Misaligned {
        index: usize,
        size: usize,
        square_size: usize,
    },
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Tree(#[from] TreePushError),
}
