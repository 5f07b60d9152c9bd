use da_square_blob::DecodeError;
use da_square_primitives::{ShareError, SquareError};
use thiserror::Error;

/// Degenerate layout parameters. These point at a bug or a bad config, and
/// are never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("square size {0} is not a power of two")]
    InvalidSquareSize(usize),
    #[error("square size {size} exceeds the largest supported width {max}")]
    SquareTooLarge { size: usize, max: usize },
    #[error("minimum square size {min} exceeds maximum {max}")]
    InvalidBounds { min: usize, max: usize },
    #[error("message must occupy at least one share")]
    EmptyMessage,
    #[error("share index {0} does not fit in 32 bits")]
    IndexOverflow(usize),
}

/// The transaction does not fit in this block. It may still fit in another.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("blob of {shares} shares exceeds square capacity of {capacity}")]
    BlobTooLarge { shares: usize, capacity: usize },
    #[error("square of {capacity} shares is full")]
    SquareFull { capacity: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Blob(#[from] da_square_blob::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Square(#[from] SquareError),
    #[error("share {index} breaks namespace ordering")]
    Unordered { index: usize },
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
