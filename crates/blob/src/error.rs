use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed encoding: {0}")]
    Borsh(#[from] std::io::Error),
    #[error("no decoder registered for {0}")]
    UnknownTypeUrl(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("blob tx carries no pay for blob message")]
    NoPayForBlob,
    #[error("{messages} pay for blob messages for {blobs} blobs")]
    BlobCountMismatch { messages: usize, blobs: usize },
    #[error("blob {index} does not match its pay for blob message")]
    BlobMismatch { index: usize },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
