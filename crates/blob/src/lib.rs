//! Pay for blob messages, the transaction envelopes that carry blobs, and the
//! checks a blob transaction must pass before it can be placed in a square.

pub mod error;
pub mod registry;
pub mod tx;
pub mod validate;

pub use error::{DecodeError, Error, Result};
pub use registry::Registry;
pub use tx::{
    Any, BlobTx, BlockData, Message, MsgPayForBlob, MsgSend, Tx, BLOB_TX_TYPE_ID,
    URL_MSG_PAY_FOR_BLOB, URL_MSG_SEND,
};
pub use validate::{process_blob_tx, validate_basic, ProcessedBlobTx, ValidationError};
