use std::collections::HashMap;

use borsh::BorshDeserialize;

use crate::{
    error::DecodeError,
    tx::{Any, Message, MsgPayForBlob, MsgSend, Tx, URL_MSG_PAY_FOR_BLOB, URL_MSG_SEND},
};

pub type Decoder = fn(&[u8]) -> Result<Message, DecodeError>;

/// Maps message type urls to their decoders. Built once and passed to
/// whatever needs to look inside a transaction.
#[derive(Clone, Default)]
pub struct Registry {
    decoders: HashMap<String, Decoder>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_messages() -> Self {
        let mut registry = Self::new();
        registry.register(URL_MSG_PAY_FOR_BLOB, |raw| {
            Ok(Message::PayForBlob(MsgPayForBlob::try_from_slice(raw)?))
        });
        registry.register(URL_MSG_SEND, |raw| {
            Ok(Message::Send(MsgSend::try_from_slice(raw)?))
        });
        registry
    }

    pub fn register(&mut self, type_url: impl Into<String>, decoder: Decoder) {
        self.decoders.insert(type_url.into(), decoder);
    }

    pub fn is_registered(&self, type_url: &str) -> bool {
        self.decoders.contains_key(type_url)
    }

    /// Decodes a transaction, failing if any message kind is unknown.
    pub fn decode_tx(&self, raw: &[u8]) -> Result<Tx, DecodeError> {
        let tx = Tx::try_from_slice(raw)?;
        if let Some(unknown) = tx.messages.iter().find(|m| !self.is_registered(&m.type_url)) {
            return Err(DecodeError::UnknownTypeUrl(unknown.type_url.clone()));
        }
        Ok(tx)
    }

    pub fn decode_message(&self, any: &Any) -> Result<Message, DecodeError> {
        let decoder = self
            .decoders
            .get(&any.type_url)
            .ok_or_else(|| DecodeError::UnknownTypeUrl(any.type_url.clone()))?;
        decoder(&any.value)
    }

    pub fn decode_messages(&self, tx: &Tx) -> Result<Vec<Message>, DecodeError> {
        tx.messages.iter().map(|any| self.decode_message(any)).collect()
    }
}
