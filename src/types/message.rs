//! Personal-sign message payloads

use crate::error::{SignerError, SignerResult};
use alloy::hex;
use alloy::primitives::Bytes;

/// A message as the caller expressed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignableMessage {
    /// UTF-8 text, signed as-is
    Text(String),
    /// Raw bytes
    Raw(Bytes),
    /// Raw bytes written as hex (`0x` optional)
    Hex(String),
}

/// The two shapes the custody service accepts for `personal_sign`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Utf8(String),
    Bytes(Bytes),
}

impl SignableMessage {
    /// Normalize into the body sent to the signer
    ///
    /// Raw and hex-encoded bytes end up in the same byte buffer.
    pub fn into_body(self) -> SignerResult<MessageBody> {
        match self {
            Self::Text(text) => Ok(MessageBody::Utf8(text)),
            Self::Raw(bytes) => Ok(MessageBody::Bytes(bytes)),
            Self::Hex(encoded) => hex::decode(&encoded)
                .map(|bytes| MessageBody::Bytes(bytes.into()))
                .map_err(|e| SignerError::invalid("message", format!("invalid hex: {e}"))),
        }
    }
}

impl From<&str> for SignableMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for SignableMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Bytes> for SignableMessage {
    fn from(bytes: Bytes) -> Self {
        Self::Raw(bytes)
    }
}

impl From<Vec<u8>> for SignableMessage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(bytes.into())
    }
}

impl MessageBody {
    /// The bytes that end up under the EIP-191 prefix
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Utf8(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}
