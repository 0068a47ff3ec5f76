//! Error types for the custody signer
//!
//! Remote clients use `eyre` for ergonomic error handling with context.
//! Everything a caller of the account sees is a [`SignerError`], so input
//! mistakes, signer incompatibilities and remote failures can be told apart.

use alloy::primitives::Address;

pub use eyre::{eyre, Context, Report, Result};

/// Result type returned by account operations
pub type SignerResult<T> = std::result::Result<T, SignerError>;

/// Errors surfaced by [`crate::RemoteSigningAccount`] and the pure helpers it uses
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// A field the operation cannot proceed without was absent
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field was present but unusable
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// The transaction kind tag is not one this crate can encode
    #[error("unsupported transaction type `{0}`")]
    UnsupportedTxType(String),

    /// The remote signature is not 65 bytes of hex
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The recovery byte is outside {0, 1, 27, 28}
    #[error("unsupported signature recovery id {0}, expected 0, 1, 27 or 28")]
    InvalidRecoveryId(u8),

    /// The custody wallet does not control the claimed address
    #[error("wallet {wallet_id} controls {actual}, not {expected}")]
    AddressMismatch {
        wallet_id: String,
        expected: Address,
        actual: Address,
    },

    /// The remote signer failed or returned a non-success response
    #[error("remote signer request failed: {0:#}")]
    Remote(Report),
}

impl SignerError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors detected locally rather than reported by the custody service
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Remote(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_keeps_context_chain() {
        let report = eyre!("503 Service Unavailable").wrap_err("Failed to sign hash");
        let err = SignerError::Remote(report);
        let msg = err.to_string();
        assert!(msg.contains("Failed to sign hash"));
        assert!(msg.contains("503 Service Unavailable"));
        assert!(!err.is_local());
    }

    #[test]
    fn test_local_errors() {
        assert!(SignerError::MissingField("domain").is_local());
        assert!(SignerError::InvalidRecoveryId(29).is_local());
        assert_eq!(
            SignerError::invalid("gasPrice", "not allowed").to_string(),
            "invalid field `gasPrice`: not allowed"
        );
    }
}
