//! Compact signature decoding
//!
//! The custody service returns `r || s || v` as 65 bytes of hex. Typed
//! transaction encoders want `v` as a 0/1 y-parity instead of the legacy
//! 27/28 recovery id.

use crate::constants::{LEGACY_V_OFFSET, SIGNATURE_LENGTH};
use crate::error::{SignerError, SignerResult};
use alloy::hex;
use alloy::primitives::{Address, Signature, B256, U256};

/// A 65-byte signature split into its components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSignature {
    /// Bytes [0, 32)
    pub r: B256,
    /// Bytes [32, 64)
    pub s: B256,
    /// Raw recovery byte as returned by the signer
    pub v: u8,
    /// `v` normalized to 0 or 1
    pub y_parity: u8,
}

/// Split a hex signature (optionally `0x`-prefixed) into `r`, `s` and parity
pub fn decode_signature(signature: &str) -> SignerResult<DecodedSignature> {
    let digits = signature.strip_prefix("0x").unwrap_or(signature);
    if digits.len() != SIGNATURE_LENGTH * 2 {
        return Err(SignerError::MalformedSignature(format!(
            "expected {} hex digits, got {}",
            SIGNATURE_LENGTH * 2,
            digits.len()
        )));
    }

    let bytes = hex::decode(digits)
        .map_err(|e| SignerError::MalformedSignature(format!("invalid hex: {e}")))?;

    let v = bytes[64];
    let y_parity = normalize_parity(v)?;

    Ok(DecodedSignature {
        r: B256::from_slice(&bytes[..32]),
        s: B256::from_slice(&bytes[32..64]),
        v,
        y_parity,
    })
}

/// Map a recovery id onto 0/1, rejecting anything outside {0, 1, 27, 28}
pub fn normalize_parity(v: u8) -> SignerResult<u8> {
    match v {
        0 | 1 => Ok(v),
        27 | 28 => Ok(v - LEGACY_V_OFFSET),
        other => Err(SignerError::InvalidRecoveryId(other)),
    }
}

impl DecodedSignature {
    /// Build from components, as found in a decoded transaction
    pub fn from_parts(r: U256, s: U256, y_parity: bool) -> Self {
        Self {
            r: B256::new(r.to_be_bytes::<32>()),
            s: B256::new(s.to_be_bytes::<32>()),
            v: y_parity as u8,
            y_parity: y_parity as u8,
        }
    }

    pub fn r_u256(&self) -> U256 {
        U256::from_be_bytes(self.r.0)
    }

    pub fn s_u256(&self) -> U256 {
        U256::from_be_bytes(self.s.0)
    }

    pub fn y_parity_bool(&self) -> bool {
        self.y_parity == 1
    }

    /// Convert to alloy's signature type
    pub fn to_primitive(&self) -> Signature {
        Signature::new(self.r_u256(), self.s_u256(), self.y_parity_bool())
    }

    /// Recover the address that produced this signature over `hash`
    pub fn recover_address(&self, hash: &B256) -> SignerResult<Address> {
        self.to_primitive()
            .recover_address_from_prehash(hash)
            .map_err(|e| SignerError::MalformedSignature(format!("unrecoverable: {e}")))
    }
}
