//! Remote signer abstraction
//!
//! The account never holds key material. Every signature is requested from a
//! [`RemoteSigner`], addressed by wallet id:
//! - `PrivyClient`: Privy server-wallet API over HTTPS
//! - `LocalSigner`: a local dev key behind the same interface, for tests and devnets

mod local;
mod privy;

pub use local::LocalSigner;
pub use privy::PrivyClient;

use crate::tx::StandardTxFields;
use crate::types::{ChainKind, MessageBody, TypedDataRequest, TypedDataTypes, Wallet};
use alloy::primitives::{Address, Bytes, B256};
use eyre::Result;
use serde::Serialize;
use serde_json::Value;

/// Typed data as it crosses the boundary: wide integers already hex-encoded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedDataPayload {
    pub domain: Value,
    pub types: TypedDataTypes,
    pub primary_type: String,
    pub message: Value,
}

impl From<&TypedDataRequest> for TypedDataPayload {
    fn from(request: &TypedDataRequest) -> Self {
        Self {
            domain: request.boundary_domain(),
            types: request.types.clone(),
            primary_type: request.primary_type.clone(),
            message: request.boundary_message(),
        }
    }
}

/// Signing operations offered by a key-custody service
///
/// Signatures come back as hex strings exactly as the service returned them;
/// decoding is the caller's job.
pub trait RemoteSigner: Send + Sync {
    /// Sign a 32-byte digest with no prefixing
    fn sign_raw_hash(
        &self,
        wallet_id: &str,
        hash: B256,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// EIP-191 personal_sign
    fn sign_message(
        &self,
        wallet_id: &str,
        message: &MessageBody,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// EIP-712 typed data signature
    fn sign_typed_data(
        &self,
        wallet_id: &str,
        typed_data: &TypedDataPayload,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Build, sign and serialize a legacy / EIP-2930 / EIP-1559 transaction
    fn sign_transaction(
        &self,
        wallet_id: &str,
        tx: &StandardTxFields,
    ) -> impl std::future::Future<Output = Result<Bytes>> + Send;

    /// Address controlled by a wallet
    fn wallet_address(
        &self,
        wallet_id: &str,
    ) -> impl std::future::Future<Output = Result<Address>> + Send;
}

/// Wallet creation on a custody service
pub trait WalletCreator: Send + Sync {
    fn create_wallet(
        &self,
        user_id: &str,
        chain: ChainKind,
    ) -> impl std::future::Future<Output = Result<Wallet>> + Send;
}
