//! Remote-custody account
//!
//! The account is only an address plus a wallet id. Every signing operation is
//! forwarded to a [`RemoteSigner`]; fee-currency transactions are encoded and
//! hashed here first because the custody service cannot build them.

use crate::error::{SignerError, SignerResult};
use crate::signature::decode_signature;
use crate::signer::{RemoteSigner, TypedDataPayload};
use crate::tx::{Cip64Transaction, StandardTxFields};
use crate::types::{SignableMessage, TypedDataRequest, UnsignedTx};
use alloy::primitives::{Address, Bytes, B256};
use std::sync::Arc;

/// The interface a chain client expects of an account
///
/// Signatures and signed transactions are returned as bytes (`0x`-hex on
/// display and in serde).
pub trait ChainAccount: Send + Sync {
    /// Returns the account address
    fn address(&self) -> Address;

    /// Signs a raw 32-byte hash
    fn sign(&self, hash: B256) -> impl std::future::Future<Output = SignerResult<Bytes>> + Send;

    /// Signs an EIP-191 personal message
    fn sign_message(
        &self,
        message: SignableMessage,
    ) -> impl std::future::Future<Output = SignerResult<Bytes>> + Send;

    /// Signs EIP-712 typed data
    fn sign_typed_data(
        &self,
        request: TypedDataRequest,
    ) -> impl std::future::Future<Output = SignerResult<Bytes>> + Send;

    /// Signs a transaction and returns its broadcastable encoding
    fn sign_transaction(
        &self,
        tx: UnsignedTx,
    ) -> impl std::future::Future<Output = SignerResult<Bytes>> + Send;
}

/// Which signer path a transaction takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningPath {
    /// CIP-64: encode and hash locally, sign the hash remotely
    FeeCurrency,
    /// Custody service builds and signs the transaction
    Standard,
}

impl SigningPath {
    /// A present, non-zero fee currency is the only thing that selects CIP-64
    pub fn for_tx(tx: &UnsignedTx) -> Self {
        if tx.uses_fee_currency() {
            Self::FeeCurrency
        } else {
            Self::Standard
        }
    }
}

/// Account whose key lives in a custody service
pub struct RemoteSigningAccount<C> {
    address: Address,
    wallet_id: String,
    client: Arc<C>,
}

impl<C> Clone for RemoteSigningAccount<C> {
    fn clone(&self) -> Self {
        Self {
            address: self.address,
            wallet_id: self.wallet_id.clone(),
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: RemoteSigner> RemoteSigningAccount<C> {
    /// Create an account trusting that `wallet_id` controls `address`
    pub fn new(client: Arc<C>, wallet_id: impl Into<String>, address: Address) -> Self {
        Self {
            address,
            wallet_id: wallet_id.into(),
            client,
        }
    }

    /// Create an account after checking with the custody service that
    /// `wallet_id` controls `address`
    pub async fn connect(
        client: Arc<C>,
        wallet_id: impl Into<String>,
        address: Address,
    ) -> SignerResult<Self> {
        let wallet_id = wallet_id.into();
        let actual = client
            .wallet_address(&wallet_id)
            .await
            .map_err(SignerError::Remote)?;

        if actual != address {
            return Err(SignerError::AddressMismatch {
                wallet_id,
                expected: address,
                actual,
            });
        }

        tracing::info!("Verified custody wallet {} at {}", wallet_id, address);
        Ok(Self::new(client, wallet_id, address))
    }

    pub fn wallet_id(&self) -> &str {
        &self.wallet_id
    }

    /// Serialize, hash, remote-sign and re-serialize a CIP-64 transaction
    async fn sign_fee_currency_tx(&self, tx: &UnsignedTx) -> SignerResult<Bytes> {
        let cip64 = Cip64Transaction::try_from(tx)?;
        let hash = cip64.signature_hash();
        tracing::debug!(
            "Signing CIP-64 transaction {} (fee currency {}) with wallet {}",
            hash,
            cip64.fee_currency,
            self.wallet_id
        );

        let raw = self
            .client
            .sign_raw_hash(&self.wallet_id, hash)
            .await
            .map_err(SignerError::Remote)?;
        let signature = decode_signature(&raw)?;

        Ok(cip64.encode_signed(&signature))
    }

    async fn sign_standard_tx(&self, tx: &UnsignedTx) -> SignerResult<Bytes> {
        let fields = StandardTxFields::try_from(tx)?;
        tracing::debug!(
            "Signing type {:?} transaction with wallet {}",
            fields.tx_type,
            self.wallet_id
        );

        self.client
            .sign_transaction(&self.wallet_id, &fields)
            .await
            .map_err(SignerError::Remote)
    }
}

impl<C: RemoteSigner> ChainAccount for RemoteSigningAccount<C> {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, hash: B256) -> SignerResult<Bytes> {
        let raw = self
            .client
            .sign_raw_hash(&self.wallet_id, hash)
            .await
            .map_err(SignerError::Remote)?;
        parse_signature_bytes(&raw)
    }

    async fn sign_message(&self, message: SignableMessage) -> SignerResult<Bytes> {
        let body = message.into_body()?;
        let raw = self
            .client
            .sign_message(&self.wallet_id, &body)
            .await
            .map_err(SignerError::Remote)?;
        parse_signature_bytes(&raw)
    }

    async fn sign_typed_data(&self, request: TypedDataRequest) -> SignerResult<Bytes> {
        request.validate()?;
        let payload = TypedDataPayload::from(&request);
        let raw = self
            .client
            .sign_typed_data(&self.wallet_id, &payload)
            .await
            .map_err(SignerError::Remote)?;
        parse_signature_bytes(&raw)
    }

    async fn sign_transaction(&self, tx: UnsignedTx) -> SignerResult<Bytes> {
        match SigningPath::for_tx(&tx) {
            SigningPath::FeeCurrency => self.sign_fee_currency_tx(&tx).await,
            SigningPath::Standard => self.sign_standard_tx(&tx).await,
        }
    }
}

fn parse_signature_bytes(raw: &str) -> SignerResult<Bytes> {
    raw.parse()
        .map_err(|e| SignerError::MalformedSignature(format!("invalid hex: {e}")))
}
