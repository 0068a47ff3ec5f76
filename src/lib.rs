//! Custody signer for Rust
//!
//! An EVM account whose private key never leaves a remote custody service.
//! The account is an address plus a custody wallet id; every signature is
//! delegated to the service. Celo fee-currency (CIP-64) transactions, which
//! the service's transaction builder cannot produce, are encoded and hashed
//! locally and only the hash is sent out for signing.
//!
//! # Features
//!
//! - Sign raw hashes, personal messages and EIP-712 typed data remotely
//! - Sign legacy / EIP-2930 / EIP-1559 transactions through the custody builder
//! - Sign CIP-64 fee-currency transactions with a locally built envelope
//! - Provision custody wallets with bounded retry
//!
//! # Example
//!
//! ```rust,ignore
//! use custody_signer::{ChainAccount, PrivyClient, PrivyConfig, RemoteSigningAccount, UnsignedTx};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let client = Arc::new(PrivyClient::new(PrivyConfig::from_env()?)?);
//!     let account = RemoteSigningAccount::connect(client, "wallet-id", "0x...".parse()?).await?;
//!
//!     // Pay gas in cUSD
//!     let tx = UnsignedTx::new("0x...".parse()?)
//!         .with_chain_id(42220)
//!         .with_nonce(0)
//!         .with_gas_limit(100_000)
//!         .with_fees(30_000_000_000, 1_000_000_000)
//!         .with_fee_currency("0x765DE816845861e75A25fCA122bb6898B8B1282a".parse()?);
//!     let raw = account.sign_transaction(tx).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod provisioner;
pub mod signature;
pub mod signer;
pub mod tx;
pub mod types;

// Re-export main types for convenience
pub use account::{ChainAccount, RemoteSigningAccount, SigningPath};
pub use codec::{to_boundary_json, TypedValue};
pub use config::{PrivyConfig, ProvisionerConfig};
pub use error::{eyre, Context, Report, Result, SignerError, SignerResult};
pub use provisioner::WalletProvisioner;
pub use signature::{decode_signature, DecodedSignature};
pub use signer::{LocalSigner, PrivyClient, RemoteSigner, TypedDataPayload, WalletCreator};
pub use tx::{Cip64Transaction, StandardTxFields};
pub use types::{
    ChainKind, MessageBody, SignableMessage, TxType, TypedDataField, TypedDataRequest,
    UnsignedTx, Wallet,
};
