//! Local private key stand-in for the custody service
//!
//! Behaves like the remote API at the boundary: signatures come back as
//! 65-byte hex with a 27/28 recovery id, and standard transactions are built
//! and serialized by the signer itself. Meant for tests and local chains.

use super::{RemoteSigner, TypedDataPayload};
use crate::constants::LEGACY_V_OFFSET;
use crate::tx::StandardTxFields;
use crate::types::{ChainKind, MessageBody, Wallet};
use alloy::consensus::{SignableTransaction, Signed, TxEip1559, TxEip2930, TxEnvelope, TxLegacy};
use alloy::dyn_abi::TypedData;
use alloy::eips::eip2718::Encodable2718;
use alloy::hex;
use alloy::primitives::{Address, Bytes, Signature, TxKind, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use eyre::{Context, Result};

/// Signer holding a local key under a fixed wallet id
pub struct LocalSigner {
    wallet_id: String,
    signer: PrivateKeySigner,
}

impl LocalSigner {
    /// Create a LocalSigner from a private key hex string
    ///
    /// # Arguments
    ///
    /// * `wallet_id` - Id callers will address this wallet by
    /// * `private_key` - Hex-encoded private key (with or without 0x prefix)
    pub fn from_private_key(wallet_id: impl Into<String>, private_key: impl AsRef<str>) -> Result<Self> {
        let key = private_key.as_ref();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner = key.parse().context("Failed to parse private key")?;

        Ok(Self {
            wallet_id: wallet_id.into(),
            signer,
        })
    }

    /// Create a LocalSigner with a freshly generated key
    pub fn random(wallet_id: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            signer: PrivateKeySigner::random(),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn wallet_id(&self) -> &str {
        &self.wallet_id
    }

    /// The wallet record this signer answers for
    pub fn wallet(&self) -> Wallet {
        Wallet {
            id: self.wallet_id.clone(),
            address: self.address(),
            chain_type: ChainKind::Ethereum,
        }
    }

    fn check_wallet(&self, wallet_id: &str) -> Result<()> {
        if wallet_id != self.wallet_id {
            eyre::bail!("Unknown wallet {}", wallet_id);
        }
        Ok(())
    }

    fn sign_digest(&self, hash: &B256) -> Result<String> {
        let signature = self
            .signer
            .sign_hash_sync(hash)
            .context("Failed to sign hash")?;
        Ok(compact_hex(&signature))
    }

    fn sign_tx<T: SignableTransaction<Signature>>(&self, tx: T) -> Result<Signed<T>> {
        let signature = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .context("Failed to sign transaction")?;
        Ok(tx.into_signed(signature))
    }

    /// Build and sign the transaction the way the custody service would
    fn build_signed(&self, fields: &StandardTxFields) -> Result<TxEnvelope> {
        let to = TxKind::from(fields.to);
        let chain_id = fields.chain_id.map(|id| id.to::<u64>());
        let nonce = fields.nonce.map(|n| n.to::<u64>()).unwrap_or_default();
        let gas_limit = fields.gas_limit.map(|g| g.to::<u64>()).unwrap_or_default();
        let value = fields.value.unwrap_or_default();
        let input = fields.data.clone().unwrap_or_default();
        let access_list = fields.access_list.clone().unwrap_or_default();
        let gas_price = fields.gas_price.map(|p| p.to::<u128>()).unwrap_or_default();

        let envelope = match fields.tx_type.unwrap_or(2) {
            0 => TxEnvelope::from(self.sign_tx(TxLegacy {
                chain_id,
                nonce,
                gas_price,
                gas_limit,
                to,
                value,
                input,
            })?),
            1 => TxEnvelope::from(self.sign_tx(TxEip2930 {
                chain_id: chain_id.unwrap_or_default(),
                nonce,
                gas_price,
                gas_limit,
                to,
                value,
                access_list,
                input,
            })?),
            2 => TxEnvelope::from(self.sign_tx(TxEip1559 {
                chain_id: chain_id.unwrap_or_default(),
                nonce,
                gas_limit,
                max_fee_per_gas: fields
                    .max_fee_per_gas
                    .map(|f| f.to::<u128>())
                    .unwrap_or_default(),
                max_priority_fee_per_gas: fields
                    .max_priority_fee_per_gas
                    .map(|f| f.to::<u128>())
                    .unwrap_or_default(),
                to,
                value,
                access_list,
                input,
            })?),
            other => eyre::bail!("Unsupported transaction type {}", other),
        };
        Ok(envelope)
    }
}

impl RemoteSigner for LocalSigner {
    async fn sign_raw_hash(&self, wallet_id: &str, hash: B256) -> Result<String> {
        self.check_wallet(wallet_id)?;
        self.sign_digest(&hash)
    }

    async fn sign_message(&self, wallet_id: &str, message: &MessageBody) -> Result<String> {
        self.check_wallet(wallet_id)?;
        let signature = self
            .signer
            .sign_message_sync(message.as_bytes())
            .context("Failed to sign message")?;
        Ok(compact_hex(&signature))
    }

    async fn sign_typed_data(&self, wallet_id: &str, typed_data: &TypedDataPayload) -> Result<String> {
        self.check_wallet(wallet_id)?;
        let typed: TypedData = serde_json::from_value(serde_json::json!({
            "domain": typed_data.domain,
            "types": typed_data.types,
            "primaryType": typed_data.primary_type,
            "message": typed_data.message,
        }))
        .context("Failed to parse typed data")?;
        let hash = typed
            .eip712_signing_hash()
            .context("Failed to hash typed data")?;
        self.sign_digest(&hash)
    }

    async fn sign_transaction(&self, wallet_id: &str, tx: &StandardTxFields) -> Result<Bytes> {
        self.check_wallet(wallet_id)?;
        let envelope = self.build_signed(tx)?;
        Ok(envelope.encoded_2718().into())
    }

    async fn wallet_address(&self, wallet_id: &str) -> Result<Address> {
        self.check_wallet(wallet_id)?;
        Ok(self.address())
    }
}

/// `r || s || v` hex with the legacy 27/28 recovery id, as custody APIs return it
fn compact_hex(signature: &Signature) -> String {
    let mut bytes = [0u8; 65];
    bytes[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    bytes[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
    bytes[64] = LEGACY_V_OFFSET + signature.v() as u8;
    hex::encode_prefixed(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::decode_signature;
    use crate::types::TypedDataRequest;
    use alloy::eips::eip2718::Decodable2718;
    use alloy::primitives::{address, U256, U64, U128};

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[tokio::test]
    async fn test_raw_hash_signature_shape() {
        let signer = LocalSigner::from_private_key("w1", KEY).unwrap();
        let hash = B256::repeat_byte(0x07);
        let sig = signer.sign_raw_hash("w1", hash).await.unwrap();

        assert_eq!(sig.len(), 132);
        let decoded = decode_signature(&sig).unwrap();
        assert!(decoded.v == 27 || decoded.v == 28);
        assert_eq!(decoded.recover_address(&hash).unwrap(), signer.address());
    }

    #[tokio::test]
    async fn test_unknown_wallet() {
        let signer = LocalSigner::random("w1");
        assert!(signer.sign_raw_hash("w2", B256::ZERO).await.is_err());
        assert!(signer.wallet_address("w2").await.is_err());
        assert_eq!(signer.wallet_address("w1").await.unwrap(), signer.address());
    }

    #[tokio::test]
    async fn test_signs_eip1559_envelope() {
        let signer = LocalSigner::from_private_key("w1", KEY).unwrap();
        let fields = StandardTxFields {
            tx_type: Some(2),
            to: Some(address!("1111111111111111111111111111111111111111")),
            nonce: Some(U64::from(3)),
            chain_id: Some(U64::from(1)),
            value: Some(U256::from(5)),
            gas_limit: Some(U64::from(21_000)),
            max_fee_per_gas: Some(U128::from(2_000_000_000u64)),
            max_priority_fee_per_gas: Some(U128::from(1_000_000_000u64)),
            ..Default::default()
        };

        let raw = signer.sign_transaction("w1", &fields).await.unwrap();
        assert_eq!(raw[0], 0x02);

        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
        let TxEnvelope::Eip1559(signed) = envelope else {
            panic!("expected an eip1559 envelope");
        };
        assert_eq!(signed.tx().nonce, 3);
        let sender = signed
            .signature()
            .recover_address_from_prehash(&signed.tx().signature_hash())
            .unwrap();
        assert_eq!(sender, signer.address());
    }

    #[tokio::test]
    async fn test_signs_legacy_envelope() {
        let signer = LocalSigner::from_private_key("w1", KEY).unwrap();
        let fields = StandardTxFields {
            tx_type: Some(0),
            to: Some(address!("1111111111111111111111111111111111111111")),
            nonce: Some(U64::from(0)),
            chain_id: Some(U64::from(1)),
            gas_limit: Some(U64::from(21_000)),
            gas_price: Some(U128::from(1_000_000_000u64)),
            ..Default::default()
        };

        let raw = signer.sign_transaction("w1", &fields).await.unwrap();
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
        assert!(matches!(envelope, TxEnvelope::Legacy(_)));
    }

    #[tokio::test]
    async fn test_typed_data_signature_recovers() {
        let signer = LocalSigner::from_private_key("w1", KEY).unwrap();
        let typed_json = serde_json::json!({
            "domain": {
                "name": "Token",
                "version": "1",
                "chainId": 1,
                "verifyingContract": "0x2222222222222222222222222222222222222222"
            },
            "types": {
                "Permit": [
                    {"name": "owner", "type": "address"},
                    {"name": "value", "type": "uint256"}
                ]
            },
            "primaryType": "Permit",
            "message": {
                "owner": "0x1111111111111111111111111111111111111111",
                "value": 42
            }
        });

        let request = TypedDataRequest::from_json(&typed_json).unwrap();
        let sig = signer
            .sign_typed_data("w1", &TypedDataPayload::from(&request))
            .await
            .unwrap();

        let typed: TypedData = serde_json::from_value(typed_json).unwrap();
        let hash = typed.eip712_signing_hash().unwrap();
        let recovered = decode_signature(&sig).unwrap().recover_address(&hash).unwrap();
        assert_eq!(recovered, signer.address());
    }
}
