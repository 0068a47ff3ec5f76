//! Privy server-wallet client
//!
//! Signing goes through `POST /v1/wallets/{wallet_id}/rpc`; wallets are
//! created with `POST /v1/wallets` and looked up with `GET /v1/wallets/{id}`.
//! Requests use basic auth with the app credentials. When an authorization
//! key is configured, each POST also carries a P-256 signature over the
//! canonical request payload.

use super::{RemoteSigner, TypedDataPayload, WalletCreator};
use crate::config::PrivyConfig;
use crate::tx::StandardTxFields;
use crate::types::{ChainKind, MessageBody, Wallet};
use alloy::hex;
use alloy::primitives::{Address, Bytes, B256};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use eyre::{Context, Result};
use p256::ecdsa::{signature::Signer, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const AUTHORIZATION_KEY_PREFIX: &str = "wallet-auth:";

/// Privy server-wallet API client
pub struct PrivyClient {
    app_id: String,
    app_secret: String,
    api_base: String,
    /// P-256 key for `privy-authorization-signature`
    authorization_key: Option<SigningKey>,
    client: Client,
}

// ========== API Request/Response Types ==========

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    method: &'a str,
    params: P,
}

#[derive(Debug, Serialize)]
struct HashParams {
    hash: B256,
}

#[derive(Debug, Serialize)]
struct MessageParams<'a> {
    message: &'a str,
    encoding: &'static str,
}

#[derive(Debug, Serialize)]
struct TypedDataParams<'a> {
    typed_data: &'a TypedDataPayload,
}

#[derive(Debug, Serialize)]
struct TransactionParams<'a> {
    transaction: &'a StandardTxFields,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SignatureData {
    signature: String,
}

#[derive(Debug, Deserialize)]
struct SignedTransactionData {
    signed_transaction: String,
}

#[derive(Debug, Serialize)]
struct CreateWalletRequest<'a> {
    chain_type: ChainKind,
    owner: WalletOwner<'a>,
}

#[derive(Debug, Serialize)]
struct WalletOwner<'a> {
    user_id: &'a str,
}

impl PrivyClient {
    /// Create a client from configuration
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = PrivyClient::new(PrivyConfig::from_env()?)?;
    /// ```
    pub fn new(config: PrivyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Self::with_client(config, client)
    }

    /// Create a client reusing an existing HTTP client
    pub fn with_client(config: PrivyConfig, client: Client) -> Result<Self> {
        let authorization_key = config
            .authorization_key
            .as_deref()
            .map(parse_authorization_key)
            .transpose()
            .context("Failed to parse Privy authorization key")?;

        Ok(Self {
            app_id: config.app_id,
            app_secret: config.app_secret,
            api_base: config.api_base,
            authorization_key,
            client,
        })
    }

    /// Call a wallet RPC method and unwrap its `data` member
    async fn rpc<P, T>(&self, wallet_id: &str, method: &str, params: P) -> Result<T>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let url = format!("{}/v1/wallets/{}/rpc", self.api_base, wallet_id);
        let body = serde_json::to_string(&RpcRequest { method, params })
            .context("Failed to serialize request")?;

        tracing::debug!("Privy {} for wallet {}", method, wallet_id);
        let response: RpcResponse<T> = self.post(&url, body, method).await?;
        Ok(response.data)
    }

    async fn post<T: DeserializeOwned>(&self, url: &str, body: String, what: &str) -> Result<T> {
        let mut request = self
            .client
            .post(url)
            .basic_auth(&self.app_id, Some(&self.app_secret))
            .header("privy-app-id", &self.app_id)
            .header("Content-Type", "application/json");

        if let Some(signature) = self.authorization_signature(url, &body)? {
            request = request.header("privy-authorization-signature", signature);
        }

        let resp = request
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            eyre::bail!("Privy {} failed: {} - {}", what, status, body);
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))
    }

    /// Sign the canonical payload for `privy-authorization-signature`
    ///
    /// Payload: `{body, headers: {privy-app-id}, method, url, version: 1}` with
    /// keys sorted, signed with ECDSA P-256 / SHA-256, DER, base64.
    fn authorization_signature(&self, url: &str, body: &str) -> Result<Option<String>> {
        let Some(key) = &self.authorization_key else {
            return Ok(None);
        };

        let payload = canonical_payload(&self.app_id, url, body)?;
        let signature: p256::ecdsa::Signature = key.sign(payload.as_bytes());
        let sig_der = signature.to_der();
        Ok(Some(BASE64.encode(sig_der.as_bytes())))
    }
}

impl RemoteSigner for PrivyClient {
    async fn sign_raw_hash(&self, wallet_id: &str, hash: B256) -> Result<String> {
        let data: SignatureData = self
            .rpc(wallet_id, "secp256k1_sign", HashParams { hash })
            .await
            .context("Failed to sign hash")?;
        Ok(data.signature)
    }

    async fn sign_message(&self, wallet_id: &str, message: &MessageBody) -> Result<String> {
        let encoded;
        let params = match message {
            MessageBody::Utf8(text) => MessageParams {
                message: text,
                encoding: "utf-8",
            },
            MessageBody::Bytes(bytes) => {
                encoded = hex::encode_prefixed(bytes);
                MessageParams {
                    message: &encoded,
                    encoding: "hex",
                }
            }
        };

        let data: SignatureData = self
            .rpc(wallet_id, "personal_sign", params)
            .await
            .context("Failed to sign message")?;
        Ok(data.signature)
    }

    async fn sign_typed_data(&self, wallet_id: &str, typed_data: &TypedDataPayload) -> Result<String> {
        let data: SignatureData = self
            .rpc(
                wallet_id,
                "eth_signTypedData_v4",
                TypedDataParams { typed_data },
            )
            .await
            .context("Failed to sign typed data")?;
        Ok(data.signature)
    }

    async fn sign_transaction(&self, wallet_id: &str, tx: &StandardTxFields) -> Result<Bytes> {
        let data: SignedTransactionData = self
            .rpc(
                wallet_id,
                "eth_signTransaction",
                TransactionParams { transaction: tx },
            )
            .await
            .context("Failed to sign transaction")?;

        data.signed_transaction
            .parse()
            .context("Invalid signed transaction hex")
    }

    async fn wallet_address(&self, wallet_id: &str) -> Result<Address> {
        let url = format!("{}/v1/wallets/{}", self.api_base, wallet_id);

        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.app_id, Some(&self.app_secret))
            .header("privy-app-id", &self.app_id)
            .send()
            .await
            .context("Failed to fetch wallet")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            eyre::bail!("Failed to fetch wallet {}: {} - {}", wallet_id, status, body);
        }

        let wallet: Wallet = resp.json().await.context("Failed to parse wallet response")?;
        Ok(wallet.address)
    }
}

impl WalletCreator for PrivyClient {
    async fn create_wallet(&self, user_id: &str, chain: ChainKind) -> Result<Wallet> {
        let url = format!("{}/v1/wallets", self.api_base);
        let body = serde_json::to_string(&CreateWalletRequest {
            chain_type: chain,
            owner: WalletOwner { user_id },
        })
        .context("Failed to serialize request")?;

        let wallet: Wallet = self.post(&url, body, "create wallet").await?;
        tracing::info!("Created Privy wallet {} at {}", wallet.id, wallet.address);
        Ok(wallet)
    }
}

/// Canonical JSON (sorted keys, no whitespace) of the signed request envelope
fn canonical_payload(app_id: &str, url: &str, body: &str) -> Result<String> {
    let body: serde_json::Value =
        serde_json::from_str(body).context("Request body is not valid JSON")?;
    let envelope = serde_json::json!({
        "version": 1,
        "method": "POST",
        "url": url,
        "body": body,
        "headers": { "privy-app-id": app_id },
    });
    serde_json::to_string(&envelope).context("Failed to serialize authorization payload")
}

/// Parse a P-256 authorization key
///
/// Accepts the dashboard form (`wallet-auth:<base64 PKCS#8>`), bare base64
/// DER, or PEM (PKCS#8 or SEC1).
fn parse_authorization_key(key: &str) -> Result<SigningKey> {
    let key = key.replace("\\n", "\n").replace("\\r", "");
    let key = key.trim();
    let key = key.strip_prefix(AUTHORIZATION_KEY_PREFIX).unwrap_or(key);

    if key.contains("-----BEGIN") {
        let pem = normalize_pem(key);
        if let Ok(key) = SigningKey::from_pkcs8_pem(&pem) {
            return Ok(key);
        }
        if let Ok(secret) = p256::SecretKey::from_sec1_pem(&pem) {
            return Ok(SigningKey::from(secret));
        }
    } else {
        let content: String = key.chars().filter(|c| !c.is_whitespace()).collect();
        if let Ok(der) = BASE64.decode(content) {
            if let Ok(key) = SigningKey::from_pkcs8_der(&der) {
                return Ok(key);
            }
            if let Ok(secret) = p256::SecretKey::from_sec1_der(&der) {
                return Ok(SigningKey::from(secret));
            }
        }
    }

    eyre::bail!("Failed to parse authorization key - not a valid P-256 key")
}

/// Trim indentation and blank lines from a PEM block
fn normalize_pem(pem: &str) -> String {
    pem.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
