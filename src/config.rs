//! Configuration for the custody client and wallet provisioning

use crate::constants::{
    DEFAULT_PROVISION_ATTEMPTS, DEFAULT_PROVISION_BASE_DELAY, DEFAULT_REQUEST_TIMEOUT,
    PRIVY_API_BASE,
};
use crate::types::ChainKind;
use eyre::{Context, Result};
use std::time::Duration;

/// Credentials and endpoint for the Privy server-wallet API
#[derive(Debug, Clone)]
pub struct PrivyConfig {
    /// Privy app id (sent as basic-auth user and `privy-app-id` header)
    pub app_id: String,
    /// Privy app secret (basic-auth password)
    pub app_secret: String,
    /// API base URL, without trailing slash
    pub api_base: String,
    /// Optional P-256 authorization key in PEM format, required when wallets have owners
    pub authorization_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl PrivyConfig {
    /// Create a configuration for the production Privy API
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            api_base: PRIVY_API_BASE.to_string(),
            authorization_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from the environment (and `.env` if present)
    ///
    /// Reads `PRIVY_APP_ID`, `PRIVY_APP_SECRET` and, optionally,
    /// `PRIVY_API_BASE` and `PRIVY_AUTHORIZATION_KEY`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let app_id = std::env::var("PRIVY_APP_ID").context("PRIVY_APP_ID must be set")?;
        let app_secret =
            std::env::var("PRIVY_APP_SECRET").context("PRIVY_APP_SECRET must be set")?;

        let mut config = Self::new(app_id, app_secret);
        if let Ok(api_base) = std::env::var("PRIVY_API_BASE") {
            config = config.with_api_base(api_base);
        }
        if let Ok(key) = std::env::var("PRIVY_AUTHORIZATION_KEY") {
            config = config.with_authorization_key(key);
        }
        Ok(config)
    }

    /// Point the client at a different API base (e.g. a staging proxy)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the authorization key used to sign wallet RPC requests
    pub fn with_authorization_key(mut self, pem: impl Into<String>) -> Self {
        self.authorization_key = Some(pem.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Retry policy for wallet creation
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Total number of attempts (0 is treated as 1)
    pub max_attempts: u32,
    /// Delay before retry `n` is `base_delay * n`
    pub base_delay: Duration,
    /// Chain family of the wallets to create
    pub chain: ChainKind,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_PROVISION_ATTEMPTS,
            base_delay: DEFAULT_PROVISION_BASE_DELAY,
            chain: ChainKind::Ethereum,
        }
    }
}

impl ProvisionerConfig {
    /// Set the attempt bound
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the base delay
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the chain family
    pub fn with_chain(mut self, chain: ChainKind) -> Self {
        self.chain = chain;
        self
    }

    /// Attempt bound with the zero case folded to a single attempt
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}
