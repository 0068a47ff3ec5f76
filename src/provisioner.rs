//! Custody wallet provisioning with bounded retry

use crate::config::ProvisionerConfig;
use crate::signer::WalletCreator;
use crate::types::Wallet;
use eyre::Result;
use std::sync::Arc;

/// Creates custody wallets, retrying with linear backoff
pub struct WalletProvisioner<C> {
    creator: Arc<C>,
    config: ProvisionerConfig,
}

impl<C: WalletCreator> WalletProvisioner<C> {
    pub fn new(creator: Arc<C>, config: ProvisionerConfig) -> Self {
        Self { creator, config }
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Create a wallet for `user_id`
    ///
    /// Tries up to `max_attempts` times, sleeping `base_delay * attempt`
    /// after each failure. When every attempt fails the last error is
    /// returned as-is. A wallet created by an attempt that timed out on our
    /// side is not detected here.
    pub async fn create_wallet(&self, user_id: &str) -> Result<Wallet> {
        let max_attempts = self.config.attempts();
        let mut attempt = 1;

        loop {
            match self.creator.create_wallet(user_id, self.config.chain).await {
                Ok(wallet) => {
                    tracing::info!(
                        "Provisioned wallet {} for user {} (attempt {}/{})",
                        wallet.id,
                        user_id,
                        attempt,
                        max_attempts
                    );
                    return Ok(wallet);
                }
                Err(err) if attempt < max_attempts => {
                    let delay = self.config.delay_after(attempt);
                    tracing::warn!(
                        "Wallet creation for user {} failed (attempt {}/{}), retrying in {:?}: {:#}",
                        user_id,
                        attempt,
                        max_attempts,
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChainKind;
    use alloy::primitives::address;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Fails the first `failures` calls, recording when each call happened
    struct FlakyCreator {
        failures: usize,
        calls: Mutex<Vec<Instant>>,
    }

    impl FlakyCreator {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1] - w[0]).collect()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl WalletCreator for FlakyCreator {
        async fn create_wallet(&self, user_id: &str, chain: ChainKind) -> Result<Wallet> {
            let n = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(Instant::now());
                calls.len()
            };
            if n <= self.failures {
                eyre::bail!("attempt {} failed", n);
            }
            Ok(Wallet {
                id: format!("wallet-for-{user_id}"),
                address: address!("1111111111111111111111111111111111111111"),
                chain_type: chain,
            })
        }
    }

    fn provisioner(creator: &Arc<FlakyCreator>) -> WalletProvisioner<FlakyCreator> {
        let config = ProvisionerConfig::default().with_base_delay(Duration::from_millis(100));
        WalletProvisioner::new(Arc::clone(creator), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let creator = Arc::new(FlakyCreator::new(2));
        let wallet = provisioner(&creator).create_wallet("user-1").await.unwrap();

        assert_eq!(wallet.id, "wallet-for-user-1");
        assert_eq!(creator.call_count(), 3);

        let gaps = creator.gaps();
        assert_eq!(gaps.len(), 2);
        assert!(gaps[0] >= Duration::from_millis(100));
        assert!(gaps[1] >= Duration::from_millis(200));
        assert!(gaps[0] <= gaps[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_after_bound() {
        let creator = Arc::new(FlakyCreator::new(usize::MAX));
        let err = provisioner(&creator).create_wallet("user-1").await.unwrap_err();

        assert_eq!(creator.call_count(), 3);
        assert_eq!(err.to_string(), "attempt 3 failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_try_does_not_sleep() {
        let creator = Arc::new(FlakyCreator::new(0));
        let start = Instant::now();
        let wallet = tokio_test::assert_ok!(provisioner(&creator).create_wallet("user-1").await);
        assert_eq!(wallet.chain_type, ChainKind::Ethereum);
        assert_eq!(creator.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_bound() {
        let creator = Arc::new(FlakyCreator::new(1));
        let config = ProvisionerConfig::default().with_max_attempts(0);
        let provisioner = WalletProvisioner::new(Arc::clone(&creator), config);

        let err = tokio_test::assert_err!(provisioner.create_wallet("user-1").await);
        assert_eq!(err.to_string(), "attempt 1 failed");
        assert_eq!(creator.call_count(), 1);
    }
}
