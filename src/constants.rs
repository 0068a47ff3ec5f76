//! Constants shared by the encoders and the custody client

use std::time::Duration;

/// EIP-2718 type byte of the Celo CIP-64 fee-currency transaction
pub const CIP64_TX_TYPE: u8 = 0x7b;

/// Largest integer a JSON number can carry without losing precision (2^53 - 1)
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Length of a compact `r || s || v` signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset of the legacy 27/28 recovery id convention
pub const LEGACY_V_OFFSET: u8 = 27;

/// Default Privy API base URL
pub const PRIVY_API_BASE: &str = "https://api.privy.io";

/// Default timeout for custody API requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of wallet creation attempts
pub const DEFAULT_PROVISION_ATTEMPTS: u32 = 3;

/// Default base delay between wallet creation attempts (multiplied by the attempt number)
pub const DEFAULT_PROVISION_BASE_DELAY: Duration = Duration::from_secs(1);
