use std::time::Duration;

use log::*;
use lpg_common::env_or_default;

pub const DEFAULT_ACCRUAL_ADDRESS: &str = "http://localhost:8081";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Scheme, host and port of the accrual system, e.g. `http://localhost:8081`
    pub base_url: String,
    /// Upper bound on a single settlement query, connection time included.
    pub timeout: Duration,
    /// Backoff to report when a rate-limit response carries no usable `Retry-After` header.
    pub default_retry_after: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ACCRUAL_ADDRESS)
    }
}

impl AccrualConfig {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: normalize_base_url(base_url), timeout: DEFAULT_TIMEOUT, default_retry_after: DEFAULT_RETRY_AFTER }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_retry_after(mut self, retry_after: Duration) -> Self {
        self.default_retry_after = retry_after;
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("ACCRUAL_SYSTEM_ADDRESS").unwrap_or_else(|_| {
            warn!("ACCRUAL_SYSTEM_ADDRESS not set, using {DEFAULT_ACCRUAL_ADDRESS} as default");
            DEFAULT_ACCRUAL_ADDRESS.to_string()
        });
        Self::new(&base_url).with_env_tuning()
    }

    /// Overrides the timeout and the default backoff with `LPG_ACCRUAL_TIMEOUT_SECS` and
    /// `LPG_ACCRUAL_DEFAULT_RETRY_SECS`, where they are set.
    pub fn with_env_tuning(self) -> Self {
        let timeout = env_or_default("LPG_ACCRUAL_TIMEOUT_SECS", self.timeout.as_secs());
        let retry = env_or_default("LPG_ACCRUAL_DEFAULT_RETRY_SECS", self.default_retry_after.as_secs());
        // A zero timeout would fail every request
        self.with_timeout(Duration::from_secs(timeout.max(1))).with_default_retry_after(Duration::from_secs(retry))
    }
}

/// Accepts `host:port` as well as full URLs, since the address is often configured without a scheme.
fn normalize_base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}
