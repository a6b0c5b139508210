//! Tollgate configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default time-to-live of a freshly minted entitlement (14 days).
pub const DEFAULT_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Default file name of the persisted token.
pub const DEFAULT_TOKEN_FILE: &str = "entitlement.token";

/// Default pause between live re-checks while not entitled.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound on how long the retry loop keeps trying.
pub const DEFAULT_RETRY_MAX_WAIT: Duration = Duration::from_secs(180);

/// Configuration for an [`EntitlementStore`](crate::EntitlementStore).
///
/// The identity fields feed key derivation, so changing them orphans any
/// token written under the old values.
#[derive(Debug, Clone)]
pub struct TollgateConfig {
    /// Publisher name (e.g., "Shinymoon")
    pub company_name: &'static str,

    /// Product name (e.g., "MateEngine")
    pub product_name: &'static str,

    /// Cache namespace for storing the token.
    /// Used as a directory name under the platform data directory.
    pub cache_namespace: &'static str,

    /// File name of the encrypted token inside the cache directory.
    pub token_file_name: &'static str,

    /// Explicit cache directory. Overrides `data_dir()/<cache_namespace>`.
    pub cache_dir: Option<PathBuf>,

    /// How long a minted entitlement stays valid without a live re-check.
    pub default_ttl: Duration,

    /// Pause between live re-checks in the retry loop.
    pub retry_interval: Duration,

    /// Total time the retry loop keeps trying before giving up.
    pub retry_max_wait: Duration,
}

impl TollgateConfig {
    /// Build a configuration with default TTL, token file name and retry timing.
    pub fn new(
        company_name: &'static str,
        product_name: &'static str,
        cache_namespace: &'static str,
    ) -> Self {
        Self {
            company_name,
            product_name,
            cache_namespace,
            token_file_name: DEFAULT_TOKEN_FILE,
            cache_dir: None,
            default_ttl: DEFAULT_TTL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            retry_max_wait: DEFAULT_RETRY_MAX_WAIT,
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::TollgateError> {
        if self.cache_dir.is_none() && self.cache_namespace.is_empty() {
            return Err(crate::TollgateError::ConfigError(
                "cache_namespace cannot be empty".to_string(),
            ));
        }
        if self.token_file_name.is_empty()
            || self.token_file_name.contains(['/', '\\'])
            || self.token_file_name == "."
            || self.token_file_name == ".."
        {
            return Err(crate::TollgateError::ConfigError(format!(
                "token_file_name must be a bare file name, got {:?}",
                self.token_file_name
            )));
        }
        if self.default_ttl.is_zero() {
            return Err(crate::TollgateError::ConfigError(
                "default_ttl must be non-zero".to_string(),
            ));
        }
        if self.retry_interval.is_zero() || self.retry_max_wait.is_zero() {
            return Err(crate::TollgateError::ConfigError(
                "retry timing must be non-zero".to_string(),
            ));
        }
        if self.retry_interval > self.retry_max_wait {
            return Err(crate::TollgateError::ConfigError(format!(
                "retry_interval ({:?}) exceeds retry_max_wait ({:?})",
                self.retry_interval, self.retry_max_wait
            )));
        }
        Ok(())
    }
}
