//! # Resolver Configuration
//!
//! Configuration for the transaction resolver and its adapters.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::domain::{ConfigError, CONFIRMED_THRESHOLD};

/// Default indexer REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.kaspa.org";

/// Resolver configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the indexer REST API.
    pub api_base_url: String,

    /// Delay between not-found retries, in milliseconds. Fixed, no backoff.
    pub retry_delay_ms: u64,

    /// Fetches per identifier before giving up on a not-found id.
    pub max_not_found_attempts: u32,

    /// Depth at which the confirmation count collapses into "confirmed".
    pub confirmed_threshold: u64,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Chain-tip polling interval in milliseconds.
    pub chain_tip_poll_ms: u64,

    /// Request the outputs-only projection for source transactions.
    pub outputs_only_batch: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            retry_delay_ms: 1000,
            max_not_found_attempts: 10,
            confirmed_threshold: CONFIRMED_THRESHOLD,
            request_timeout_secs: 10,
            chain_tip_poll_ms: 1000,
            outputs_only_batch: true,
        }
    }
}

impl ResolverConfig {
    /// Create a config for testing (local endpoint, short timeouts).
    pub fn for_testing() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 2,
            chain_tip_poll_ms: 50,
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TXR_API_URL`: Indexer base URL (default: https://api.kaspa.org)
    /// - `TXR_RETRY_DELAY_MS`: Not-found retry delay (default: 1000)
    /// - `TXR_MAX_ATTEMPTS`: Not-found attempts per id (default: 10)
    /// - `TXR_CONFIRMED_THRESHOLD`: Confirmed depth (default: 86400)
    /// - `TXR_REQUEST_TIMEOUT_SECS`: HTTP timeout (default: 10)
    /// - `TXR_CHAIN_TIP_POLL_MS`: Chain-tip poll interval (default: 1000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("TXR_API_URL").unwrap_or(defaults.api_base_url),
            retry_delay_ms: env_or("TXR_RETRY_DELAY_MS", defaults.retry_delay_ms),
            max_not_found_attempts: env_or("TXR_MAX_ATTEMPTS", defaults.max_not_found_attempts),
            confirmed_threshold: env_or("TXR_CONFIRMED_THRESHOLD", defaults.confirmed_threshold),
            request_timeout_secs: env_or("TXR_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            chain_tip_poll_ms: env_or("TXR_CHAIN_TIP_POLL_MS", defaults.chain_tip_poll_ms),
            outputs_only_batch: defaults.outputs_only_batch,
        }
    }

    /// Reject values the resolver cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("api_base_url", "must not be empty"));
        }
        if self.max_not_found_attempts == 0 {
            return Err(invalid("max_not_found_attempts", "must be at least 1"));
        }
        if self.confirmed_threshold == 0 {
            return Err(invalid("confirmed_threshold", "must be at least 1"));
        }
        if self.chain_tip_poll_ms == 0 {
            return Err(invalid("chain_tip_poll_ms", "must be at least 1"));
        }
        Ok(())
    }

    /// Retry delay as a `Duration`.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Chain-tip poll interval as a `Duration`.
    pub fn chain_tip_poll_interval(&self) -> Duration {
        Duration::from_millis(self.chain_tip_poll_ms)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}
