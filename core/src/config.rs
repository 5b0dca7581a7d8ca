//! Client configuration loaded from external sources.
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `config/client.yaml`, then `LINGUATECH__*` environment variables (after
//! `.env` is loaded), e.g. `LINGUATECH__BASE_URL` or
//! `LINGUATECH__RETRY__READS`.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin plus API prefix every relative path is resolved against.
    pub base_url: String,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// How many times a failed operation is re-attempted. Only transport
/// failures are retried; HTTP error responses never are.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    pub reads: u32,
    pub mutations: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            reads: 2,
            mutations: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Milliseconds a cached read is served without refetching.
    pub stale_time_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_time_ms: 60_000 }
    }
}

impl CacheConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            retry: RetryPolicy::default(),
            cache: CacheConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.cache.stale_time_ms = u64::try_from(stale_time.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Load from `.env`, `config/client.yaml` and the environment.
    pub fn load() -> Result<Self, ApiError> {
        dotenvy::dotenv().ok();
        Self::load_from("config/client")
    }

    /// Load with an explicit settings file stem (the file itself is optional).
    pub fn load_from(file: &str) -> Result<Self, ApiError> {
        let defaults = RetryPolicy::default();
        let settings = config::Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)
            .and_then(|b| b.set_default("retry.reads", i64::from(defaults.reads)))
            .and_then(|b| b.set_default("retry.mutations", i64::from(defaults.mutations)))
            .and_then(|b| {
                b.set_default(
                    "cache.stale_time_ms",
                    i64::try_from(CacheConfig::default().stale_time_ms).unwrap_or(i64::MAX),
                )
            })
            .map_err(|e| ApiError::Config(e.to_string()))?
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("LINGUATECH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let loaded: ClientConfig = settings
            .try_deserialize()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        if loaded.base_url.trim().is_empty() {
            return Err(ApiError::Config("base_url must not be empty".to_string()));
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_explicit() {
        let config = ClientConfig::new("http://example.test/api");
        assert_eq!(config.retry, RetryPolicy { reads: 2, mutations: 0 });
        assert_eq!(config.cache.stale_time(), Duration::from_secs(60));
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = ClientConfig::load_from("config/does-not-exist").unwrap();
        assert!(!config.base_url.is_empty());
        assert_eq!(config.retry.mutations, 0);
    }

    #[test]
    fn builders_override_fields() {
        let config = ClientConfig::new("http://x")
            .with_retry(RetryPolicy { reads: 0, mutations: 0 })
            .with_stale_time(Duration::from_secs(5));
        assert_eq!(config.retry.reads, 0);
        assert_eq!(config.cache.stale_time_ms, 5_000);
    }

    #[test]
    fn sub_second_stale_time_is_kept() {
        let config = ClientConfig::new("http://x").with_stale_time(Duration::from_millis(500));
        assert_eq!(config.cache.stale_time(), Duration::from_millis(500));
    }
}
