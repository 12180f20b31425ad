//! Redis configuration.

use serde::Deserialize;

/// Settings for the distributed version-probe guard. Optional: without a
/// URL the guard is disabled and probes rely on the database UPSERT alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedisConfig {
    /// Redis connection URL, e.g. `redis://127.0.0.1:6379`.
    pub url: Option<String>,
    /// TTL for the set-if-absent probe guard. Must cover the hourly
    /// probe bucket.
    pub probe_guard_ttl_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            probe_guard_ttl_secs: 3600,
        }
    }
}
