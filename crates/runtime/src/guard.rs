//! Distributed set-if-absent guard for version probes.
//!
//! A burst of concurrent runs against the same template would otherwise
//! issue one version probe each. The guard claims an hourly bucket per
//! (org, workspace, template, provider, model) with `SET NX EX`; only the
//! winner probes, everyone else reuses the stored version row.

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::RuntimeError;

pub struct ProbeGuard {
    manager: ConnectionManager,
    ttl_secs: u64,
}

impl ProbeGuard {
    /// Connect to Redis. The TTL should be at least the bucket width of
    /// one hour.
    pub async fn connect(url: &str, ttl_secs: u64) -> Result<Self, RuntimeError> {
        let client = redis::Client::open(url).map_err(|e| RuntimeError::Guard(e.to_string()))?;

        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| RuntimeError::Guard(e.to_string()))?;

        Ok(Self {
            manager,
            ttl_secs: ttl_secs.max(3600),
        })
    }

    /// Claim a bucket. Returns true when this caller won and should probe.
    pub async fn try_acquire(&self, key: &str) -> Result<bool, RuntimeError> {
        let mut connection = self.manager.clone();

        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut connection)
            .await
            .map_err(|e| RuntimeError::Guard(e.to_string()))?;

        Ok(reply.is_some())
    }

    /// Bucket key for one probe hour.
    pub fn bucket_key(
        org_id: &str,
        workspace_id: &str,
        template_id: Uuid,
        provider: &str,
        model_id: &str,
        now: DateTime<Utc>,
    ) -> String {
        format!(
            "brandlens:probe:{org_id}:{workspace_id}:{template_id}:{provider}:{model_id}:{}",
            now.format("%Y%m%d%H")
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn bucket_key_rolls_hourly() {
        let template_id = Uuid::nil();
        let in_hour = Utc.with_ymd_and_hms(2025, 6, 2, 14, 5, 0).single().unwrap();
        let same_hour = Utc.with_ymd_and_hms(2025, 6, 2, 14, 55, 0).single().unwrap();
        let next_hour = Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).single().unwrap();

        let key = |at| ProbeGuard::bucket_key("org", "ws", template_id, "openai", "gpt-5", at);

        assert_eq!(key(in_hour), key(same_hour));
        assert_ne!(key(in_hour), key(next_hour));
    }
}
