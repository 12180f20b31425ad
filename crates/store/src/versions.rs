use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{StoreClient, StoreError, is_unique_violation};

/// A provider-reported model identity observed for a template.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VersionRow {
    pub id: Uuid,
    pub template_id: Uuid,
    pub org_id: String,
    pub workspace_id: String,
    pub provider: String,
    pub provider_version_key: String,
    pub model_id: String,
    pub fingerprint_captured_at: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// One observation of a provider version key.
#[derive(Debug, Clone)]
pub struct VersionUpsert {
    pub template_id: Uuid,
    pub org_id: String,
    pub workspace_id: String,
    pub provider: String,
    pub provider_version_key: String,
    pub model_id: String,
    pub captured_at: DateTime<Utc>,
}

impl StoreClient {
    /// Record an observation of a provider version key.
    ///
    /// Insert-then-fetch: try the insert first; on a unique violation the
    /// existing row wins and is refreshed with `last_seen_at = max(existing,
    /// captured_at)` plus a backfill of `fingerprint_captured_at` when it
    /// was never set. Two concurrent observers of the same key therefore
    /// converge on one row.
    pub async fn upsert_version(&self, upsert: &VersionUpsert) -> Result<VersionRow, StoreError> {
        let inserted = sqlx::query_as::<_, VersionRow>(
            r#"
            INSERT INTO prompt_versions
                (id, template_id, org_id, workspace_id, provider, provider_version_key,
                 model_id, fingerprint_captured_at, first_seen_at, last_seen_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $8)
            RETURNING id, template_id, org_id, workspace_id, provider, provider_version_key,
                      model_id, fingerprint_captured_at, first_seen_at, last_seen_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(upsert.template_id)
        .bind(&upsert.org_id)
        .bind(&upsert.workspace_id)
        .bind(&upsert.provider)
        .bind(&upsert.provider_version_key)
        .bind(&upsert.model_id)
        .bind(upsert.captured_at)
        .fetch_one(self.pool())
        .await;

        match inserted {
            Ok(row) => Ok(row),
            Err(error) if is_unique_violation(&error) => self.refresh_version(upsert).await,
            Err(error) => Err(StoreError::Query(error.to_string())),
        }
    }

    async fn refresh_version(&self, upsert: &VersionUpsert) -> Result<VersionRow, StoreError> {
        sqlx::query_as::<_, VersionRow>(
            r#"
            UPDATE prompt_versions
            SET last_seen_at = GREATEST(last_seen_at, $5),
                fingerprint_captured_at = COALESCE(fingerprint_captured_at, $5)
            WHERE org_id = $1 AND workspace_id = $2 AND template_id = $3 AND provider_version_key = $4
            RETURNING id, template_id, org_id, workspace_id, provider, provider_version_key,
                      model_id, fingerprint_captured_at, first_seen_at, last_seen_at
            "#,
        )
        .bind(&upsert.org_id)
        .bind(&upsert.workspace_id)
        .bind(upsert.template_id)
        .bind(&upsert.provider_version_key)
        .bind(upsert.captured_at)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?
        .ok_or_else(|| {
            StoreError::NotFound(format!(
                "version row for template {} key {}",
                upsert.template_id, upsert.provider_version_key
            ))
        })
    }

    /// Most recently seen version row for a template and provider, if any.
    pub async fn latest_version(
        &self,
        template_id: Uuid,
        provider: &str,
    ) -> Result<Option<VersionRow>, StoreError> {
        sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT id, template_id, org_id, workspace_id, provider, provider_version_key,
                   model_id, fingerprint_captured_at, first_seen_at, last_seen_at
            FROM prompt_versions
            WHERE template_id = $1 AND provider = $2
            ORDER BY last_seen_at DESC
            LIMIT 1
            "#,
        )
        .bind(template_id)
        .bind(provider)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::Query(e.to_string()))
    }
}
