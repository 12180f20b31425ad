use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{StoreClient, StoreError};

/// Audit row for one provider call, successful or failed. Failure rows
/// carry `error_kind` and no response payload.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResultRow {
    pub id: Uuid,
    pub template_id: Uuid,
    pub version_id: Option<Uuid>,
    pub run_id: Option<Uuid>,
    pub country: Option<String>,
    pub grounding_mode: Option<String>,
    pub provider_version_key: Option<String>,
    pub system_fingerprint: Option<String>,
    /// Full JSON payload sent to the provider.
    pub request: Value,
    /// Full JSON payload returned, absent for failure rows.
    pub response: Option<Value>,
    pub analysis_config: Option<Value>,
    pub grounded_effective: bool,
    pub tool_call_count: i32,
    pub citations: Value,
    pub json_valid: bool,
    pub latency_ms: i64,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub probe_evaluation: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResult {
    pub template_id: Uuid,
    pub version_id: Option<Uuid>,
    pub run_id: Option<Uuid>,
    pub country: Option<String>,
    pub grounding_mode: Option<String>,
    pub provider_version_key: Option<String>,
    pub system_fingerprint: Option<String>,
    pub request: Value,
    pub response: Option<Value>,
    pub analysis_config: Option<Value>,
    pub grounded_effective: bool,
    pub tool_call_count: i32,
    pub citations: Value,
    pub json_valid: bool,
    pub latency_ms: i64,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub probe_evaluation: Option<Value>,
}

impl NewResult {
    /// Skeleton failure row: no response payload, zeroed derived fields.
    pub fn failure(
        template_id: Uuid,
        run_id: Uuid,
        request: Value,
        error_kind: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            template_id,
            version_id: None,
            run_id: Some(run_id),
            country: None,
            grounding_mode: None,
            provider_version_key: None,
            system_fingerprint: None,
            request,
            response: None,
            analysis_config: None,
            grounded_effective: false,
            tool_call_count: 0,
            citations: Value::Array(Vec::new()),
            json_valid: false,
            latency_ms: 0,
            error_kind: Some(error_kind.into()),
            error_message: Some(error_message.into()),
            probe_evaluation: None,
        }
    }
}

impl StoreClient {
    /// Persist one result or failure row.
    pub async fn insert_result(&self, new: &NewResult) -> Result<ResultRow, StoreError> {
        sqlx::query_as::<_, ResultRow>(
            r#"
            INSERT INTO prompt_results
                (id, template_id, version_id, run_id, country, grounding_mode,
                 provider_version_key, system_fingerprint, request, response, analysis_config,
                 grounded_effective, tool_call_count, citations, json_valid, latency_ms,
                 error_kind, error_message, probe_evaluation, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING id, template_id, version_id, run_id, country, grounding_mode,
                      provider_version_key, system_fingerprint, request, response, analysis_config,
                      grounded_effective, tool_call_count, citations, json_valid, latency_ms,
                      error_kind, error_message, probe_evaluation, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.template_id)
        .bind(new.version_id)
        .bind(new.run_id)
        .bind(&new.country)
        .bind(&new.grounding_mode)
        .bind(&new.provider_version_key)
        .bind(&new.system_fingerprint)
        .bind(&new.request)
        .bind(&new.response)
        .bind(&new.analysis_config)
        .bind(new.grounded_effective)
        .bind(new.tool_call_count)
        .bind(&new.citations)
        .bind(new.json_valid)
        .bind(new.latency_ms)
        .bind(&new.error_kind)
        .bind(&new.error_message)
        .bind(&new.probe_evaluation)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await
        .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Retrieve a result by id.
    pub async fn get_result(&self, id: Uuid) -> Result<ResultRow, StoreError> {
        sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT id, template_id, version_id, run_id, country, grounding_mode,
                   provider_version_key, system_fingerprint, request, response, analysis_config,
                   grounded_effective, tool_call_count, citations, json_valid, latency_ms,
                   error_kind, error_message, probe_evaluation, created_at
            FROM prompt_results
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?
        .ok_or_else(|| StoreError::NotFound(format!("result {id}")))
    }
}
