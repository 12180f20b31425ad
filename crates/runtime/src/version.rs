//! Provider version tracking.
//!
//! A version row records what the provider said it was running at a point
//! in time: `system_fingerprint` for OpenAI, `modelVersion` for Google,
//! the model id for Anthropic. Rows are created lazily on first
//! observation and refreshed on every subsequent one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use llm::{Orchestrator, ProviderKind};
use serde::Serialize;
use store::{StoreClient, TemplateRow, VersionUpsert};
use uuid::Uuid;

use crate::{ProbeGuard, RuntimeError};

/// The winning version row after an observation.
#[derive(Debug, Clone, Serialize)]
pub struct EnsuredVersion {
    pub version_id: Uuid,
    pub provider_version_key: String,
    pub captured_at: DateTime<Utc>,
}

pub struct VersionService {
    store: Arc<StoreClient>,
    orchestrator: Arc<Orchestrator>,
    guard: Option<ProbeGuard>,
}

impl VersionService {
    pub fn new(store: Arc<StoreClient>, orchestrator: Arc<Orchestrator>, guard: Option<ProbeGuard>) -> Self {
        Self {
            store,
            orchestrator,
            guard,
        }
    }

    /// Ensure a version row exists for the observed (or probed) provider
    /// version key and refresh its `last_seen_at`.
    ///
    /// `observed_key` short-circuits the probe when a recent result
    /// already carried the key. On provider transport errors no row is
    /// created; the error propagates.
    pub async fn ensure_version(
        &self,
        template: &TemplateRow,
        provider: ProviderKind,
        model_id: &str,
        observed_key: Option<&str>,
    ) -> Result<EnsuredVersion, RuntimeError> {
        let captured_at = Utc::now();

        let provider_version_key = match observed_key {
            Some(key) if !key.is_empty() => key.to_owned(),
            _ => self.resolve_key(template, provider, model_id, captured_at).await?,
        };

        let upsert = VersionUpsert {
            template_id: template.id,
            org_id: template.org_id.clone(),
            workspace_id: template.workspace_id.clone(),
            provider: provider.as_str().to_owned(),
            provider_version_key,
            model_id: model_id.to_owned(),
            captured_at,
        };

        let row = self.store.upsert_version(&upsert).await?;

        Ok(EnsuredVersion {
            version_id: row.id,
            provider_version_key: row.provider_version_key,
            captured_at: row.fingerprint_captured_at.unwrap_or(row.last_seen_at),
        })
    }

    /// Resolve the version key without an observation: canonical value for
    /// providers that have one, otherwise a one-token probe behind the
    /// hourly guard.
    async fn resolve_key(
        &self,
        template: &TemplateRow,
        provider: ProviderKind,
        model_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, RuntimeError> {
        match provider {
            // Anthropic reports no fingerprint; the model id is the
            // canonical version key. Same for providers we cannot call.
            ProviderKind::Anthropic | ProviderKind::AzureOpenai | ProviderKind::Unknown => {
                Ok(model_id.to_owned())
            }
            ProviderKind::Openai | ProviderKind::Google => {
                if let Some(guard) = &self.guard {
                    let bucket = ProbeGuard::bucket_key(
                        &template.org_id,
                        &template.workspace_id,
                        template.id,
                        provider.as_str(),
                        model_id,
                        now,
                    );

                    if !guard.try_acquire(&bucket).await? {
                        // Another worker probed this hour; reuse its row.
                        if let Some(existing) =
                            self.store.latest_version(template.id, provider.as_str()).await?
                        {
                            log::debug!(
                                "probe guard hit for template {}, reusing key {}",
                                template.id,
                                existing.provider_version_key
                            );
                            return Ok(existing.provider_version_key);
                        }
                    }
                }

                let probe = self.orchestrator.version_probe(provider, model_id).await?;

                Ok(probe
                    .provider_version_key
                    .or(probe.model_version)
                    .unwrap_or_else(|| model_id.to_owned()))
            }
        }
    }
}
