//! Provider adapters.
//!
//! One adapter per provider, each exposing the same synchronous contract:
//! `run(RunRequest) -> RunResult`. Adapters own wire-format conversion,
//! grounding-signal extraction and the fail-closed REQUIRED check; they
//! never persist anything.

pub mod openai;
pub mod vertex;

use std::time::Duration;

use async_trait::async_trait;

use crate::{RunRequest, RunResult};

/// HTTP client for provider calls. Deliberately carries no overall
/// request timeout: the orchestrator enforces the run deadline and
/// cancels in-flight calls, so the client only needs to fail fast on
/// unreachable endpoints.
pub(crate) fn api_client() -> crate::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .build()
        .map_err(|error| {
            log::error!("Failed to build provider HTTP client: {error}");
            crate::LlmError::Internal(None)
        })
}

/// Retry advisory from a provider's `Retry-After` header, seconds form
/// only. Surfaced to the caller; the core never retries on its own.
pub(crate) fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// The fail-closed invariant: a REQUIRED run without grounding evidence
/// is an error, never a silently ungrounded result.
pub(crate) fn enforce_required_grounding(
    request: &RunRequest,
    grounded_effective: bool,
) -> crate::Result<()> {
    if request.grounding_mode == crate::GroundingMode::Required && !grounded_effective {
        return Err(crate::LlmError::GroundingRequired {
            model_id: request.model_id.clone(),
        });
    }

    Ok(())
}

/// Outcome of a one-token version probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProbe {
    /// Provider-reported identity of the running model, when the provider
    /// exposes one (`system_fingerprint`, `modelVersion`).
    pub provider_version_key: Option<String>,
    /// Model version string, when distinct from the key.
    pub model_version: Option<String>,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable adapter name used in logs and health reports.
    fn name(&self) -> &'static str;

    /// Execute one run. Must uphold the adapter invariants: fail-closed
    /// grounding, citations as mappings, schema/grounding separation
    /// where the provider demands it.
    async fn run(&self, request: &RunRequest) -> crate::Result<RunResult>;

    /// One-token call made solely to read back the provider version key.
    async fn version_probe(&self, model_id: &str) -> crate::Result<VersionProbe>;

    /// One-token ungrounded probe against the adapter's default model,
    /// used by startup preflight and the health endpoint.
    async fn smoke_test(&self) -> crate::Result<()>;
}
