//! Operational preflight.
//!
//! On startup every enabled adapter answers a one-token ungrounded probe,
//! and Vertex additionally answers a grounded one-token request so a
//! misconfigured region or model surfaces before any experiment runs.

use llm::{AdapterHealth, Orchestrator};
use serde::Serialize;

/// Default model exercised by the Vertex grounding preflight.
const GROUNDING_PREFLIGHT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
pub struct PreflightReport {
    pub adapters: Vec<AdapterHealth>,
    /// Outcome of the grounded Vertex probe, absent when Vertex is not
    /// enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex_grounding: Option<AdapterHealth>,
}

impl PreflightReport {
    pub fn all_healthy(&self) -> bool {
        self.adapters.iter().all(|adapter| adapter.healthy)
            && self
                .vertex_grounding
                .as_ref()
                .is_none_or(|grounding| grounding.healthy)
    }
}

/// Probe every enabled provider once and log the outcome.
pub async fn startup_preflight(orchestrator: &Orchestrator) -> PreflightReport {
    let adapters = orchestrator.health().await;

    for report in &adapters {
        if report.healthy {
            log::info!("preflight: {} answered the one-token probe", report.adapter);
        } else {
            log::error!(
                "preflight: {} failed its one-token probe: {}",
                report.adapter,
                report.detail.as_deref().unwrap_or("unknown")
            );
        }
    }

    let vertex_grounding = match orchestrator.vertex() {
        Some(vertex) => Some(match vertex.grounding_preflight(GROUNDING_PREFLIGHT_MODEL).await {
            Ok(()) => {
                log::info!("preflight: vertex grounding verified with {GROUNDING_PREFLIGHT_MODEL}");
                AdapterHealth {
                    adapter: "vertex_grounding",
                    healthy: true,
                    detail: None,
                }
            }
            Err(error) => {
                log::error!("preflight: vertex grounding probe failed: {error}");
                AdapterHealth {
                    adapter: "vertex_grounding",
                    healthy: false,
                    detail: Some(error.client_message()),
                }
            }
        }),
        None => None,
    };

    PreflightReport {
        adapters,
        vertex_grounding,
    }
}
