//! Request validation, provider routing and deadline enforcement.

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::{
    LlmError, ProviderKind, RunRequest, RunResult,
    adapter::{ProviderAdapter, VersionProbe, openai::OpenAiAdapter, vertex::VertexAdapter},
};

/// Routes a [`RunRequest`] to the adapter owning its provider. The
/// provider set is closed; version tracking knows about more providers
/// than can be executed here.
pub struct Orchestrator {
    openai: Option<OpenAiAdapter>,
    vertex: Option<VertexAdapter>,
}

/// Health snapshot for one adapter, fed by its one-token smoke test.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterHealth {
    pub adapter: &'static str,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Orchestrator {
    /// Build adapters for every enabled provider.
    pub async fn from_config(config: &config::LlmConfig) -> crate::Result<Self> {
        let openai = if config.openai.enabled() {
            Some(OpenAiAdapter::new(&config.openai)?)
        } else {
            None
        };

        let vertex = if config.vertex.enabled() {
            Some(VertexAdapter::new(&config.vertex).await?)
        } else {
            None
        };

        Ok(Self { openai, vertex })
    }

    #[cfg(test)]
    pub(crate) fn disabled() -> Self {
        Self {
            openai: None,
            vertex: None,
        }
    }

    /// Execute one run end to end: validate, route, measure, enforce the
    /// hard deadline. Adapter errors surface untranslated.
    pub async fn execute(&self, request: RunRequest) -> crate::Result<RunResult> {
        validate(&request)?;

        let adapter = self.adapter_for(request.provider())?;
        let started = Instant::now();

        let outcome = tokio::time::timeout(request.hard_deadline, adapter.run(&request)).await;
        let elapsed = started.elapsed();

        match outcome {
            Err(_) => {
                log::warn!(
                    "run {} cancelled after {} ms at the hard deadline",
                    request.run_id,
                    elapsed.as_millis()
                );

                Err(LlmError::DeadlineExceeded {
                    elapsed_ms: elapsed.as_millis() as u64,
                })
            }
            Ok(Err(error)) => Err(error),
            Ok(Ok(mut result)) => {
                if request.grounding_mode.wants_tools() && elapsed > request.grounded_soft_deadline {
                    log::warn!(
                        "grounded run {} took {} ms, past the {} s soft deadline",
                        request.run_id,
                        elapsed.as_millis(),
                        request.grounded_soft_deadline.as_secs()
                    );
                }

                result.latency_ms = elapsed.as_millis() as u64;
                Ok(result)
            }
        }
    }

    /// One-token version probe against the provider owning the model.
    pub async fn version_probe(&self, provider: ProviderKind, model_id: &str) -> crate::Result<VersionProbe> {
        self.adapter_for(provider)?.version_probe(model_id).await
    }

    /// Smoke-test every enabled adapter.
    pub async fn health(&self) -> Vec<AdapterHealth> {
        let mut reports = Vec::new();

        for adapter in self.enabled_adapters() {
            let report = match adapter.smoke_test().await {
                Ok(()) => AdapterHealth {
                    adapter: adapter.name(),
                    healthy: true,
                    detail: None,
                },
                Err(error) => AdapterHealth {
                    adapter: adapter.name(),
                    healthy: false,
                    detail: Some(error.client_message()),
                },
            };
            reports.push(report);
        }

        reports
    }

    /// Direct access to the Vertex adapter for the grounding preflight.
    pub fn vertex(&self) -> Option<&VertexAdapter> {
        self.vertex.as_ref()
    }

    fn enabled_adapters(&self) -> impl Iterator<Item = &dyn ProviderAdapter> {
        let openai = self.openai.as_ref().map(|adapter| adapter as &dyn ProviderAdapter);
        let vertex = self.vertex.as_ref().map(|adapter| adapter as &dyn ProviderAdapter);

        openai.into_iter().chain(vertex)
    }

    fn adapter_for(&self, provider: ProviderKind) -> crate::Result<&dyn ProviderAdapter> {
        match provider {
            ProviderKind::Openai => self
                .openai
                .as_ref()
                .map(|adapter| adapter as &dyn ProviderAdapter)
                .ok_or_else(|| LlmError::Validation("openai adapter is not configured".to_owned())),
            ProviderKind::Google => self
                .vertex
                .as_ref()
                .map(|adapter| adapter as &dyn ProviderAdapter)
                .ok_or_else(|| LlmError::Validation("vertex adapter is not configured".to_owned())),
            other => Err(LlmError::Validation(format!(
                "no adapter available for provider '{other}'"
            ))),
        }
    }
}

fn validate(request: &RunRequest) -> crate::Result<()> {
    if request.model_id.trim().is_empty() {
        return Err(LlmError::Validation("model_id must not be empty".to_owned()));
    }

    if let Some(block) = &request.als_block {
        let chars = block.chars();
        if chars > als::MAX_BLOCK_CHARS {
            return Err(LlmError::Validation(format!(
                "ALS block is {chars} chars, limit is {}",
                als::MAX_BLOCK_CHARS
            )));
        }
    }

    if let Some(schema) = &request.response_schema
        && !matches!(schema, Value::Object(_))
    {
        return Err(LlmError::Validation(
            "response_schema must be a JSON schema object".to_owned(),
        ));
    }

    if let Some(temperature) = request.temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return Err(LlmError::Validation(format!(
            "temperature {temperature} is outside 0.0..=2.0"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use als::{AlsBlock, Locale};
    use serde_json::json;

    use super::*;
    use crate::GroundingMode;

    fn valid_request() -> RunRequest {
        let mut request = RunRequest::new("gpt-5", "What about {{brand}}?");
        request.grounding_mode = GroundingMode::Off;
        request
    }

    #[test]
    fn oversized_als_block_is_rejected() {
        let mut request = valid_request();
        request.als_block = Some(AlsBlock {
            locale: Locale::De,
            text: "x".repeat(351),
        });

        assert!(matches!(validate(&request), Err(LlmError::Validation(_))));
    }

    #[test]
    fn non_object_schema_is_rejected() {
        let mut request = valid_request();
        request.response_schema = Some(json!(["not", "a", "schema"]));

        assert!(matches!(validate(&request), Err(LlmError::Validation(_))));
    }

    #[test]
    fn valid_request_passes_validation() {
        let mut request = valid_request();
        request.response_schema = Some(json!({"type": "object"}));
        request.temperature = Some(1.0);

        assert!(validate(&request).is_ok());
    }

    #[tokio::test]
    async fn unroutable_providers_error_before_any_network_call() {
        let orchestrator = Orchestrator::disabled();

        let request = {
            let mut request = valid_request();
            request.model_id = "claude-sonnet-4-5".to_owned();
            request
        };

        let error = orchestrator.execute(request).await.unwrap_err();
        assert!(matches!(error, LlmError::Validation(_)));
    }

    #[tokio::test]
    async fn unconfigured_adapter_is_a_validation_error() {
        let orchestrator = Orchestrator::disabled();

        let error = orchestrator.execute(valid_request()).await.unwrap_err();
        assert!(matches!(error, LlmError::Validation(_)));
    }
}
