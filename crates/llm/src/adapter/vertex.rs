mod input;
mod output;

use std::sync::Arc;

use async_trait::async_trait;
use config::VertexConfig;
use gcp_auth::TokenProvider;
use reqwest::{Client, header::AUTHORIZATION};
use serde_json::json;

use self::{
    input::GenerateRequest,
    output::{GenerateResponse, GroundingSignals},
};

use crate::{
    LlmError, RunRequest, RunResult,
    adapter::{ProviderAdapter, VersionProbe},
    parse_json_lenient,
};

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Models known to support the GoogleSearch grounding tool. Grounding
/// requested on anything else is rejected at adapter entry.
const GROUNDING_CAPABLE: &[&str] = &["gemini-2.5-pro", "gemini-2.5-flash", "gemini-2.0-flash"];

const SMOKE_TEST_MODEL: &str = "gemini-2.0-flash";

pub struct VertexAdapter {
    client: Client,
    project: String,
    region: String,
    token_provider: Arc<dyn TokenProvider>,
}

impl VertexAdapter {
    /// Build the adapter with an explicit project and location. Ambient
    /// project discovery is never used; credentials come from Application
    /// Default Credentials resolved once here.
    pub async fn new(config: &VertexConfig) -> crate::Result<Self> {
        let project = config
            .project
            .clone()
            .ok_or_else(|| LlmError::Validation("Vertex project is not configured".to_owned()))?;

        if let Some(account) = &config.impersonate_service_account {
            log::info!("Vertex credentials expected to impersonate {account}");
        }

        let token_provider = gcp_auth::provider().await.map_err(|error| {
            LlmError::AuthenticationFailed(format!("failed to resolve Google credentials: {error}"))
        })?;

        Ok(Self {
            client: super::api_client()?,
            project,
            region: config.region.clone(),
            token_provider,
        })
    }

    fn endpoint(&self, model_id: &str) -> String {
        let host = if self.region == "global" {
            "aiplatform.googleapis.com".to_owned()
        } else {
            format!("{}-aiplatform.googleapis.com", self.region)
        };

        let model_path = self.model_path(model_id);

        format!("https://{host}/v1/{model_path}:generateContent")
    }

    /// Normalize a model id to its full publisher path. Bare ids like
    /// `gemini-2.0-flash` are the common case.
    fn model_path(&self, model_id: &str) -> String {
        if model_id.starts_with("projects/") {
            return model_id.to_owned();
        }

        if model_id.starts_with("publishers/") {
            return format!(
                "projects/{}/locations/{}/{model_id}",
                self.project, self.region
            );
        }

        format!(
            "projects/{}/locations/{}/publishers/google/models/{model_id}",
            self.project, self.region
        )
    }

    async fn call(&self, model_id: &str, wire: &GenerateRequest) -> crate::Result<GenerateResponse> {
        let url = self.endpoint(model_id);

        let token = self
            .token_provider
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|error| LlmError::AuthenticationFailed(format!("failed to fetch access token: {error}")))?;

        let body = sonic_rs::to_vec(wire)
            .map_err(|error| LlmError::Validation(format!("failed to serialize request: {error}")))?;

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token.as_str()))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|error| LlmError::ProviderTransport {
                status: None,
                message: format!("failed to send request to Vertex: {error}"),
            })?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = super::retry_after(response.headers());
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_owned());
            log::error!("Vertex API error ({status}): {}", crate::sanitize_for_log(&error_text));

            return Err(LlmError::from_status(status.as_u16(), error_text, retry_after));
        }

        let response_text = response.text().await.map_err(|error| {
            log::error!("Failed to read Vertex response body: {error}");
            LlmError::Internal(None)
        })?;

        sonic_rs::from_str(&response_text).map_err(|error| {
            log::error!("Failed to parse Vertex response: {error}");
            log::debug!("Response parsing failed, length: {} bytes", response_text.len());

            LlmError::Internal(None)
        })
    }

    /// Grounded one-token request verifying the model can ground in this
    /// region. Part of the operational preflight.
    pub async fn grounding_preflight(&self, model_id: &str) -> crate::Result<()> {
        let bare = bare_model(model_id);

        if !GROUNDING_CAPABLE.contains(&bare) {
            return Err(LlmError::UnsupportedGrounding {
                model_id: model_id.to_owned(),
            });
        }

        let mut wire = GenerateRequest::probe();
        wire.tools = vec![json!({"googleSearch": {}})];

        self.call(model_id, &wire).await.map(|_| ())
    }
}

#[async_trait]
impl ProviderAdapter for VertexAdapter {
    fn name(&self) -> &'static str {
        "vertex_genai"
    }

    async fn run(&self, request: &RunRequest) -> crate::Result<RunResult> {
        let bare = bare_model(&request.model_id);
        let wants_grounding = request.grounding_mode.wants_tools();

        if wants_grounding && !GROUNDING_CAPABLE.contains(&bare) {
            return Err(LlmError::UnsupportedGrounding {
                model_id: request.model_id.clone(),
            });
        }

        if wants_grounding {
            self.run_grounded(request, bare).await
        } else {
            self.run_ungrounded(request, bare).await
        }
    }

    async fn version_probe(&self, model_id: &str) -> crate::Result<VersionProbe> {
        let reply = self.call(model_id, &GenerateRequest::probe()).await?;

        Ok(VersionProbe {
            provider_version_key: reply.model_version.clone(),
            model_version: reply.model_version,
        })
    }

    async fn smoke_test(&self) -> crate::Result<()> {
        self.version_probe(SMOKE_TEST_MODEL).await.map(|_| ())
    }
}

impl VertexAdapter {
    /// Grounded execution. When a response schema is also requested the
    /// call splits in two, because Vertex forbids combining the search
    /// tool with schema enforcement: pass 1 grounds free-form text, pass 2
    /// reformats it into the schema with no tools. Grounding metadata
    /// comes from pass 1, `json_obj` from pass 2.
    async fn run_grounded(&self, request: &RunRequest, bare: &str) -> crate::Result<RunResult> {
        let pass1 = self.call(&request.model_id, &GenerateRequest::grounded(request)).await?;
        let signals = pass1.grounding_signals();

        super::enforce_required_grounding(request, signals.grounded())?;

        let text = pass1.text();
        let two_pass = request.response_schema.is_some();

        let mut result = base_result(&pass1, bare);
        result.text = text.clone();
        result.grounded_effective = signals.grounded();
        result.tool_call_count = u32::from(signals.grounded());
        result.metadata = metadata(request, &signals, two_pass);
        result.citations = signals.citations;

        if two_pass {
            let pass2 = self
                .call(&request.model_id, &GenerateRequest::reformat(request, &text))
                .await?;
            let pass2_text = pass2.text();

            result.json_obj = parse_json_lenient(&pass2_text);
            result.json_valid = result.json_obj.is_some();
        }

        Ok(result)
    }

    async fn run_ungrounded(&self, request: &RunRequest, bare: &str) -> crate::Result<RunResult> {
        let reply = self.call(&request.model_id, &GenerateRequest::ungrounded(request)).await?;

        let mut result = base_result(&reply, bare);
        result.text = reply.text();
        result.metadata = metadata(request, &GroundingSignals::default(), false);

        if request.response_schema.is_some() {
            result.json_obj = parse_json_lenient(&result.text);
            result.json_valid = result.json_obj.is_some();
        }

        Ok(result)
    }
}

fn base_result(reply: &GenerateResponse, bare: &str) -> RunResult {
    let mut result = RunResult::empty(
        reply
            .model_version
            .clone()
            .unwrap_or_else(|| bare.to_owned()),
    );
    result.response_id = reply.response_id.clone();
    result.usage = reply.usage();

    result
}

fn metadata(request: &RunRequest, signals: &GroundingSignals, two_pass: bool) -> serde_json::Value {
    json!({
        "seed": request.seed,
        "grounding_mode": request.grounding_mode,
        "web_search_query_count": signals.query_count,
        "grounding_chunk_count": signals.chunk_count,
        "two_pass": two_pass,
    })
}

fn bare_model(model_id: &str) -> &str {
    model_id.rsplit('/').next().unwrap_or(model_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_model_strips_publisher_paths() {
        assert_eq!(bare_model("gemini-2.0-flash"), "gemini-2.0-flash");
        assert_eq!(
            bare_model("projects/p/locations/europe-west4/publishers/google/models/gemini-2.5-pro"),
            "gemini-2.5-pro"
        );
    }

    #[test]
    fn grounding_allow_list_contains_the_validated_models() {
        for model in ["gemini-2.5-pro", "gemini-2.5-flash", "gemini-2.0-flash"] {
            assert!(GROUNDING_CAPABLE.contains(&model));
        }
        assert!(!GROUNDING_CAPABLE.contains(&"gemini-1.5-pro"));
    }
}
