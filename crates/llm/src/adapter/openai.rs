mod input;
mod output;

use async_trait::async_trait;
use config::OpenAiConfig;
use reqwest::{Client, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use self::{input::ResponsesRequest, output::ResponsesReply};

use crate::{
    LlmError, RunRequest, RunResult,
    adapter::{ProviderAdapter, VersionProbe},
};

const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Model used for smoke tests when nothing better is known.
const SMOKE_TEST_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiAdapter {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiAdapter {
    pub fn new(config: &OpenAiConfig) -> crate::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::AuthenticationFailed("OpenAI API key is not configured".to_owned()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_owned());

        Ok(Self {
            client: super::api_client()?,
            base_url,
            api_key,
        })
    }

    async fn send(&self, wire: &ResponsesRequest) -> crate::Result<ResponsesReply> {
        let url = format!("{}/responses", self.base_url);

        let body = sonic_rs::to_vec(wire)
            .map_err(|error| LlmError::Validation(format!("failed to serialize request: {error}")))?;

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|error| LlmError::ProviderTransport {
                status: None,
                message: format!("failed to send request to OpenAI: {error}"),
            })?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = super::retry_after(response.headers());
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_owned());
            log::error!("OpenAI API error ({status}): {}", crate::sanitize_for_log(&error_text));

            return Err(LlmError::from_status(status.as_u16(), error_text, retry_after));
        }

        let response_text = response.text().await.map_err(|error| {
            log::error!("Failed to read OpenAI response body: {error}");
            LlmError::Internal(None)
        })?;

        sonic_rs::from_str(&response_text).map_err(|error| {
            log::error!("Failed to parse OpenAI response: {error}");
            log::debug!("Response parsing failed, length: {} bytes", response_text.len());

            LlmError::Internal(None)
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn name(&self) -> &'static str {
        "openai_responses"
    }

    async fn run(&self, request: &RunRequest) -> crate::Result<RunResult> {
        let wire = ResponsesRequest::from_run_request(request);
        let reply = self.send(&wire).await?;

        let result = reply.into_run_result(request);

        // REQUIRED means at least one web_search_call in the output items.
        // tool_choice stays "auto", so enforcement is post-hoc.
        super::enforce_required_grounding(request, result.grounded_effective)?;

        Ok(result)
    }

    async fn version_probe(&self, model_id: &str) -> crate::Result<VersionProbe> {
        let wire = ResponsesRequest::probe(model_id);
        let reply = self.send(&wire).await?;

        Ok(VersionProbe {
            provider_version_key: reply.system_fingerprint().map(str::to_owned),
            model_version: reply.model().map(str::to_owned),
        })
    }

    async fn smoke_test(&self) -> crate::Result<()> {
        self.version_probe(SMOKE_TEST_MODEL).await.map(|_| ())
    }
}
