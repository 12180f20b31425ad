//! Provider adapter configuration.

use secrecy::SecretString;
use serde::Deserialize;

/// Settings for the provider adapters.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// OpenAI Responses API adapter.
    pub openai: OpenAiConfig,
    /// Vertex GenAI adapter.
    pub vertex: VertexConfig,
}

/// OpenAI Responses API settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key; `OPENAI_API_KEY` fills this when unset.
    pub api_key: Option<SecretString>,
    /// Override for the API base URL.
    pub base_url: Option<String>,
}

impl OpenAiConfig {
    /// The adapter is enabled when a key is available.
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Vertex GenAI settings. Project and location are always explicit; the
/// adapter never relies on ambient project discovery.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VertexConfig {
    /// GCP project id; `GOOGLE_CLOUD_PROJECT` fills this when unset.
    pub project: Option<String>,
    /// Vertex region. `europe-west4` is the operationally validated
    /// region for grounding; `global` is an acceptable alternative.
    /// `GOOGLE_CLOUD_REGION` overrides.
    pub region: String,
    /// Service account to impersonate in local development.
    /// `GOOGLE_IMPERSONATE_SERVICE_ACCOUNT` fills this when unset.
    pub impersonate_service_account: Option<String>,
    /// When true, `GOOGLE_APPLICATION_CREDENTIALS` is stripped from the
    /// environment once at startup so Application Default Credentials
    /// take effect. The strip is logged.
    pub prefer_adc: bool,
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project: None,
            region: "europe-west4".to_owned(),
            impersonate_service_account: None,
            prefer_adc: false,
        }
    }
}

impl VertexConfig {
    /// The adapter is enabled when a project is configured.
    pub fn enabled(&self) -> bool {
        self.project.is_some()
    }
}
