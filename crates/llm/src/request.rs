use std::fmt;
use std::time::Duration;

use als::AlsBlock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Default hard wall-clock deadline for one run.
pub const DEFAULT_HARD_DEADLINE: Duration = Duration::from_secs(120);

/// Soft deadline for grounded calls; exceeding it is logged, not fatal.
pub const DEFAULT_GROUNDED_SOFT_DEADLINE: Duration = Duration::from_secs(60);

/// How strongly a run demands web grounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroundingMode {
    /// Fail closed when no grounding evidence is observed.
    Required,
    /// Attach the search tool, accept whatever the model does.
    Preferred,
    /// No search tool attached.
    Off,
}

impl GroundingMode {
    pub fn wants_tools(&self) -> bool {
        matches!(self, Self::Required | Self::Preferred)
    }
}

impl fmt::Display for GroundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Required => "REQUIRED",
            Self::Preferred => "PREFERRED",
            Self::Off => "OFF",
        };
        f.write_str(label)
    }
}

/// Closed provider set. Dispatch is a tagged match on this value, not a
/// plugin mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Openai,
    Google,
    Anthropic,
    AzureOpenai,
    Unknown,
}

impl ProviderKind {
    /// Infer the provider from a model id prefix.
    pub fn infer(model_id: &str) -> ProviderKind {
        let lowered = model_id.trim().to_lowercase();

        const OPENAI_PREFIXES: [&str; 5] = ["gpt", "o3", "o4", "omni", "chatgpt"];
        const GOOGLE_PREFIXES: [&str; 2] = ["gemini", "google"];
        const ANTHROPIC_PREFIXES: [&str; 2] = ["claude", "anthropic"];

        if OPENAI_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
            ProviderKind::Openai
        } else if GOOGLE_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
            ProviderKind::Google
        } else if ANTHROPIC_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
            ProviderKind::Anthropic
        } else if lowered.starts_with("azure") {
            ProviderKind::AzureOpenai
        } else {
            ProviderKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Google => "google",
            Self::Anthropic => "anthropic",
            Self::AzureOpenai => "azure-openai",
            Self::Unknown => "unknown",
        }
    }

    /// Parse an explicit provider label.
    pub fn parse_label(label: &str) -> Option<ProviderKind> {
        match label.trim().to_lowercase().as_str() {
            "openai" => Some(ProviderKind::Openai),
            "google" | "vertex" => Some(ProviderKind::Google),
            "anthropic" => Some(ProviderKind::Anthropic),
            "azure-openai" | "azure" => Some(ProviderKind::AzureOpenai),
            "unknown" => Some(ProviderKind::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One model call under experimental control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub run_id: Uuid,
    /// Explicit provider; inferred from the model id when absent.
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    pub model_id: String,
    /// System instructions, already combined with the ALS augmentation
    /// where an ambient block rides along.
    #[serde(default)]
    pub system_text: String,
    /// Ambient block delivered as its own user turn before the prompt,
    /// never concatenated into it.
    #[serde(default)]
    pub als_block: Option<AlsBlock>,
    pub user_prompt: String,
    pub grounding_mode: GroundingMode,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Recorded in run metadata for provenance. Not forwarded to
    /// providers that reject it (the OpenAI Responses API does).
    #[serde(default)]
    pub seed: Option<u64>,
    /// JSON schema the response must conform to, when set.
    #[serde(default)]
    pub response_schema: Option<Value>,
    /// Extra tool descriptors beyond the grounding tool.
    #[serde(default)]
    pub tools_spec: Option<Vec<Value>>,
    #[serde(default = "default_hard_deadline", with = "duration_secs")]
    pub hard_deadline: Duration,
    #[serde(default = "default_soft_deadline", with = "duration_secs")]
    pub grounded_soft_deadline: Duration,
}

fn default_hard_deadline() -> Duration {
    DEFAULT_HARD_DEADLINE
}

fn default_soft_deadline() -> Duration {
    DEFAULT_GROUNDED_SOFT_DEADLINE
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

impl RunRequest {
    /// Minimal request with library defaults for the tuning knobs.
    pub fn new(model_id: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            provider: None,
            model_id: model_id.into(),
            system_text: String::new(),
            als_block: None,
            user_prompt: user_prompt.into(),
            grounding_mode: GroundingMode::Off,
            temperature: None,
            top_p: None,
            seed: None,
            response_schema: None,
            tools_spec: None,
            hard_deadline: DEFAULT_HARD_DEADLINE,
            grounded_soft_deadline: DEFAULT_GROUNDED_SOFT_DEADLINE,
        }
    }

    /// Effective provider for routing.
    pub fn provider(&self) -> ProviderKind {
        self.provider.unwrap_or_else(|| ProviderKind::infer(&self.model_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_inference_covers_the_documented_prefixes() {
        assert_eq!(ProviderKind::infer("gpt-5"), ProviderKind::Openai);
        assert_eq!(ProviderKind::infer("o3-mini"), ProviderKind::Openai);
        assert_eq!(ProviderKind::infer("chatgpt-4o-latest"), ProviderKind::Openai);
        assert_eq!(ProviderKind::infer("gemini-2.5-pro"), ProviderKind::Google);
        assert_eq!(ProviderKind::infer("claude-sonnet-4-5"), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::infer("azure-gpt-4o"), ProviderKind::AzureOpenai);
        assert_eq!(ProviderKind::infer("mistral-large"), ProviderKind::Unknown);
    }

    #[test]
    fn explicit_provider_wins_over_inference() {
        let mut request = RunRequest::new("gpt-5", "hello");
        request.provider = Some(ProviderKind::AzureOpenai);

        assert_eq!(request.provider(), ProviderKind::AzureOpenai);
    }

    #[test]
    fn grounding_modes_round_trip_as_uppercase() {
        let json = serde_json::to_string(&GroundingMode::Required).unwrap();
        assert_eq!(json, "\"REQUIRED\"");

        let parsed: GroundingMode = serde_json::from_str("\"OFF\"").unwrap();
        assert_eq!(parsed, GroundingMode::Off);
    }
}
