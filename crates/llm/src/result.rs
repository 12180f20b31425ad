use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single grounding citation. Always a mapping; adapters coerce bare
/// URI strings through [`Citation::from_bare_uri`] before a result is
/// allowed out of the adapter layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: Option<String>,
    pub source: String,
}

impl Citation {
    pub fn from_bare_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: None,
            source: "web_search".to_owned(),
        }
    }
}

/// Token accounting as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

/// Uniform adapter output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Assembled response text.
    pub text: String,
    /// Parsed object when a response schema was requested and the text
    /// parsed; `json_valid` mirrors this.
    pub json_obj: Option<Value>,
    pub json_valid: bool,
    pub tool_call_count: u32,
    pub grounded_effective: bool,
    pub citations: Vec<Citation>,
    /// Provider-reported model version (`modelVersion`, or the model id
    /// when the provider reports nothing richer).
    pub model_version: String,
    pub system_fingerprint: Option<String>,
    pub response_id: Option<String>,
    /// Measured by the orchestrator around the adapter call.
    pub latency_ms: u64,
    pub usage: Option<Usage>,
    /// Provenance extras (recorded seed, two-pass details and the like).
    pub metadata: Value,
}

impl RunResult {
    pub(crate) fn empty(model_version: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            json_obj: None,
            json_valid: false,
            tool_call_count: 0,
            grounded_effective: false,
            citations: Vec::new(),
            model_version: model_version.into(),
            system_fingerprint: None,
            response_id: None,
            latency_ms: 0,
            usage: None,
            metadata: Value::Null,
        }
    }

    /// The provider version key for this result, by provider convention:
    /// OpenAI's fingerprint when present, else the model version.
    pub fn provider_version_key(&self) -> Option<String> {
        self.system_fingerprint
            .clone()
            .or_else(|| (!self.model_version.is_empty()).then(|| self.model_version.clone()))
    }
}

/// Parse response text as a JSON object, tolerating surrounding markdown
/// code fences. Returns `None` when the text is not an object.
pub fn parse_json_lenient(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    let candidate = if trimmed.starts_with("```") {
        trimmed
            .lines()
            .filter(|line| !line.trim_start().starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        trimmed.to_owned()
    };

    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ Value::Object(_)) => Some(value),
        Ok(_) | Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_uri_coercion_fills_the_mandatory_keys() {
        let citation = Citation::from_bare_uri("https://example.ch/vat");

        assert_eq!(citation.uri, "https://example.ch/vat");
        assert_eq!(citation.title, None);
        assert_eq!(citation.source, "web_search");
    }

    #[test]
    fn version_key_prefers_the_fingerprint() {
        let mut result = RunResult::empty("gpt-5-2025-06-01");
        assert_eq!(result.provider_version_key().as_deref(), Some("gpt-5-2025-06-01"));

        result.system_fingerprint = Some("fp_abc123".to_owned());
        assert_eq!(result.provider_version_key().as_deref(), Some("fp_abc123"));
    }

    #[test]
    fn lenient_parse_strips_fences_and_rejects_non_objects() {
        let fenced = "```json\n{\"vat\": \"19%\"}\n```";
        assert!(parse_json_lenient(fenced).is_some());

        assert!(parse_json_lenient("[1, 2, 3]").is_none());
        assert!(parse_json_lenient("not json").is_none());
    }
}
