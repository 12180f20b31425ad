//! Response wire types and grounding-signal extraction for Vertex GenAI.

use serde::Deserialize;
use serde_json::Value;

use crate::{Citation, Usage};

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "modelVersion", alias = "model_version")]
    pub model_version: Option<String>,
    #[serde(rename = "responseId", alias = "response_id")]
    pub response_id: Option<String>,
    #[serde(rename = "usageMetadata", alias = "usage_metadata")]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<CandidateContent>,
    /// Kept as raw JSON: SDK versions disagree on the casing and shape of
    /// grounding metadata, so extraction walks both spellings.
    #[serde(rename = "groundingMetadata", alias = "grounding_metadata")]
    pub grounding_metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidatePart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageMetadata {
    pub prompt_token_count: Option<u64>,
    pub candidates_token_count: Option<u64>,
    pub total_token_count: Option<u64>,
}

/// Grounding evidence distilled from one response.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct GroundingSignals {
    pub citations: Vec<Citation>,
    pub chunk_count: usize,
    pub query_count: usize,
}

impl GroundingSignals {
    pub fn grounded(&self) -> bool {
        self.chunk_count > 0 || self.query_count > 0
    }
}

impl GenerateResponse {
    /// Response text: the concatenation of the first candidate's non-empty
    /// part texts. Falls back across parts when the leading part is empty.
    pub fn text(&self) -> String {
        let Some(candidate) = self.candidates.first() else {
            return String::new();
        };

        let Some(content) = &candidate.content else {
            return String::new();
        };

        content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Extract grounding evidence from the first candidate, tolerating
    /// both camelCase and snake_case metadata. Citations are built
    /// exclusively from the grounding chunks, deduplicated by URI; any
    /// `citations` field on the metadata itself is ignored as unreliable
    /// across SDK versions.
    pub fn grounding_signals(&self) -> GroundingSignals {
        let Some(metadata) = self
            .candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
        else {
            return GroundingSignals::default();
        };

        let chunks = pick(metadata, "grounding_chunks", "groundingChunks")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let query_count = pick(metadata, "web_search_queries", "webSearchQueries")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);

        let mut citations: Vec<Citation> = Vec::new();

        for chunk in &chunks {
            let Some(web) = chunk.get("web").or_else(|| chunk.get("retrievedContext")) else {
                continue;
            };

            let Some(uri) = web
                .get("uri")
                .or_else(|| web.get("url"))
                .and_then(Value::as_str)
            else {
                continue;
            };

            if citations.iter().any(|existing| existing.uri == uri) {
                continue;
            }

            citations.push(Citation {
                uri: uri.to_owned(),
                title: web.get("title").and_then(Value::as_str).map(str::to_owned),
                source: "web_search".to_owned(),
            });
        }

        GroundingSignals {
            citations,
            chunk_count: chunks.len(),
            query_count,
        }
    }

    pub fn usage(&self) -> Option<Usage> {
        self.usage_metadata.as_ref().map(|usage| Usage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        })
    }
}

fn pick<'a>(metadata: &'a Value, snake: &str, camel: &str) -> Option<&'a Value> {
    metadata.get(snake).or_else(|| metadata.get(camel))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(value: Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_concatenates_non_empty_parts() {
        let parsed = response(json!({
            "candidates": [{
                "content": {"parts": [{"text": ""}, {"text": "Die MwSt "}, {"text": "beträgt 8.1%."}]}
            }]
        }));

        assert_eq!(parsed.text(), "Die MwSt beträgt 8.1%.");
    }

    #[test]
    fn snake_case_grounding_metadata_is_recognized() {
        let parsed = response(json!({
            "candidates": [{
                "content": {"parts": [{"text": "8.1%"}]},
                "grounding_metadata": {
                    "grounding_chunks": [
                        {"web": {"uri": "https://example.ch/vat", "title": "VAT"}}
                    ],
                    "web_search_queries": ["mehrwertsteuer schweiz"]
                }
            }]
        }));

        let signals = parsed.grounding_signals();
        assert!(signals.grounded());
        assert_eq!(signals.chunk_count, 1);
        assert_eq!(signals.query_count, 1);
        assert_eq!(signals.citations[0].uri, "https://example.ch/vat");
    }

    #[test]
    fn camel_case_grounding_metadata_is_recognized() {
        let parsed = response(json!({
            "candidates": [{
                "content": {"parts": [{"text": "19%"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://example.de/schuko"}},
                        {"web": {"uri": "https://example.de/schuko"}}
                    ],
                    "webSearchQueries": []
                }
            }]
        }));

        let signals = parsed.grounding_signals();
        assert!(signals.grounded());
        assert_eq!(signals.citations.len(), 1, "duplicate URIs collapse");
        assert_eq!(signals.citations[0].title, None);
    }

    #[test]
    fn metadata_citations_field_is_ignored() {
        let parsed = response(json!({
            "candidates": [{
                "content": {"parts": [{"text": "x"}]},
                "groundingMetadata": {
                    "citations": ["https://unreliable.example/ignore-me"],
                    "groundingChunks": [{"web": {"uri": "https://example.fr/plugs"}}]
                }
            }]
        }));

        let signals = parsed.grounding_signals();
        assert_eq!(signals.citations.len(), 1);
        assert_eq!(signals.citations[0].uri, "https://example.fr/plugs");
    }

    #[test]
    fn queries_alone_count_as_grounding() {
        let parsed = response(json!({
            "candidates": [{
                "content": {"parts": [{"text": "x"}]},
                "groundingMetadata": {"webSearchQueries": ["plug type switzerland"]}
            }]
        }));

        let signals = parsed.grounding_signals();
        assert!(signals.grounded());
        assert!(signals.citations.is_empty());
    }

    #[test]
    fn missing_metadata_is_ungrounded() {
        let parsed = response(json!({
            "candidates": [{"content": {"parts": [{"text": "19%"}]}}]
        }));

        assert!(!parsed.grounding_signals().grounded());
    }

    #[test]
    fn usage_metadata_maps_to_token_counts() {
        let parsed = response(json!({
            "candidates": [],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
        }));

        let usage = parsed.usage().unwrap();
        assert_eq!(usage.input_tokens, Some(10));
        assert_eq!(usage.total_tokens, Some(15));
    }
}
