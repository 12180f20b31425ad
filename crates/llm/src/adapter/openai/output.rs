//! Response wire types for the OpenAI Responses API.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Citation, RunRequest, RunResult, Usage, parse_json_lenient};

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsesReply {
    id: Option<String>,
    model: Option<String>,
    system_fingerprint: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
    usage: Option<UsageWire>,
}

/// Output items are an open set; only `message` and `web_search_call`
/// matter here, everything else is carried by the catch-all fields.
#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    annotations: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct UsageWire {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

impl ResponsesReply {
    pub fn system_fingerprint(&self) -> Option<&str> {
        self.system_fingerprint.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn into_run_result(self, request: &RunRequest) -> RunResult {
        let tool_call_count = self
            .output
            .iter()
            .filter(|item| item.kind == "web_search_call")
            .count() as u32;

        let mut text = String::new();
        let mut citations: Vec<Citation> = Vec::new();

        for item in &self.output {
            if item.kind != "message" {
                continue;
            }

            for part in &item.content {
                if part.kind != "output_text" {
                    continue;
                }

                text.push_str(&part.text);

                for annotation in &part.annotations {
                    if let Some(citation) = annotation_citation(annotation)
                        && !citations.iter().any(|existing| existing.uri == citation.uri)
                    {
                        citations.push(citation);
                    }
                }
            }
        }

        let (json_obj, json_valid) = match &request.response_schema {
            Some(_) => {
                let parsed = parse_json_lenient(&text);
                let valid = parsed.is_some();
                (parsed, valid)
            }
            None => (None, false),
        };

        let mut result = RunResult::empty(self.model.unwrap_or_else(|| request.model_id.clone()));
        result.text = text;
        result.json_obj = json_obj;
        result.json_valid = json_valid;
        result.tool_call_count = tool_call_count;
        result.grounded_effective = tool_call_count >= 1;
        result.citations = citations;
        result.system_fingerprint = self.system_fingerprint;
        result.response_id = self.id;
        result.usage = self.usage.map(|usage| Usage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.total_tokens,
        });
        result.metadata = json!({
            "seed": request.seed,
            "grounding_mode": request.grounding_mode,
        });

        result
    }
}

/// Citation annotations arrive as `url_citation` objects; tolerate bare
/// URI strings by coercing them into the mandatory mapping shape.
fn annotation_citation(annotation: &Value) -> Option<Citation> {
    match annotation {
        Value::String(uri) => Some(Citation::from_bare_uri(uri.clone())),
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) != Some("url_citation") {
                return None;
            }

            let uri = map
                .get("url")
                .or_else(|| map.get("uri"))
                .and_then(Value::as_str)?
                .to_owned();

            Some(Citation {
                uri,
                title: map.get("title").and_then(Value::as_str).map(str::to_owned),
                source: "web_search".to_owned(),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{GroundingMode, RunRequest};

    fn reply(value: Value) -> ResponsesReply {
        serde_json::from_value(value).unwrap()
    }

    fn grounded_reply() -> Value {
        json!({
            "id": "resp_123",
            "model": "gpt-5-2025-06-01",
            "system_fingerprint": "fp_abc",
            "output": [
                {"type": "web_search_call", "status": "completed"},
                {"type": "message", "role": "assistant", "content": [
                    {
                        "type": "output_text",
                        "text": "The VAT rate is 19%.",
                        "annotations": [
                            {"type": "url_citation", "url": "https://example.de/vat", "title": "VAT"},
                            "https://example.de/bare"
                        ]
                    }
                ]}
            ],
            "usage": {"input_tokens": 20, "output_tokens": 9, "total_tokens": 29}
        })
    }

    #[test]
    fn web_search_calls_mark_the_result_grounded() {
        let request = RunRequest::new("gpt-5", "vat?");
        let result = reply(grounded_reply()).into_run_result(&request);

        assert!(result.grounded_effective);
        assert_eq!(result.tool_call_count, 1);
        assert_eq!(result.text, "The VAT rate is 19%.");
        assert_eq!(result.system_fingerprint.as_deref(), Some("fp_abc"));
        assert_eq!(result.response_id.as_deref(), Some("resp_123"));
        assert_eq!(result.model_version, "gpt-5-2025-06-01");
    }

    #[test]
    fn bare_string_annotations_are_coerced_to_mappings() {
        let request = RunRequest::new("gpt-5", "vat?");
        let result = reply(grounded_reply()).into_run_result(&request);

        assert_eq!(result.citations.len(), 2);
        assert_eq!(result.citations[0].uri, "https://example.de/vat");
        assert_eq!(result.citations[0].title.as_deref(), Some("VAT"));
        assert_eq!(result.citations[1].uri, "https://example.de/bare");
        assert_eq!(result.citations[1].title, None);
        assert_eq!(result.citations[1].source, "web_search");
    }

    #[test]
    fn no_tool_calls_means_ungrounded() {
        let request = RunRequest::new("gpt-5", "vat?");
        let value = json!({
            "id": "resp_9",
            "model": "gpt-5",
            "output": [
                {"type": "message", "content": [{"type": "output_text", "text": "19%"}]}
            ]
        });

        let result = reply(value).into_run_result(&request);
        assert!(!result.grounded_effective);
        assert_eq!(result.tool_call_count, 0);
    }

    #[test]
    fn unparseable_schema_output_sets_json_invalid_without_losing_text() {
        let mut request = RunRequest::new("gpt-5", "vat?");
        request.response_schema = Some(json!({"type": "object"}));
        request.grounding_mode = GroundingMode::Off;

        let value = json!({
            "model": "gpt-5",
            "output": [
                {"type": "message", "content": [{"type": "output_text", "text": "not json"}]}
            ]
        });

        let result = reply(value).into_run_result(&request);
        assert!(!result.json_valid);
        assert_eq!(result.json_obj, None);
        assert_eq!(result.text, "not json");
    }

    #[test]
    fn schema_output_parses_into_json_obj() {
        let mut request = RunRequest::new("gpt-5", "vat?");
        request.response_schema = Some(json!({"type": "object"}));

        let value = json!({
            "model": "gpt-5",
            "output": [
                {"type": "message", "content": [
                    {"type": "output_text", "text": "{\"vat\": \"19%\"}"}
                ]}
            ]
        });

        let result = reply(value).into_run_result(&request);
        assert!(result.json_valid);
        assert_eq!(result.json_obj, Some(json!({"vat": "19%"})));
    }

    #[test]
    fn seed_is_recorded_in_metadata() {
        let mut request = RunRequest::new("gpt-5", "vat?");
        request.seed = Some(1234);

        let result = reply(grounded_reply()).into_run_result(&request);
        assert_eq!(result.metadata["seed"], json!(1234));
    }
}
