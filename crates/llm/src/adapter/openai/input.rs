//! Request wire types for the OpenAI Responses API.

use serde::Serialize;
use serde_json::{Value, json};

use crate::RunRequest;

#[derive(Debug, Serialize)]
pub(crate) struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
    /// Schema enforcement rides under `text.format`; the Responses API
    /// has no top-level schema parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    // `seed` is intentionally absent: the Responses API rejects it. It is
    // recorded in run metadata instead.
}

#[derive(Debug, Serialize)]
pub(crate) struct InputMessage {
    pub role: &'static str,
    pub content: String,
}

impl ResponsesRequest {
    /// Message layout is `[system, ALS-as-user, user]`; the ALS turn is
    /// omitted when the request carries no block and is never merged
    /// into the prompt.
    pub fn from_run_request(request: &RunRequest) -> Self {
        let mut input = Vec::with_capacity(3);

        if !request.system_text.is_empty() {
            input.push(InputMessage {
                role: "system",
                content: request.system_text.clone(),
            });
        }

        if let Some(block) = &request.als_block {
            input.push(InputMessage {
                role: "user",
                content: block.text.clone(),
            });
        }

        input.push(InputMessage {
            role: "user",
            content: request.user_prompt.clone(),
        });

        let mut tools = Vec::new();
        if request.grounding_mode.wants_tools() {
            tools.push(json!({"type": "web_search"}));
        }
        if let Some(extra) = &request.tools_spec {
            tools.extend(extra.iter().cloned());
        }

        let tool_choice = (!tools.is_empty()).then_some("auto");

        let text = request.response_schema.as_ref().map(|schema| {
            json!({
                "format": {
                    "type": "json_schema",
                    "name": "response",
                    "schema": schema,
                    "strict": true,
                }
            })
        });

        Self {
            model: request.model_id.clone(),
            input,
            temperature: request.temperature,
            top_p: request.top_p,
            tools,
            tool_choice,
            text,
            max_output_tokens: None,
        }
    }

    /// One-token request used for version probes and smoke tests.
    pub fn probe(model_id: &str) -> Self {
        Self {
            model: model_id.to_owned(),
            input: vec![InputMessage {
                role: "user",
                content: "ping".to_owned(),
            }],
            temperature: None,
            top_p: None,
            tools: Vec::new(),
            tool_choice: None,
            text: None,
            max_output_tokens: Some(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use als::{AlsBlock, Locale};
    use serde_json::json;

    use super::*;
    use crate::{GroundingMode, RunRequest};

    fn request_with_als() -> RunRequest {
        let mut request = RunRequest::new("gpt-5", "What do you know about Aurora Coffee?");
        request.system_text = "Answer briefly.".to_owned();
        request.als_block = Some(AlsBlock {
            locale: Locale::De,
            text: "Lokale Zeit: 2025-06-02".to_owned(),
        });
        request.grounding_mode = GroundingMode::Preferred;
        request
    }

    #[test]
    fn als_is_a_separate_user_turn_before_the_prompt() {
        let wire = ResponsesRequest::from_run_request(&request_with_als());

        assert_eq!(wire.input.len(), 3);
        assert_eq!(wire.input[0].role, "system");
        assert_eq!(wire.input[1].role, "user");
        assert!(wire.input[1].content.starts_with("Lokale Zeit"));
        assert_eq!(wire.input[2].role, "user");
        assert!(wire.input[2].content.contains("Aurora Coffee"));
        assert!(!wire.input[2].content.contains("Lokale Zeit"));
    }

    #[test]
    fn grounding_attaches_web_search_with_auto_choice() {
        let wire = ResponsesRequest::from_run_request(&request_with_als());

        assert_eq!(wire.tools, vec![json!({"type": "web_search"})]);
        assert_eq!(wire.tool_choice, Some("auto"));
    }

    #[test]
    fn off_mode_attaches_no_tools() {
        let mut request = request_with_als();
        request.grounding_mode = GroundingMode::Off;

        let wire = ResponsesRequest::from_run_request(&request);
        assert!(wire.tools.is_empty());
        assert_eq!(wire.tool_choice, None);
    }

    #[test]
    fn schema_lands_under_text_format() {
        let mut request = request_with_als();
        request.response_schema = Some(json!({"type": "object"}));

        let wire = ResponsesRequest::from_run_request(&request);
        let text = wire.text.unwrap();

        assert_eq!(text["format"]["type"], "json_schema");
        assert_eq!(text["format"]["schema"], json!({"type": "object"}));
    }

    #[test]
    fn seed_is_never_serialized() {
        let mut request = request_with_als();
        request.seed = Some(42);

        let wire = ResponsesRequest::from_run_request(&request);
        let serialized = serde_json::to_string(&wire).unwrap();

        assert!(!serialized.contains("seed"));
    }
}
