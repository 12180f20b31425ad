//! Request wire types for the Vertex GenAI `generateContent` endpoint.

use serde::Serialize;
use serde_json::{Value, json};

use crate::RunRequest;

/// Temperature used for every grounded call on 2.x models; lower values
/// empirically stop the model from invoking the search tool at all.
pub(crate) const GROUNDED_TEMPERATURE: f64 = 1.0;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Part {
    pub text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    /// Grounded pass: search tool attached, no response schema. Used both
    /// for plain grounded runs and as pass 1 of the two-pass split.
    pub fn grounded(request: &RunRequest) -> Self {
        Self {
            system_instruction: system_content(request),
            contents: user_contents(request),
            tools: vec![json!({"googleSearch": {}})],
            generation_config: GenerationConfig {
                temperature: Some(GROUNDED_TEMPERATURE),
                top_p: request.top_p,
                ..Default::default()
            },
        }
    }

    /// Ungrounded pass honoring the requested parameters, with the schema
    /// attached when one was requested.
    pub fn ungrounded(request: &RunRequest) -> Self {
        Self {
            system_instruction: system_content(request),
            contents: user_contents(request),
            tools: Vec::new(),
            generation_config: schema_config(request),
        }
    }

    /// Pass 2 of the two-pass split: reformat pass-1 text into the schema
    /// with no tools attached.
    pub fn reformat(request: &RunRequest, pass1_text: &str) -> Self {
        let instruction = format!(
            "Reformat the following answer as JSON conforming to the requested schema. \
             Do not add information.\n\n{pass1_text}"
        );

        Self {
            system_instruction: None,
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: instruction }],
            }],
            tools: Vec::new(),
            generation_config: schema_config(request),
        }
    }

    /// One-token request used for version probes and smoke tests.
    pub fn probe() -> Self {
        Self {
            system_instruction: None,
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: "ping".to_owned(),
                }],
            }],
            tools: Vec::new(),
            generation_config: GenerationConfig {
                max_output_tokens: Some(1),
                ..Default::default()
            },
        }
    }
}

fn schema_config(request: &RunRequest) -> GenerationConfig {
    let mut generation_config = GenerationConfig {
        temperature: request.temperature,
        top_p: request.top_p,
        ..Default::default()
    };

    if let Some(schema) = &request.response_schema {
        generation_config.response_mime_type = Some("application/json");
        generation_config.response_schema = Some(schema.clone());
    }

    generation_config
}

fn system_content(request: &RunRequest) -> Option<Content> {
    if request.system_text.is_empty() {
        return None;
    }

    Some(Content {
        role: "system",
        parts: vec![Part {
            text: request.system_text.clone(),
        }],
    })
}

/// The ambient block is its own user turn ahead of the prompt; it is
/// never concatenated into the prompt text.
fn user_contents(request: &RunRequest) -> Vec<Content> {
    let mut contents = Vec::with_capacity(2);

    if let Some(block) = &request.als_block {
        contents.push(Content {
            role: "user",
            parts: vec![Part {
                text: block.text.clone(),
            }],
        });
    }

    contents.push(Content {
        role: "user",
        parts: vec![Part {
            text: request.user_prompt.clone(),
        }],
    });

    contents
}

#[cfg(test)]
mod tests {
    use als::{AlsBlock, Locale};
    use serde_json::json;

    use super::*;
    use crate::{GroundingMode, RunRequest};

    fn swiss_request() -> RunRequest {
        let mut request = RunRequest::new("gemini-2.5-pro", "Welche Steckdosen gibt es?");
        request.als_block = Some(AlsBlock {
            locale: Locale::Ch,
            text: "Lokale Zeit: 2025-06-02".to_owned(),
        });
        request.grounding_mode = GroundingMode::Required;
        request.temperature = Some(0.2);
        request
    }

    #[test]
    fn grounded_requests_force_temperature_one() {
        let wire = GenerateRequest::grounded(&swiss_request());

        assert_eq!(wire.generation_config.temperature, Some(1.0));
        assert_eq!(wire.tools, vec![json!({"googleSearch": {}})]);
        assert!(wire.generation_config.response_schema.is_none());
    }

    #[test]
    fn ungrounded_requests_honor_the_requested_temperature() {
        let mut request = swiss_request();
        request.grounding_mode = GroundingMode::Off;

        let wire = GenerateRequest::ungrounded(&request);
        assert_eq!(wire.generation_config.temperature, Some(0.2));
        assert!(wire.tools.is_empty());
    }

    #[test]
    fn als_rides_as_its_own_user_turn() {
        let wire = GenerateRequest::grounded(&swiss_request());

        assert_eq!(wire.contents.len(), 2);
        assert!(wire.contents[0].parts[0].text.starts_with("Lokale Zeit"));
        assert!(wire.contents[1].parts[0].text.contains("Steckdosen"));
        assert!(!wire.contents[1].parts[0].text.contains("Lokale Zeit"));
    }

    #[test]
    fn reformat_pass_carries_schema_and_no_tools() {
        let mut request = swiss_request();
        request.response_schema = Some(json!({"type": "object"}));

        let wire = GenerateRequest::reformat(&request, "VAT is 8.1%");

        assert!(wire.tools.is_empty());
        assert_eq!(
            wire.generation_config.response_mime_type,
            Some("application/json")
        );
        assert!(wire.contents[0].parts[0].text.contains("VAT is 8.1%"));
    }

    #[test]
    fn camel_case_field_names_on_the_wire() {
        let mut request = swiss_request();
        request.response_schema = Some(json!({"type": "object"}));
        request.grounding_mode = GroundingMode::Off;
        request.top_p = Some(0.95);

        let serialized = serde_json::to_value(GenerateRequest::ungrounded(&request)).unwrap();

        assert!(serialized.get("generationConfig").is_some());
        assert!(serialized["generationConfig"].get("responseMimeType").is_some());
        assert!(serialized["generationConfig"].get("topP").is_some());
    }
}
