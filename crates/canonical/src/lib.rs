//! Canonical representation and hashing of prompt template identities.
//!
//! A template is a configuration bundle, not just prompt text. Two bundles
//! that differ only in whitespace, key order, float printing or country
//! ordering are the same experiment and must receive the same hash.

mod normalize;
mod writer;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub use normalize::{normalize_countries, normalize_text, round_floats};

/// The identity attributes of a prompt template. Everything in here is
/// hashed; labels such as the provider name or the template's display name
/// never belong in this struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateIdentity {
    /// System instructions, may be empty.
    #[serde(default)]
    pub system_instructions: String,
    /// User prompt template, may contain `{{brand}}` placeholders.
    #[serde(default)]
    pub user_prompt_template: String,
    /// ISO-3166 alpha-2 codes. Synonyms such as `UK` are mapped during
    /// canonicalization, so callers may pass them verbatim.
    #[serde(default)]
    pub country_set: Vec<String>,
    /// Opaque model identifier; the provider is inferred from its prefix.
    pub model_id: String,
    /// Provider inference parameters as a nested mapping with scalar leaves.
    #[serde(default)]
    pub inference_params: Option<Value>,
    /// Ordered tool descriptors. Position is semantically meaningful to
    /// providers and is preserved.
    #[serde(default)]
    pub tools_spec: Option<Vec<Value>>,
    /// Response format mapping.
    #[serde(default)]
    pub response_format: Option<Value>,
    #[serde(default)]
    pub grounding_profile_id: Option<String>,
    #[serde(default)]
    pub grounding_snapshot_id: Option<String>,
    /// Retrieval parameters mapping.
    #[serde(default)]
    pub retrieval_params: Option<Value>,
}

/// Byte-stable canonical form of a [`TemplateIdentity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// Compact canonical JSON (`,`/`:` separators, sorted keys).
    pub json: String,
    /// Lowercase hex SHA-256 of the canonical JSON's UTF-8 bytes.
    pub config_hash: String,
}

/// Produce the canonical JSON and config hash for an identity.
///
/// This function is total: illegal leaves (non-scalar inference params,
/// non-string country codes) are the caller's responsibility and are
/// passed through as-is rather than rejected here.
pub fn canonicalize(identity: &TemplateIdentity) -> Canonical {
    let canonical_value = canonical_value(identity);
    let json = writer::to_canonical_json(&canonical_value);

    let digest = Sha256::digest(json.as_bytes());

    Canonical {
        json,
        config_hash: hex::encode(digest),
    }
}

/// Assemble the normalized identity as a JSON value. Absent optional
/// fields become JSON `null`, never missing keys.
fn canonical_value(identity: &TemplateIdentity) -> Value {
    let mut map = serde_json::Map::new();

    map.insert(
        "system_instructions".to_owned(),
        Value::String(normalize_text(&identity.system_instructions)),
    );
    map.insert(
        "user_prompt_template".to_owned(),
        Value::String(normalize_text(&identity.user_prompt_template)),
    );
    map.insert(
        "country_set".to_owned(),
        Value::Array(
            normalize_countries(&identity.country_set)
                .into_iter()
                .map(Value::String)
                .collect(),
        ),
    );
    map.insert("model_id".to_owned(), Value::String(identity.model_id.clone()));
    map.insert(
        "inference_params".to_owned(),
        identity
            .inference_params
            .as_ref()
            .map(round_floats)
            .unwrap_or(Value::Null),
    );
    map.insert(
        "tools_spec".to_owned(),
        identity
            .tools_spec
            .as_ref()
            .map(|tools| Value::Array(tools.clone()))
            .unwrap_or(Value::Null),
    );
    map.insert(
        "response_format".to_owned(),
        identity.response_format.clone().unwrap_or(Value::Null),
    );
    map.insert(
        "grounding_profile_id".to_owned(),
        identity
            .grounding_profile_id
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    map.insert(
        "grounding_snapshot_id".to_owned(),
        identity
            .grounding_snapshot_id
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    map.insert(
        "retrieval_params".to_owned(),
        identity.retrieval_params.clone().unwrap_or(Value::Null),
    );

    Value::Object(map)
}
