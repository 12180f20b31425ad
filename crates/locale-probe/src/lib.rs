//! Locale-probe evaluation.
//!
//! A locale probe asks the model for a country's VAT rate, plug types and
//! emergency numbers as JSON. Models format these values with considerable
//! drift ("8,1 %", "Typ J", "call 112 or 117"), so evaluation is tolerant:
//! parse what is recognizable, normalize it and compare against the fixed
//! per-country expectation table. Evaluation never fails with an error; a
//! hopeless response yields `ParseConfidence::Failed` plus a reason code.

mod emergency;
mod expectations;
mod extract;
mod plug;
mod vat;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use expectations::{CountryExpectation, expectation_for};

/// How much of the probe response was usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseConfidence {
    /// All three fields matched expectations.
    FullMatch,
    /// At least one field matched.
    Partial,
    /// Valid JSON object, but nothing matched.
    StructuralParseOnly,
    /// No parseable JSON object in the response.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    UnknownCountry,
    JsonMissing,
    JsonMalformed,
}

/// Outcome of evaluating one probe response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeEvaluation {
    pub country: String,
    pub vat_pass: bool,
    pub plug_pass: bool,
    pub emergency_pass: bool,
    /// Composite: all per-field flags hold.
    pub passed: bool,
    pub normalized_vat: Option<String>,
    pub normalized_plugs: Vec<String>,
    pub normalized_emergency: Vec<String>,
    pub confidence: ParseConfidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
}

impl ProbeEvaluation {
    fn failed(country: &str, reason: ReasonCode) -> Self {
        Self {
            country: country.to_owned(),
            vat_pass: false,
            plug_pass: false,
            emergency_pass: false,
            passed: false,
            normalized_vat: None,
            normalized_plugs: Vec::new(),
            normalized_emergency: Vec::new(),
            confidence: ParseConfidence::Failed,
            reason: Some(reason),
        }
    }
}

/// Evaluate a raw model response against a country's expected civic values.
pub fn evaluate(response_text: &str, country: &str) -> ProbeEvaluation {
    let Some(expectation) = expectation_for(country) else {
        return ProbeEvaluation::failed(country, ReasonCode::UnknownCountry);
    };

    let Some(candidate) = extract::first_json_object(response_text) else {
        return ProbeEvaluation::failed(country, ReasonCode::JsonMissing);
    };

    let object: Value = match serde_json::from_str(&candidate) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(_) | Err(_) => return ProbeEvaluation::failed(country, ReasonCode::JsonMalformed),
    };

    let normalized_vat = field(&object, VAT_KEYS).map(|value| vat::normalize(value, expectation));
    let normalized_plugs = field(&object, PLUG_KEYS).map(plug::parse).unwrap_or_default();
    let normalized_emergency = field(&object, EMERGENCY_KEYS)
        .map(emergency::parse)
        .unwrap_or_default();

    let vat_pass = normalized_vat
        .as_deref()
        .is_some_and(|vat| vat == expectation.vat);

    let plug_pass = !normalized_plugs.is_empty()
        && normalized_plugs
            .iter()
            .all(|plug| expectation.plugs.contains(&plug.as_str()));

    let emergency_pass = normalized_emergency
        .iter()
        .any(|number| expectation.emergency_any.contains(&number.as_str()));

    let passed = vat_pass && plug_pass && emergency_pass;

    let matches = [vat_pass, plug_pass, emergency_pass]
        .iter()
        .filter(|pass| **pass)
        .count();

    let confidence = if passed {
        ParseConfidence::FullMatch
    } else if matches > 0 {
        ParseConfidence::Partial
    } else {
        ParseConfidence::StructuralParseOnly
    };

    ProbeEvaluation {
        country: expectation.code.to_owned(),
        vat_pass,
        plug_pass,
        emergency_pass,
        passed,
        normalized_vat,
        normalized_plugs,
        normalized_emergency,
        confidence,
        reason: None,
    }
}

const VAT_KEYS: &[&str] = &["vat", "vat_percent", "vat_rate", "gst", "tva", "iva", "mwst"];
const PLUG_KEYS: &[&str] = &["plug", "plugs", "plug_type", "plug_types"];
const EMERGENCY_KEYS: &[&str] = &["emergency", "emergency_numbers", "emergency_number"];

/// Case-insensitive lookup across the accepted key aliases.
fn field<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = object.as_object()?;

    for key in keys {
        for (name, value) in map {
            if name.eq_ignore_ascii_case(key) {
                return Some(value);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    #[test]
    fn swiss_probe_with_comma_decimal_passes() {
        let response = json!({
            "vat_percent": "8,1%",
            "plug": ["J", "C"],
            "emergency": ["112", "117"]
        })
        .to_string();

        let evaluation = evaluate(&response, "CH");

        assert!(evaluation.passed, "{evaluation:?}");
        assert_eq!(evaluation.normalized_vat.as_deref(), Some("8.1%"));
        assert_eq!(evaluation.confidence, ParseConfidence::FullMatch);
    }

    #[test]
    fn us_probe_accepts_no_federal_vat_variants() {
        for vat in ["no federal VAT", "none", "N/A", "0%", "0"] {
            let response = json!({
                "vat": vat,
                "plug": "A/B",
                "emergency": "911"
            })
            .to_string();

            let evaluation = evaluate(&response, "US");
            assert!(evaluation.passed, "vat variant {vat:?}: {evaluation:?}");
        }
    }

    #[test]
    fn code_fenced_json_is_accepted() {
        let response = indoc! {r#"
            Here is the requested data:

            ```json
            {"vat": "19%", "plug": "Typ F (Schuko)", "emergency": "112 oder 110"}
            ```
        "#};

        let evaluation = evaluate(response, "DE");

        assert!(evaluation.passed, "{evaluation:?}");
        assert_eq!(evaluation.normalized_plugs, vec!["F"]);
        assert!(evaluation.normalized_emergency.contains(&"112".to_owned()));
    }

    #[test]
    fn gb_accepts_either_primary_number() {
        for number in ["999", "112"] {
            let response = json!({"vat": "20%", "plug": "G", "emergency": number}).to_string();
            assert!(evaluate(&response, "GB").passed);
        }
    }

    #[test]
    fn plug_superset_fails() {
        let response = json!({"vat": "20%", "plug": ["G", "A"], "emergency": "999"}).to_string();

        let evaluation = evaluate(&response, "GB");
        assert!(!evaluation.plug_pass);
        assert!(!evaluation.passed);
        assert_eq!(evaluation.confidence, ParseConfidence::Partial);
    }

    #[test]
    fn empty_plug_set_fails() {
        let response = json!({"vat": "19%", "plug": [], "emergency": "112"}).to_string();
        assert!(!evaluate(&response, "DE").plug_pass);
    }

    #[test]
    fn missing_json_reports_failed() {
        let evaluation = evaluate("The VAT rate in this country is 19 percent.", "DE");

        assert_eq!(evaluation.confidence, ParseConfidence::Failed);
        assert_eq!(evaluation.reason, Some(ReasonCode::JsonMissing));
        assert!(!evaluation.passed);
    }

    #[test]
    fn unknown_country_reports_failed() {
        let evaluation = evaluate("{}", "BR");
        assert_eq!(evaluation.reason, Some(ReasonCode::UnknownCountry));
    }

    #[test]
    fn wrong_values_are_structural_parse_only() {
        let response = json!({"vat": "25%", "plug": "K", "emergency": "113"}).to_string();

        let evaluation = evaluate(&response, "DE");
        assert_eq!(evaluation.confidence, ParseConfidence::StructuralParseOnly);
    }
}
