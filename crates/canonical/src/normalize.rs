//! Normalization passes applied before canonical serialization.

use std::collections::BTreeSet;

use serde_json::Value;

/// Normalize a free-text identity field.
///
/// CRLF becomes LF, runs of spaces and tabs collapse to a single space and
/// the field is trimmed. Newlines are preserved: they are semantically
/// meaningful in system instructions.
pub fn normalize_text(text: &str) -> String {
    let unix = text.replace("\r\n", "\n");

    let mut collapsed = String::with_capacity(unix.len());
    let mut in_blank_run = false;

    for ch in unix.chars() {
        if ch == ' ' || ch == '\t' {
            if !in_blank_run {
                collapsed.push(' ');
            }
            in_blank_run = true;
        } else {
            collapsed.push(ch);
            in_blank_run = false;
        }
    }

    collapsed.trim().to_owned()
}

/// Uppercase, alias (`UK` -> `GB`), de-duplicate and sort country codes.
pub fn normalize_countries(countries: &[String]) -> Vec<String> {
    let normalized: BTreeSet<String> = countries
        .iter()
        .map(|code| {
            let upper = code.trim().to_uppercase();
            match upper.as_str() {
                "UK" => "GB".to_owned(),
                _ => upper,
            }
        })
        .collect();

    normalized.into_iter().collect()
}

/// Recursively round every floating-point leaf to 4 decimal places.
///
/// Mappings are rebuilt as given (key sorting happens in the canonical
/// writer); lists retain their order. Integer-valued JSON numbers pass
/// through untouched so that `42` never turns into `42.0`.
pub fn round_floats(value: &Value) -> Value {
    match value {
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.as_i64().is_none() && number.as_u64().is_none() => {
                let rounded = (float * 10_000.0).round() / 10_000.0;
                serde_json::Number::from_f64(rounded)
                    .map(Value::Number)
                    .unwrap_or_else(|| value.clone())
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(round_floats).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), round_floats(item)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn collapses_interior_whitespace_only() {
        assert_eq!(normalize_text("a  b\t\tc"), "a b c");
        assert_eq!(normalize_text("  padded  "), "padded");
        assert_eq!(normalize_text("one\ntwo"), "one\ntwo");
    }

    #[test]
    fn maps_uk_to_gb() {
        let input = vec!["uk".to_owned(), "US".to_owned(), "GB".to_owned()];
        assert_eq!(normalize_countries(&input), vec!["GB", "US"]);
    }

    #[test]
    fn rounds_deep_floats() {
        let rounded = round_floats(&json!({"a": {"b": [0.123456789]}, "n": 3}));
        assert_eq!(rounded, json!({"a": {"b": [0.1235]}, "n": 3}));
    }

    #[test]
    fn integers_stay_integers() {
        let rounded = round_floats(&json!({"max_tokens": 1024}));
        assert_eq!(rounded.to_string(), r#"{"max_tokens":1024}"#);
    }
}
