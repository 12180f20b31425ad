//! Compact canonical JSON writer.
//!
//! `serde_json` key ordering depends on the `preserve_order` feature, which
//! any crate in the dependency graph may switch on. The hash must not care,
//! so serialization is done here with explicitly sorted keys.

use serde_json::Value;

/// Serialize a value as compact JSON with lexicographically sorted object
/// keys. Array order is preserved.
pub fn to_canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (index, key) in keys.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_scalar(out, &Value::String((*key).clone()));
                out.push(':');
                write_value(out, &map[*key]);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        scalar => write_scalar(out, scalar),
    }
}

fn write_scalar(out: &mut String, value: &Value) {
    // Scalars carry no ordering concerns; serde_json's formatting is
    // deterministic for strings, numbers, booleans and null.
    match serde_json::to_string(value) {
        Ok(text) => out.push_str(&text),
        // Unreachable for scalar JSON values.
        Err(_) => out.push_str("null"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keys_are_sorted_recursively() {
        let value = json!({"b": {"z": 1, "a": 2}, "a": [3, 1, 2]});
        assert_eq!(to_canonical_json(&value), r#"{"a":[3,1,2],"b":{"a":2,"z":1}}"#);
    }

    #[test]
    fn strings_are_escaped() {
        let value = json!({"text": "line\nbreak \"quoted\""});
        assert_eq!(
            to_canonical_json(&value),
            r#"{"text":"line\nbreak \"quoted\""}"#
        );
    }
}
