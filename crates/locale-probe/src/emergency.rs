//! Emergency-number parsing.

use serde_json::Value;

/// Accept a JSON array or prose. Every 2-4 digit integer substring counts,
/// in order of first appearance.
pub(crate) fn parse(value: &Value) -> Vec<String> {
    let mut numbers = Vec::new();

    match value {
        Value::Array(items) => {
            for item in items {
                let text = match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                collect_numbers(&text, &mut numbers);
            }
        }
        Value::String(text) => collect_numbers(text, &mut numbers),
        other => collect_numbers(&other.to_string(), &mut numbers),
    }

    numbers
}

fn collect_numbers(text: &str, numbers: &mut Vec<String>) {
    let mut run = String::new();

    for ch in text.chars().chain(std::iter::once(' ')) {
        if ch.is_ascii_digit() {
            run.push(ch);
            continue;
        }

        if (2..=4).contains(&run.len()) && !numbers.contains(&run) {
            numbers.push(run.clone());
        }
        run.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn arrays_and_prose_both_parse() {
        assert_eq!(parse(&json!(["112", "117"])), vec!["112", "117"]);
        assert_eq!(parse(&json!("call 112 or 110")), vec!["112", "110"]);
        assert_eq!(parse(&json!(911)), vec!["911"]);
    }

    #[test]
    fn order_of_first_appearance_is_kept() {
        assert_eq!(parse(&json!("999, then 112, then 999 again")), vec!["999", "112"]);
    }

    #[test]
    fn out_of_range_runs_are_dropped() {
        assert_eq!(parse(&json!("dial 5 or 12345")), Vec::<String>::new());
    }
}
