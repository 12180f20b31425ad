//! Plug-type parsing.

use serde_json::Value;

/// Plug standard names mapped to their letter. Matched before splitting,
/// since several standard names contain the separator characters
/// themselves ("CEE 7/4", "NEMA 5-15").
const STANDARDS: &[(&str, &str)] = &[
    ("BS 1363", "G"),
    ("CEE 7/4", "F"),
    ("CEE 7/5", "E"),
    ("CEE 7/6", "E"),
    ("SCHUKO", "F"),
    ("EUROPLUG", "C"),
    ("NEMA 1-15", "A"),
    ("NEMA 5-15", "B"),
    ("SEV 1011", "J"),
    ("CEI 23-50", "L"),
];

/// Prefix words dropped from tokens.
const PREFIXES: &[&str] = &["TYPE", "TYP", "TIPO"];

/// Conjunction words treated as separators.
const CONJUNCTIONS: &[&str] = &["AND", "ET", "Y"];

/// Accept either a JSON array of letters/names or a free-form string.
/// Returns uppercase plug letters, deduplicated, in order of appearance.
pub(crate) fn parse(value: &Value) -> Vec<String> {
    let mut letters = Vec::new();

    match value {
        Value::Array(items) => {
            for item in items {
                let text = match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                collect_letters(&text, &mut letters);
            }
        }
        Value::String(text) => collect_letters(text, &mut letters),
        other => collect_letters(&other.to_string(), &mut letters),
    }

    letters
}

fn collect_letters(text: &str, letters: &mut Vec<String>) {
    let mut upper = text.to_uppercase();

    for (name, letter) in STANDARDS {
        upper = upper.replace(name, &format!(" {letter} "));
    }

    for separator in ['/', ',', ';', '•'] {
        upper = upper.replace(separator, " ");
    }

    for word in upper.split_whitespace() {
        let token: String = word
            .trim_matches(|ch: char| !ch.is_alphanumeric())
            .to_owned();

        if token.is_empty()
            || PREFIXES.contains(&token.as_str())
            || CONJUNCTIONS.contains(&token.as_str())
        {
            continue;
        }

        if let Some(letter) = plug_letter(&token)
            && !letters.contains(&letter)
        {
            letters.push(letter);
        }
    }
}

/// A token is a plug letter when it is a single character in A..=N.
fn plug_letter(token: &str) -> Option<String> {
    let mut chars = token.chars();
    let first = chars.next()?;

    if chars.next().is_none() && first.is_ascii_uppercase() && ('A'..='N').contains(&first) {
        return Some(first.to_string());
    }

    None
}
