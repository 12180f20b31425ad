//! JSON extraction from free-form model output.

/// Find the first balanced `{...}` object in a response, after stripping
/// markdown code fences. Returns the raw slice, unparsed.
pub(crate) fn first_json_object(text: &str) -> Option<String> {
    let defenced = strip_fences(text);
    balanced_object(&defenced)
}

/// Drop markdown fence lines (```` ``` ````, with or without a language tag)
/// while keeping their content.
fn strip_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scan for the first brace-balanced object, respecting JSON string
/// literals and escapes so that a `{` inside a quoted value does not
/// confuse the depth count.
fn balanced_object(text: &str) -> Option<String> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(text[start..end].to_owned());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_object_in_prose() {
        let text = "Sure! Here you go: {\"a\": 1} — hope that helps.";
        assert_eq!(first_json_object(text).as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn strips_code_fences() {
        let text = "```json\n{\"a\": {\"b\": 2}}\n```";
        assert_eq!(first_json_object(text).as_deref(), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = r#"{"note": "use {curly} braces", "n": 1}"#;
        assert_eq!(first_json_object(text).as_deref(), Some(text));
    }

    #[test]
    fn unbalanced_input_yields_none() {
        assert_eq!(first_json_object("{\"a\": 1"), None);
        assert_eq!(first_json_object("no json here"), None);
    }
}
