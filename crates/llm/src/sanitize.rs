//! Logging-boundary text sanitization.
//!
//! Some providers return code points that non-UTF-8 log sinks cannot
//! encode. The fixed list below is mapped to ASCII-safe equivalents when
//! text is about to be logged. Persisted payloads are never mutated.

const REPLACEMENTS: &[(char, &str)] = &[
    ('İ', "I"),
    ('ı', "i"),
    ('Ş', "S"),
    ('ş', "s"),
    ('Ğ', "G"),
    ('ğ', "g"),
];

/// Replace the known-problematic code points for log output.
pub fn sanitize_for_log(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => out.push_str(to),
            None => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turkish_dotted_and_dotless_i_are_mapped() {
        assert_eq!(sanitize_for_log("İstanbul ışık"), "Istanbul isik");
    }

    #[test]
    fn other_text_passes_through() {
        assert_eq!(sanitize_for_log("Zürich façade 東京"), "Zürich façade 東京");
    }
}
