//! Post-response leak detection.
//!
//! A response leaks the ambient block when it echoes any bigram or trigram
//! from the block text, or names the target country in any language the
//! supported locales are authored in.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Country names across the supported working languages. Matching is
/// word-bounded and case-insensitive, so "American" does not trip "America".
const COUNTRY_NAMES: &[&str] = &[
    "Germany",
    "Deutschland",
    "Allemagne",
    "Germania",
    "ألمانيا",
    "Switzerland",
    "Schweiz",
    "Suisse",
    "Svizzera",
    "سويسرا",
    "United States",
    "USA",
    "America",
    "Vereinigte Staaten",
    "États-Unis",
    "Stati Uniti",
    "الولايات المتحدة",
    "United Kingdom",
    "Britain",
    "Großbritannien",
    "Royaume-Uni",
    "Regno Unito",
    "المملكة المتحدة",
    "بريطانيا",
    "United Arab Emirates",
    "Emirates",
    "Vereinigte Arabische Emirate",
    "Émirats arabes unis",
    "Emirati Arabi Uniti",
    "الإمارات",
    "Singapore",
    "Singapur",
    "Singapour",
    "سنغافورة",
    "Italy",
    "Italien",
    "Italie",
    "Italia",
    "إيطاليا",
    "France",
    "Frankreich",
    "Francia",
    "فرنسا",
];

static COUNTRY_NAME_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let alternation = COUNTRY_NAMES
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).ok()
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakReport {
    pub leak_detected: bool,
    /// The offending block n-grams and country names, deduplicated.
    pub phrases: Vec<String>,
}

/// Scan a model response against the block it was shown.
pub fn detect_leak(block_text: &str, response_text: &str) -> LeakReport {
    let mut phrases = BTreeSet::new();

    let block_ngrams = ngrams(block_text);
    let response_ngrams: BTreeSet<String> = ngrams(response_text).into_iter().collect();

    for ngram in block_ngrams {
        if response_ngrams.contains(&ngram) {
            phrases.insert(ngram);
        }
    }

    if let Some(pattern) = COUNTRY_NAME_PATTERN.as_ref() {
        for hit in pattern.find_iter(response_text) {
            phrases.insert(hit.as_str().to_owned());
        }
    }

    LeakReport {
        leak_detected: !phrases.is_empty(),
        phrases: phrases.into_iter().collect(),
    }
}

/// Lowercased word bigrams and trigrams of a text.
fn ngrams(text: &str) -> Vec<String> {
    let tokens: Vec<String> = text
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut grams = Vec::new();

    for window in tokens.windows(2) {
        grams.push(window.join(" "));
    }
    for window in tokens.windows(3) {
        grams.push(window.join(" "));
    }

    grams
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "Lokale Zeit: 2025-06-02 13:30 (UTC+01:00)\nbund.de\nTermin beim Bürgeramt online vereinbaren\n10115 · +49 30 3901820 · 24,90 €";

    #[test]
    fn echoed_trigram_is_detected() {
        let report = detect_leak(BLOCK, "Sie können einen Termin beim Bürgeramt buchen.");

        assert!(report.leak_detected);
        assert!(report.phrases.iter().any(|p| p == "termin beim bürgeramt"));
    }

    #[test]
    fn country_name_is_detected_in_any_supported_language() {
        let report = detect_leak(BLOCK, "This pricing applies in Deutschland only.");
        assert!(report.leak_detected);
        assert!(report.phrases.contains(&"Deutschland".to_owned()));

        let report = detect_leak(BLOCK, "Les tarifs en Allemagne varient.");
        assert!(report.leak_detected);
    }

    #[test]
    fn clean_response_passes() {
        let report = detect_leak(BLOCK, "The VAT rate is 19% and plugs are type F.");

        assert!(!report.leak_detected);
        assert!(report.phrases.is_empty());
    }

    #[test]
    fn partial_word_does_not_trip_country_scan() {
        let report = detect_leak(BLOCK, "An American-style plug will not fit.");
        assert!(!report.leak_detected);
    }
}
