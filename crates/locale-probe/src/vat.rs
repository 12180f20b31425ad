//! VAT normalization.

use serde_json::Value;

use crate::expectations::CountryExpectation;

/// Tax-name tokens stripped before numeric interpretation.
const TAX_TOKENS: &[&str] = &["TVA", "VAT", "GST", "IVA", "MWST", "BTW"];

/// Spellings accepted as "no federal VAT" where that is the expectation.
const NO_VAT_SPELLINGS: &[&str] = &["none", "no", "n/a", "na", "null", "0", "0%", "no federal vat"];

pub(crate) fn normalize(value: &Value, expectation: &CountryExpectation) -> String {
    let raw = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    };

    if expectation.vat == "no federal VAT" {
        let lowered = raw.trim().to_lowercase();
        if NO_VAT_SPELLINGS.contains(&lowered.as_str()) {
            return "no federal VAT".to_owned();
        }
    }

    let mut cleaned = raw.replace(',', ".");

    for token in TAX_TOKENS {
        cleaned = strip_token(&cleaned, token);
    }

    cleaned = cleaned.replace(':', "");
    cleaned.retain(|ch| !ch.is_whitespace());

    // Re-print numerics so "19", "19.0" and "19 %" all land on "19%".
    if let Ok(number) = cleaned.parse::<f64>() {
        return format!("{number}%");
    }

    if let Some(prefix) = cleaned.strip_suffix('%')
        && let Ok(number) = prefix.parse::<f64>()
    {
        return format!("{number}%");
    }

    cleaned
}

/// Remove every ASCII-case-insensitive occurrence of a token. Tokens are
/// ASCII, so byte-wise matching keeps multi-byte input intact.
fn strip_token(text: &str, token: &str) -> String {
    let bytes = text.as_bytes();
    let token_bytes = token.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());

    let mut index = 0;
    while index < bytes.len() {
        if index + token_bytes.len() <= bytes.len()
            && bytes[index..index + token_bytes.len()].eq_ignore_ascii_case(token_bytes)
        {
            index += token_bytes.len();
        } else {
            out.push(bytes[index]);
            index += 1;
        }
    }

    String::from_utf8(out).unwrap_or_else(|_| text.to_owned())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::expectations::expectation_for;

    #[test]
    fn comma_decimal_and_label_noise_normalize() {
        let ch = expectation_for("CH").unwrap();

        assert_eq!(normalize(&json!("8,1%"), ch), "8.1%");
        assert_eq!(normalize(&json!("MwSt: 8.1 %"), ch), "8.1%");
        assert_eq!(normalize(&json!("8.10%"), ch), "8.1%");
    }

    #[test]
    fn bare_numbers_gain_a_percent_sign() {
        let de = expectation_for("DE").unwrap();

        assert_eq!(normalize(&json!("19"), de), "19%");
        assert_eq!(normalize(&json!(19), de), "19%");
        assert_eq!(normalize(&json!(19.0), de), "19%");
    }

    #[test]
    fn us_no_vat_spellings_collapse() {
        let us = expectation_for("US").unwrap();

        for spelling in ["none", "NO", "n/a", "0", "0%", "no federal VAT"] {
            assert_eq!(normalize(&json!(spelling), us), "no federal VAT");
        }
    }

    #[test]
    fn us_spellings_do_not_leak_into_other_countries() {
        let de = expectation_for("DE").unwrap();
        assert_eq!(normalize(&json!("none"), de), "none");
    }
}
