//! Per-country expected civic values.

/// Acceptable values for one country's locale probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryExpectation {
    pub code: &'static str,
    /// Canonical VAT string after normalization.
    pub vat: &'static str,
    /// Acceptable plug letters; the response set must be a non-empty
    /// subset of these.
    pub plugs: &'static [&'static str],
    /// The response must contain at least one of these numbers.
    pub emergency_any: &'static [&'static str],
}

const EXPECTATIONS: &[CountryExpectation] = &[
    CountryExpectation {
        code: "DE",
        vat: "19%",
        plugs: &["F", "C"],
        emergency_any: &["112"],
    },
    CountryExpectation {
        code: "CH",
        vat: "8.1%",
        plugs: &["J", "C"],
        emergency_any: &["112"],
    },
    CountryExpectation {
        code: "FR",
        vat: "20%",
        plugs: &["E", "F", "C"],
        emergency_any: &["112"],
    },
    CountryExpectation {
        code: "IT",
        vat: "22%",
        plugs: &["L", "F", "C"],
        emergency_any: &["112"],
    },
    CountryExpectation {
        code: "US",
        vat: "no federal VAT",
        plugs: &["A", "B"],
        emergency_any: &["911"],
    },
    CountryExpectation {
        code: "GB",
        vat: "20%",
        plugs: &["G"],
        emergency_any: &["999", "112"],
    },
    CountryExpectation {
        code: "AE",
        vat: "5%",
        plugs: &["G", "C", "D"],
        emergency_any: &["999", "112"],
    },
    CountryExpectation {
        code: "SG",
        vat: "9%",
        plugs: &["G"],
        emergency_any: &["999", "995"],
    },
];

/// Expectation for an ISO-3166 alpha-2 code; `UK` aliases to `GB`.
pub fn expectation_for(country: &str) -> Option<&'static CountryExpectation> {
    let upper = country.trim().to_uppercase();
    let code = match upper.as_str() {
        "UK" => "GB",
        other => other,
    };

    EXPECTATIONS.iter().find(|expectation| expectation.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_eight_countries_are_present() {
        for code in ["DE", "CH", "FR", "IT", "US", "GB", "AE", "SG"] {
            assert!(expectation_for(code).is_some(), "missing {code}");
        }
    }

    #[test]
    fn uk_aliases_to_gb() {
        assert_eq!(expectation_for("uk").map(|e| e.code), Some("GB"));
    }
}
