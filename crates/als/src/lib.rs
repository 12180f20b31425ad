//! Ambient Locale Signals.
//!
//! An ALS block is a short civic context snippet in the target country's
//! working language. It is delivered to the model as its own user turn so
//! that locale inference happens without contaminating the actual prompt,
//! and it must never name the country, a brand or anything industry-adjacent.

mod leak;
mod locales;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use leak::{LeakReport, detect_leak};

/// Hard upper bound on a block, in UTF-8 characters including newlines.
pub const MAX_BLOCK_CHARS: usize = 350;

/// System-prompt augmentation that permits silent locale adoption while
/// forbidding disclosure. Always appended after any template-specified
/// system instructions.
pub const ALS_SYSTEM_INSTRUCTION: &str = "You may use ambient context to infer locale and set \
     defaults. Do not mention, cite, or acknowledge ambient context or any location inference.";

/// Countries with an authored ALS template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locale {
    De,
    Ch,
    Us,
    Gb,
    Ae,
    Sg,
    It,
    Fr,
}

impl Locale {
    /// All supported locales, in the order they were introduced.
    pub const ALL: [Locale; 8] = [
        Locale::De,
        Locale::Ch,
        Locale::Us,
        Locale::Gb,
        Locale::Ae,
        Locale::Sg,
        Locale::It,
        Locale::Fr,
    ];

    /// ISO-3166 alpha-2 code.
    pub fn code(&self) -> &'static str {
        match self {
            Locale::De => "DE",
            Locale::Ch => "CH",
            Locale::Us => "US",
            Locale::Gb => "GB",
            Locale::Ae => "AE",
            Locale::Sg => "SG",
            Locale::It => "IT",
            Locale::Fr => "FR",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = AlsError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim().to_uppercase().as_str() {
            "DE" => Ok(Locale::De),
            "CH" => Ok(Locale::Ch),
            "US" => Ok(Locale::Us),
            "GB" | "UK" => Ok(Locale::Gb),
            "AE" => Ok(Locale::Ae),
            "SG" => Ok(Locale::Sg),
            "IT" => Ok(Locale::It),
            "FR" => Ok(Locale::Fr),
            other => Err(AlsError::UnsupportedCountry(other.to_owned())),
        }
    }
}

impl TryFrom<String> for Locale {
    type Error = AlsError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.code().to_owned()
    }
}

#[derive(Debug, Error)]
pub enum AlsError {
    #[error("no ALS template for country '{0}'")]
    UnsupportedCountry(String),

    #[error("ALS block for {locale} is {chars} chars, over the 350 limit")]
    BlockTooLong { locale: Locale, chars: usize },
}

/// A rendered civic context block. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlsBlock {
    pub locale: Locale,
    pub text: String,
}

impl AlsBlock {
    pub fn chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Build the block for a locale using the current wall clock.
pub fn build_block(locale: Locale) -> Result<AlsBlock, AlsError> {
    build_block_at(locale, Utc::now())
}

/// Build the block for a locale at an explicit instant.
pub fn build_block_at(locale: Locale, now: DateTime<Utc>) -> Result<AlsBlock, AlsError> {
    let template = locales::civic_template(locale);

    let offset = FixedOffset::east_opt(template.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    let local = now.with_timezone(&offset);

    let timestamp = format!(
        "{} ({})",
        local.format("%Y-%m-%d %H:%M"),
        local.format("UTC%:z")
    );

    let mut lines = vec![
        format!("{} {timestamp}", template.time_label),
        template.portal_host.to_owned(),
        template.civic_phrase.to_owned(),
        format!(
            "{} · {} · {}",
            template.postal_sample, template.phone_sample, template.currency_sample
        ),
    ];

    if let Some(weather) = template.weather_stub {
        lines.push(weather.to_owned());
    }

    lines.push(template.agency.to_owned());

    let text = lines.join("\n");
    let chars = text.chars().count();

    if chars > MAX_BLOCK_CHARS {
        return Err(AlsError::BlockTooLong { locale, chars });
    }

    Ok(AlsBlock { locale, text })
}

/// Combine template system instructions with the ALS augmentation. The ALS
/// instruction always comes last.
pub fn compose_system_text(template_instructions: &str) -> String {
    let trimmed = template_instructions.trim();

    if trimmed.is_empty() {
        ALS_SYSTEM_INSTRUCTION.to_owned()
    } else {
        format!("{trimmed}\n\n{ALS_SYSTEM_INSTRUCTION}")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 12, 30, 0).single().unwrap()
    }

    #[test]
    fn every_locale_fits_the_budget() {
        for locale in Locale::ALL {
            let block = build_block_at(locale, fixed_now()).unwrap();
            assert!(
                block.chars() <= MAX_BLOCK_CHARS,
                "{locale} block is {} chars",
                block.chars()
            );
        }
    }

    #[test]
    fn blocks_never_name_the_country() {
        let forbidden = [
            "Germany",
            "Deutschland",
            "Switzerland",
            "Schweiz",
            "United States",
            "America",
            "United Kingdom",
            "Britain",
            "Emirates",
            "Singapore",
            "Italia",
            "Italy",
            "France",
        ];

        for locale in Locale::ALL {
            let block = build_block_at(locale, fixed_now()).unwrap();
            let lowered = block.text.to_lowercase();
            for name in forbidden {
                assert!(
                    !lowered.contains(&name.to_lowercase()),
                    "{locale} block leaks '{name}'"
                );
            }
        }
    }

    #[test]
    fn timestamp_carries_the_local_offset() {
        let block = build_block_at(Locale::De, fixed_now()).unwrap();
        assert!(block.text.contains("UTC+01:00"));

        let block = build_block_at(Locale::Sg, fixed_now()).unwrap();
        assert!(block.text.contains("UTC+08:00"));
    }

    #[test]
    fn uk_alias_parses_to_gb() {
        assert_eq!("UK".parse::<Locale>().unwrap(), Locale::Gb);
        assert_eq!("gb".parse::<Locale>().unwrap(), Locale::Gb);
    }

    #[test]
    fn unsupported_country_is_rejected() {
        assert!(matches!(
            "BR".parse::<Locale>(),
            Err(AlsError::UnsupportedCountry(_))
        ));
    }

    #[test]
    fn als_instruction_is_appended_last() {
        let combined = compose_system_text("Answer tersely.");
        assert!(combined.starts_with("Answer tersely."));
        assert!(combined.ends_with(ALS_SYSTEM_INSTRUCTION));

        assert_eq!(compose_system_text("  "), ALS_SYSTEM_INSTRUCTION);
    }
}
