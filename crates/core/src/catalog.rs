//! Instruction and label catalog.
//!
//! The catalog maps `(language, mode)` to the system instruction sent to the
//! model and `language` to the set of UI labels. It is built once at startup,
//! validated for completeness, and read-only afterwards, so a missing entry is
//! caught before any analysis run rather than halfway through one.
//!
//! # Example
//!
//! ```ignore
//! use smashpass_core::catalog::{Catalog, Language, Mode};
//!
//! let catalog = Catalog::builtin();
//! let prompt = catalog.lookup_instruction(Mode::Concise, Language::English);
//! assert!(prompt.is_some());
//! ```

mod builtin;

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Analysis verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Concise,
    Detailed,
    Comprehensive,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Concise, Mode::Detailed, Mode::Comprehensive];

    /// English display title, also used as the canonical name.
    pub fn title(&self) -> &'static str {
        match self {
            Mode::Concise => "Concise",
            Mode::Detailed => "Detailed",
            Mode::Comprehensive => "Comprehensive",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.title().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::UnknownChoice {
                axis: "mode",
                value: s.to_string(),
            })
    }
}

/// UI language. Also selects the language the model is asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Chinese];

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" | "en-us" | "en-gb" => Ok(Language::English),
            "zh" | "chinese" | "zh-cn" | "zh-hans" => Ok(Language::Chinese),
            _ => Err(AppError::UnknownChoice {
                axis: "language",
                value: s.to_string(),
            }),
        }
    }
}

/// Label shown next to the numeric score for an inclusive score range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBand {
    pub min: u8,
    pub max: u8,
    pub label: String,
}

/// UI strings for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    pub title: String,
    pub subtitle: String,
    pub analyze_button: String,
    pub analyzing_button: String,
    pub loading_text: String,
    pub error_prefix: String,
    pub api_key_invalid_error: String,
    pub model_error: String,
    /// Template with a `{mode}` placeholder.
    pub prompt_error: String,
    pub api_key_missing_error: String,
    pub verdict_label: String,
    pub score_label: String,
    pub explanation_label: String,
    pub mode_titles: BTreeMap<Mode, String>,
    pub rating_bands: Vec<RatingBand>,
}

impl LabelSet {
    /// Localized title for a mode, falling back to the English name.
    pub fn mode_title(&self, mode: Mode) -> &str {
        self.mode_titles
            .get(&mode)
            .map(String::as_str)
            .unwrap_or_else(|| mode.title())
    }

    pub fn prompt_error(&self, mode: Mode) -> String {
        self.prompt_error.replace("{mode}", self.mode_title(mode))
    }

    /// Band label for a score, or an empty string if no band covers it.
    pub fn rating_label(&self, score: u8) -> &str {
        self.rating_bands
            .iter()
            .find(|band| (band.min..=band.max).contains(&score))
            .map(|band| band.label.as_str())
            .unwrap_or("")
    }

    fn validate(&self, language: Language) -> Result<()> {
        for mode in Mode::ALL {
            if !self.mode_titles.contains_key(&mode) {
                return Err(AppError::catalog(format!(
                    "labels for '{}' have no title for mode {}",
                    language, mode
                )));
            }
        }
        for score in 1..=10u8 {
            if self.rating_label(score).is_empty() {
                return Err(AppError::catalog(format!(
                    "labels for '{}' have no rating band covering {}",
                    language, score
                )));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawCatalog {
    instructions: BTreeMap<Language, BTreeMap<Mode, String>>,
    labels: BTreeMap<Language, LabelSet>,
}

/// Read-only lookup of instruction text and UI labels.
///
/// Every constructor validates completeness: each language has a label set and
/// an instruction for every mode. [`Catalog::labels`] relies on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct Catalog {
    instructions: BTreeMap<Language, BTreeMap<Mode, String>>,
    labels: BTreeMap<Language, LabelSet>,
}

impl TryFrom<RawCatalog> for Catalog {
    type Error = AppError;

    fn try_from(raw: RawCatalog) -> Result<Self> {
        let catalog = Catalog {
            instructions: raw.instructions,
            labels: raw.labels,
        };
        catalog.validate()?;
        Ok(catalog)
    }
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        builtin::catalog()
    }

    /// Parses and validates a catalog from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a replacement catalog from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Instruction text for `(mode, language)`, or `None` if absent or blank.
    pub fn lookup_instruction(&self, mode: Mode, language: Language) -> Option<&str> {
        self.instructions
            .get(&language)
            .and_then(|modes| modes.get(&mode))
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }

    /// Labels for a language.
    pub fn labels(&self, language: Language) -> &LabelSet {
        &self.labels[&language]
    }

    /// Builds a catalog that skipped validation, for exercising lookups of
    /// absent entries.
    #[cfg(test)]
    pub(crate) fn unvalidated_from_value(value: serde_json::Value) -> Self {
        let raw: RawCatalog = serde_json::from_value(value).expect("raw catalog shape");
        Catalog {
            instructions: raw.instructions,
            labels: raw.labels,
        }
    }

    fn validate(&self) -> Result<()> {
        for language in Language::ALL {
            let labels = self.labels.get(&language).ok_or_else(|| {
                AppError::catalog(format!("no labels for language '{}'", language))
            })?;
            labels.validate(language)?;

            for mode in Mode::ALL {
                if self.lookup_instruction(mode, language).is_none() {
                    return Err(AppError::catalog(format!(
                        "no instruction for mode {} in language '{}'",
                        mode, language
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_is_complete() {
        let catalog = Catalog::builtin();
        assert!(catalog.validate().is_ok());
        for language in Language::ALL {
            for mode in Mode::ALL {
                assert!(catalog.lookup_instruction(mode, language).is_some());
            }
        }
    }

    #[test]
    fn test_rating_labels_cover_all_scores() {
        let catalog = Catalog::builtin();
        let en = catalog.labels(Language::English);
        assert_eq!(en.rating_label(1), en.rating_label(2));
        assert_ne!(en.rating_label(2), en.rating_label(3));
        assert_eq!(en.rating_label(0), "");
        assert_eq!(en.rating_label(11), "");
    }

    #[test]
    fn test_parse_choices() {
        assert_eq!("detailed".parse::<Mode>().unwrap(), Mode::Detailed);
        assert_eq!(" COMPREHENSIVE ".parse::<Mode>().unwrap(), Mode::Comprehensive);
        assert!("verbose".parse::<Mode>().is_err());

        assert_eq!("zh-CN".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_json_round_trip_validates() {
        let catalog = Catalog::builtin();
        let json = serde_json::to_string(&catalog).unwrap();
        let reloaded = Catalog::from_json_str(&json).unwrap();
        assert_eq!(
            reloaded.lookup_instruction(Mode::Comprehensive, Language::Chinese),
            catalog.lookup_instruction(Mode::Comprehensive, Language::Chinese)
        );
    }

    #[test]
    fn test_incomplete_catalog_is_rejected() {
        let mut value = serde_json::to_value(Catalog::builtin()).unwrap();
        value["instructions"]["zh"]
            .as_object_mut()
            .unwrap()
            .remove("detailed");

        let err = Catalog::from_json_str(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("detailed") || err.to_string().contains("Detailed"));
    }

    #[test]
    fn test_blank_instruction_counts_as_absent() {
        let mut value = serde_json::to_value(Catalog::builtin()).unwrap();
        value["instructions"]["en"]["concise"] = serde_json::json!("   ");
        assert!(Catalog::from_json_str(&value.to_string()).is_err());
    }

    #[test]
    fn test_prompt_error_uses_localized_title() {
        let catalog = Catalog::builtin();
        let zh = catalog.labels(Language::Chinese);
        let msg = zh.prompt_error(Mode::Detailed);
        assert!(msg.contains(zh.mode_title(Mode::Detailed)));
        assert!(!msg.contains("{mode}"));
    }
}
