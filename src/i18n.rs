use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selectable translation target.
///
/// The fixed set offered by the translation control. Detection itself may
/// return any tag the provider knows; only targets are restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    En,
    Pt,
    Es,
    Ru,
    Tr,
    Fr,
}

impl TargetLanguage {
    /// All targets in menu order.
    pub const ALL: [TargetLanguage; 6] = [
        Self::En,
        Self::Pt,
        Self::Es,
        Self::Ru,
        Self::Tr,
        Self::Fr,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Pt => "pt",
            Self::Es => "es",
            Self::Ru => "ru",
            Self::Tr => "tr",
            Self::Fr => "fr",
        }
    }

    /// Parse a language tag. Region subtags are ignored (`pt-BR` → `Pt`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = primary_subtag(tag);
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(primary))
    }

    /// Whether a detected tag names this language.
    pub fn matches(self, tag: &str) -> bool {
        Self::from_tag(tag) == Some(self)
    }

    /// English display name.
    pub fn display_name(self) -> String {
        display_name(self.code())
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unsupported target code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported target language '{0}' (expected one of: en, pt, es, ru, tr, fr)")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for TargetLanguage {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s.trim()).ok_or_else(|| UnsupportedLanguage(s.trim().to_string()))
    }
}

/// `en-US` → `en`
fn primary_subtag(tag: &str) -> &str {
    tag.trim().split(['-', '_']).next().unwrap_or("")
}

/// Resolve a language tag to an ISO 639 entry (two- or three-letter codes).
pub fn lookup(tag: &str) -> Option<isolang::Language> {
    let primary = primary_subtag(tag).to_ascii_lowercase();
    match primary.len() {
        2 => isolang::Language::from_639_1(&primary),
        3 => isolang::Language::from_639_3(&primary),
        _ => None,
    }
}

/// Human-readable English name for a tag; unknown tags are returned as-is.
pub fn display_name(tag: &str) -> String {
    lookup(tag)
        .map(|lang| lang.to_name().to_string())
        .unwrap_or_else(|| tag.trim().to_string())
}

/// Normalize a tag to its ISO 639-1 code when one exists (`eng` → `en`).
pub fn normalize_tag(tag: &str) -> String {
    lookup(tag)
        .and_then(|lang| lang.to_639_1())
        .map(str::to_string)
        .unwrap_or_else(|| tag.trim().to_ascii_lowercase())
}
