//! Supported locales and language-tag negotiation.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// Writing direction of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    /// Value for the HTML `dir` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

impl fmt::Display for TextDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supported language identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    pub code: String,
    pub display_name: String,
    pub flag: String,
    pub direction: TextDirection,
}

impl Locale {
    #[must_use]
    pub fn new(code: &str, display_name: &str, flag: &str, direction: TextDirection) -> Self {
        Self {
            code: code.to_string(),
            display_name: display_name.to_string(),
            flag: flag.to_string(),
            direction,
        }
    }

    #[must_use]
    pub fn is_rtl(&self) -> bool {
        self.direction == TextDirection::Rtl
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocaleError {
    #[error("Default locale '{0}' is not among the supported locales")]
    UnknownDefault(String),
}

/// The fixed set of supported locales plus the designated default.
///
/// Construction guarantees the default is a member, so [`Locales::default_locale`]
/// is infallible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locales {
    /// Supported locales in declaration order
    entries: Vec<Locale>,
    /// Position of the default locale in `entries`
    default_index: usize,
}

impl Locales {
    /// # Errors
    /// Returns [`LocaleError::UnknownDefault`] when `default_code` is not in `entries`.
    pub fn new(entries: Vec<Locale>, default_code: &str) -> Result<Self, LocaleError> {
        let default_index = entries
            .iter()
            .position(|locale| locale.code == default_code)
            .ok_or_else(|| LocaleError::UnknownDefault(default_code.to_string()))?;
        Ok(Self { entries, default_index })
    }

    /// The seven locales shipped with the site, English as default.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = vec![
            Locale::new("de", "Deutsch", "🇩🇪", TextDirection::Ltr),
            Locale::new("en", "English", "🇬🇧", TextDirection::Ltr),
            Locale::new("es", "Español", "🇪🇸", TextDirection::Ltr),
            Locale::new("ru", "Русский", "🇷🇺", TextDirection::Ltr),
            Locale::new("ja", "日本語", "🇯🇵", TextDirection::Ltr),
            Locale::new("tr", "Türkçe", "🇹🇷", TextDirection::Ltr),
            Locale::new("zh", "中文", "🇨🇳", TextDirection::Ltr),
        ];
        Self { entries, default_index: 1 }
    }

    #[must_use]
    pub fn default_locale(&self) -> &Locale {
        // default_index is validated on construction
        #[allow(clippy::indexing_slicing)]
        &self.entries[self.default_index]
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Locale> {
        self.entries.iter().find(|locale| locale.code == code)
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locale> {
        self.entries.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|locale| locale.code.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matches a browser or environment language tag against the supported set.
    ///
    /// Case-insensitive, `_` is treated as `-`, encodings and modifiers
    /// (`de_DE.UTF-8@euro`) are ignored. An exact code match wins over a
    /// primary-subtag match (`de-AT` → `de`).
    #[must_use]
    pub fn negotiate(&self, tag: &str) -> Option<&Locale> {
        let tag = normalize_tag(tag);
        if tag.is_empty() {
            return None;
        }

        if let Some(locale) = self.entries.iter().find(|l| normalize_tag(&l.code) == tag) {
            return Some(locale);
        }

        let primary = tag.split('-').next().unwrap_or_default();
        self.entries.iter().find(|l| normalize_tag(&l.code) == primary)
    }
}

impl Default for Locales {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Lowercases a language tag, drops encoding/modifier and uses `-` separators.
fn normalize_tag(tag: &str) -> String {
    let tag = tag.trim();
    let tag = tag.split(['.', '@']).next().unwrap_or_default();
    tag.to_lowercase().replace('_', "-")
}
