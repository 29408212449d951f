use std::collections::HashSet;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::locale::{
    Locale,
    LocaleError,
    Locales,
    TextDirection,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "locales[0].code")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid locale set: {0}")]
    Locale(#[from] LocaleError),
}

/// Renders collected validation errors as a numbered list.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One entry of the `locales` setting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleConfig {
    pub code: String,
    pub display_name: String,
    #[serde(default)]
    pub flag: String,
    #[serde(default)]
    pub direction: TextDirection,
}

impl From<&Locale> for LocaleConfig {
    fn from(locale: &Locale) -> Self {
        Self {
            code: locale.code.clone(),
            display_name: locale.display_name.clone(),
            flag: locale.flag.clone(),
            direction: locale.direction,
        }
    }
}

impl From<&LocaleConfig> for Locale {
    fn from(config: &LocaleConfig) -> Self {
        Self::new(&config.code, &config.display_name, &config.flag, config.direction)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nSettings {
    /// Root directory of the bundle files, relative to the workspace.
    pub locales_dir: String,

    /// Glob (relative to `locales_dir`) selecting bundle files.
    pub file_pattern: String,

    pub key_separator: String,

    /// Locale used when nothing else resolves.
    pub default_locale: String,

    /// Locale the completeness checker compares against.
    pub reference_locale: String,

    pub locales: Vec<LocaleConfig>,

    /// Single-line file acting as the persisted locale preference.
    /// If unset, the preference lives in memory only.
    pub preference_file: Option<String>,
}

impl I18nSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Duplicate locale code
    /// - Default or reference locale not among `locales`
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.locales_dir.is_empty() {
            errors.push(ValidationError::new(
                "localesDir",
                "The directory cannot be empty. Example: \"locales\"",
            ));
        }

        if self.file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "filePattern",
                "The pattern cannot be empty. Example: \"**/*.json\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.file_pattern) {
            errors.push(ValidationError::new(
                "filePattern",
                format!("Invalid glob pattern '{}': {e}", self.file_pattern),
            ));
        }

        if self.locales.is_empty() {
            errors.push(ValidationError::new(
                "locales",
                "At least one locale is required. Example: [{\"code\": \"en\", \"displayName\": \"English\"}]",
            ));
        }

        let mut seen = HashSet::new();
        for (index, locale) in self.locales.iter().enumerate() {
            if locale.code.is_empty() {
                errors.push(ValidationError::new(
                    format!("locales[{index}].code"),
                    "The locale code cannot be empty",
                ));
            } else if !seen.insert(locale.code.as_str()) {
                errors.push(ValidationError::new(
                    format!("locales[{index}].code"),
                    format!("Duplicate locale code '{}'", locale.code),
                ));
            }
        }

        if !self.locales.is_empty() {
            if !seen.contains(self.default_locale.as_str()) {
                errors.push(ValidationError::new(
                    "defaultLocale",
                    format!("'{}' is not one of the configured locales", self.default_locale),
                ));
            }
            if !seen.contains(self.reference_locale.as_str()) {
                errors.push(ValidationError::new(
                    "referenceLocale",
                    format!("'{}' is not one of the configured locales", self.reference_locale),
                ));
            }
        }

        if let Some(path) = &self.preference_file
            && path.is_empty()
        {
            errors.push(ValidationError::new(
                "preferenceFile",
                "The path cannot be empty. Please specify a file, or remove this field",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Builds the supported-locale registry described by these settings.
    ///
    /// # Errors
    /// Returns [`ConfigError::Locale`] if the default locale is not in the list.
    pub fn build_locales(&self) -> Result<Locales, ConfigError> {
        let locales = self.locales.iter().map(Locale::from).collect();
        Ok(Locales::new(locales, &self.default_locale)?)
    }
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            locales_dir: "locales".to_string(),
            file_pattern: "**/*.{json,jsonc}".to_string(),
            key_separator: ".".to_string(),
            default_locale: "en".to_string(),
            reference_locale: "en".to_string(),
            locales: Locales::builtin().iter().map(LocaleConfig::from).collect(),
            preference_file: None,
        }
    }
}
