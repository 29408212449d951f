//! Lookup engines.
//!
//! An engine resolves a key path against the store the way an i18next-style
//! library does: an unresolved key is echoed back rather than reported.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::interpolate::{
    Params,
    interpolate,
};
use crate::store::ResourceStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Invalid key path '{0}'")]
    InvalidKeyPath(String),

    #[error("Lookup failed for '{key_path}': {message}")]
    Engine { key_path: String, message: String },
}

/// Resolves key paths against a [`ResourceStore`].
pub trait TranslationEngine: fmt::Debug {
    /// Scalar lookup with interpolation.
    ///
    /// Returns the key path itself when nothing resolves.
    fn translate(
        &self,
        store: &ResourceStore,
        locale: &str,
        key_path: &str,
        params: &Params,
    ) -> Result<String, LookupError>;

    /// Structured lookup ("return objects" mode): subtrees and arrays are
    /// returned as-is.
    ///
    /// Returns the key path as a string value when nothing resolves.
    fn translate_structured(
        &self,
        store: &ResourceStore,
        locale: &str,
        key_path: &str,
    ) -> Result<Value, LookupError>;
}

/// Default engine walking the store's trees directly.
#[derive(Debug, Clone)]
pub struct BundleEngine {
    /// Key-path separator
    key_separator: String,
}

impl BundleEngine {
    #[must_use]
    pub fn new(key_separator: &str) -> Self {
        Self { key_separator: key_separator.to_string() }
    }

    #[must_use]
    pub fn key_separator(&self) -> &str {
        &self.key_separator
    }

    /// Rejects empty paths and paths with empty segments.
    fn validate(&self, key_path: &str) -> Result<(), LookupError> {
        if key_path.is_empty()
            || self.key_separator.is_empty()
            || key_path.split(self.key_separator.as_str()).any(str::is_empty)
        {
            return Err(LookupError::InvalidKeyPath(key_path.to_string()));
        }
        Ok(())
    }

    /// Raw node at `key_path` in `locale`, if any.
    fn resolve<'a>(
        &self,
        store: &'a ResourceStore,
        locale: &str,
        key_path: &str,
    ) -> Option<&'a Value> {
        let Some(tree) = store.tree(locale) else {
            tracing::debug!(locale, "No translations loaded for locale");
            return None;
        };
        tree.get(key_path, &self.key_separator)
    }
}

impl Default for BundleEngine {
    fn default() -> Self {
        Self::new(".")
    }
}

impl TranslationEngine for BundleEngine {
    fn translate(
        &self,
        store: &ResourceStore,
        locale: &str,
        key_path: &str,
        params: &Params,
    ) -> Result<String, LookupError> {
        self.validate(key_path)?;

        let text = match self.resolve(store, locale, key_path) {
            Some(Value::String(text)) => interpolate(text, params),
            Some(Value::Number(number)) => number.to_string(),
            Some(Value::Bool(flag)) => flag.to_string(),
            Some(Value::Object(_) | Value::Array(_)) => {
                tracing::debug!(locale, key_path, "Key resolves to a structure, not a string");
                key_path.to_string()
            }
            Some(Value::Null) | None => key_path.to_string(),
        };
        Ok(text)
    }

    fn translate_structured(
        &self,
        store: &ResourceStore,
        locale: &str,
        key_path: &str,
    ) -> Result<Value, LookupError> {
        self.validate(key_path)?;

        Ok(self
            .resolve(store, locale, key_path)
            .cloned()
            .unwrap_or_else(|| Value::String(key_path.to_string())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::tree::TranslationTree;

    fn store() -> ResourceStore {
        let en = TranslationTree::from_value(json!({
            "common": {"hello": "Hello", "empty": "", "nothing": null},
            "faucet": {"claim": "Claim {amount} {{token}}", "limit": 3, "open": true},
            "team": {"members": [{"name": "Ada"}]}
        }))
        .unwrap();
        ResourceStore::from_trees([("en", en)])
    }

    #[rstest]
    #[case::string("common.hello", "Hello")]
    #[case::empty_string("common.empty", "")]
    #[case::interpolated("faucet.claim", "Claim 10 BSN")]
    #[case::number("faucet.limit", "3")]
    #[case::boolean("faucet.open", "true")]
    #[case::echo_missing("common.bye", "common.bye")]
    #[case::echo_null("common.nothing", "common.nothing")]
    #[case::echo_object("faucet", "faucet")]
    #[case::echo_array("team.members", "team.members")]
    fn translate_scalar(#[case] key_path: &str, #[case] expected: &str) {
        let engine = BundleEngine::default();
        let params = Params::new().with("amount", 10).with("token", "BSN");

        let result = engine.translate(&store(), "en", key_path, &params);

        assert_that!(result, ok(eq(expected)));
    }

    #[rstest]
    #[case::empty("")]
    #[case::leading_separator(".hello")]
    #[case::double_separator("common..hello")]
    fn translate_rejects_malformed_paths(#[case] key_path: &str) {
        let engine = BundleEngine::default();

        let result = engine.translate(&store(), "en", key_path, &Params::new());

        assert_eq!(result, Err(LookupError::InvalidKeyPath(key_path.to_string())));
    }

    #[googletest::test]
    fn translate_unloaded_locale_echoes_key() {
        let engine = BundleEngine::default();

        let result = engine.translate(&store(), "de", "common.hello", &Params::new());

        expect_that!(result, ok(eq("common.hello")));
    }

    #[googletest::test]
    fn translate_structured_returns_subtrees() {
        let engine = BundleEngine::default();

        let members = engine.translate_structured(&store(), "en", "team.members").unwrap();
        let missing = engine.translate_structured(&store(), "en", "team.roadmap").unwrap();

        assert_eq!(members, json!([{"name": "Ada"}]));
        assert_eq!(missing, json!("team.roadmap"));
    }

    #[googletest::test]
    fn custom_separator() {
        let engine = BundleEngine::new(":");

        let result = engine.translate(&store(), "en", "common:hello", &Params::new());

        expect_that!(result, ok(eq("Hello")));
        expect_that!(engine.key_separator(), eq(":"));
    }
}
