//! Translation service: the surface the UI layer talks to.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::engine::{
    BundleEngine,
    TranslationEngine,
};
use crate::env::Environment;
use crate::interpolate::Params;
use crate::locale::{
    Locale,
    Locales,
};
use crate::resolver::{
    self,
    ResolvedLocale,
};
use crate::store::ResourceStore;

/// What [`TranslationService::synchronize_on_load`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The URL had no locale segment; this code was inserted.
    InsertedSegment(String),
    /// The URL carried a different locale; the service switched to it.
    AdoptedUrlLocale(String),
    /// URL and active locale already agreed.
    AlreadySynchronized,
}

/// Active locale plus total lookups against a [`ResourceStore`].
///
/// Lookups never fail: every miss, echo or engine error degrades to the
/// caller's fallback.
#[derive(Debug)]
pub struct TranslationService {
    /// Supported locales
    locales: Locales,
    /// Loaded trees; may be empty while loading
    store: ResourceStore,
    /// Lookup engine
    engine: Box<dyn TranslationEngine>,
    /// Host seams
    env: Environment,
    /// Separator used by the manual walk in `translate_object`
    key_separator: String,
    /// Code of the active locale
    active: String,
}

impl TranslationService {
    /// Creates a service and picks the initial locale from the environment.
    #[must_use]
    pub fn new(locales: Locales, store: ResourceStore, env: Environment) -> Self {
        let mut service = Self {
            locales,
            store,
            engine: Box::new(BundleEngine::default()),
            env,
            key_separator: ".".to_string(),
            active: String::new(),
        };
        let resolved = service.resolve();
        tracing::debug!(locale = %resolved.locale.code, source = %resolved.source, "Initial locale");
        service.active = resolved.locale.code.clone();
        service
    }

    /// Switches the key separator; also resets the engine to a
    /// [`BundleEngine`] using it.
    #[must_use]
    pub fn with_key_separator(mut self, key_separator: &str) -> Self {
        key_separator.clone_into(&mut self.key_separator);
        self.engine = Box::new(BundleEngine::new(key_separator));
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: impl TranslationEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Scalar lookup in the active locale.
    ///
    /// Returns `fallback` for an empty key, a lookup error, an echoed key or
    /// an empty result.
    #[must_use]
    pub fn translate(&self, key_path: &str, fallback: &str, params: &Params) -> String {
        if key_path.is_empty() {
            return fallback.to_string();
        }

        match self.engine.translate(&self.store, &self.active, key_path, params) {
            Ok(text) if text == key_path => {
                tracing::debug!(locale = %self.active, key_path, "Missing translation, using fallback");
                fallback.to_string()
            }
            Ok(text) if text.is_empty() => {
                tracing::debug!(locale = %self.active, key_path, "Empty translation, using fallback");
                fallback.to_string()
            }
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(locale = %self.active, "Lookup failed, using fallback: {err}");
                fallback.to_string()
            }
        }
    }

    /// Structured lookup in the active locale.
    ///
    /// Tries the engine's structured mode first, then walks the active tree
    /// by hand. Anything that does not resolve to a non-null value
    /// deserializable as `T` yields `fallback`.
    #[must_use]
    pub fn translate_object<T: DeserializeOwned>(&self, key_path: &str, fallback: T) -> T {
        if key_path.is_empty() {
            return fallback;
        }

        match self.engine.translate_structured(&self.store, &self.active, key_path) {
            Ok(Value::Null) => {}
            Ok(Value::String(echo)) if echo == key_path => {}
            Ok(value) => match serde_json::from_value(value) {
                Ok(resolved) => return resolved,
                Err(err) => {
                    tracing::debug!(key_path, "Structured lookup has an unexpected shape: {err}");
                }
            },
            Err(err) => tracing::debug!(key_path, "Structured lookup failed: {err}"),
        }

        let walked = self
            .store
            .tree(&self.active)
            .and_then(|tree| tree.get(key_path, &self.key_separator))
            .filter(|value| !value.is_null());
        if let Some(value) = walked {
            match T::deserialize(value) {
                Ok(resolved) => return resolved,
                Err(err) => tracing::debug!(key_path, "Walked value has an unexpected shape: {err}"),
            }
        }

        tracing::debug!(locale = %self.active, key_path, "Missing structure, using fallback");
        fallback
    }

    /// The active locale, or the default if the active code is unknown.
    #[must_use]
    pub fn active_locale(&self) -> &Locale {
        self.locales.get(&self.active).unwrap_or_else(|| self.locales.default_locale())
    }

    /// Activates `code`, persists it, and pushes the rewritten URL.
    ///
    /// Does nothing when `code` is already active or not supported.
    pub fn set_active_locale(&mut self, code: &str) {
        if !self.locales.contains(code) {
            tracing::warn!(locale = code, "Ignoring unsupported locale");
            return;
        }
        if self.active == code {
            return;
        }

        let previous = std::mem::replace(&mut self.active, code.to_string());
        self.env.preference.set(code);

        let current = self.env.history.current_path();
        let next = resolver::with_locale_segment(&current, code, &self.locales);
        if next != current {
            self.env.history.push_path(&next);
        }
        tracing::info!(from = %previous, to = code, "Active locale changed");
    }

    /// Code chosen by URL, persisted preference, language preferences or
    /// default, in that order.
    #[must_use]
    pub fn resolve_initial_locale(&self) -> &str {
        &self.resolve().locale.code
    }

    /// Reconciles URL and active locale once at startup.
    ///
    /// Without a locale segment the resolved locale is inserted via a
    /// history replace. With one, the URL wins over the active locale.
    pub fn synchronize_on_load(&mut self) -> SyncOutcome {
        let current = self.env.history.current_path();

        match resolver::extract_locale_from_path(&current, &self.locales) {
            None => {
                let code = self.resolve_initial_locale().to_string();
                let next = resolver::with_locale_segment(&current, &code, &self.locales);
                self.env.history.replace_path(&next);
                if self.active != code {
                    self.active.clone_from(&code);
                }
                tracing::debug!(path = %next, "Inserted locale segment");
                SyncOutcome::InsertedSegment(code)
            }
            Some(code) if code != self.active => {
                let code = code.to_string();
                self.active.clone_from(&code);
                self.env.preference.set(&code);
                tracing::info!(locale = %code, "Adopted locale from URL");
                SyncOutcome::AdoptedUrlLocale(code)
            }
            Some(_) => SyncOutcome::AlreadySynchronized,
        }
    }

    #[must_use]
    pub const fn locales(&self) -> &Locales {
        &self.locales
    }

    #[must_use]
    pub const fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Runs the resolution rules against the current environment.
    fn resolve(&self) -> ResolvedLocale<'_> {
        let path = self.env.history.current_path();
        let persisted = self.env.preference.get();
        let preferred = self.env.languages.preferred_languages();
        resolver::resolve_initial_locale(
            &self.locales,
            &path,
            persisted.as_deref(),
            preferred.as_slice(),
        )
    }
}
