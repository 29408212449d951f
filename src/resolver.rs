//! Locale resolution rules.
//!
//! Pure functions only; the side-effecting parts (URL rewrites, persisted
//! preference) live in [`crate::service`].

use std::fmt;

use serde::Serialize;

use crate::locale::{
    Locale,
    Locales,
};

/// Where the initial locale came from, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LocaleSource {
    /// First URL path segment
    Url,
    /// Previously persisted preference
    Persisted,
    /// Browser / environment language preference
    Environment,
    /// Hard default
    Default,
}

impl fmt::Display for LocaleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Url => "url",
            Self::Persisted => "persisted preference",
            Self::Environment => "language preference",
            Self::Default => "default",
        })
    }
}

/// Outcome of [`resolve_initial_locale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLocale<'a> {
    pub locale: &'a Locale,
    pub source: LocaleSource,
}

/// Returns the supported locale code in the first non-empty path segment.
///
/// Query strings and fragments are ignored. Never fails; anything that is not
/// a supported code yields `None`.
#[must_use]
pub fn extract_locale_from_path<'a>(path: &str, locales: &'a Locales) -> Option<&'a str> {
    let (pathname, _) = split_suffix(path);
    let first = pathname.split('/').find(|segment| !segment.is_empty())?;
    locales.get(first).map(|locale| locale.code.as_str())
}

/// Rewrites `path` so that its first segment is `code`.
///
/// An existing supported locale segment is replaced, otherwise `code` is
/// inserted in front. Everything after the locale segment is kept as is,
/// including repeated or trailing slashes, query string and fragment.
///
/// # Examples
/// - `/de/about` → `/en/about`
/// - `/about?ref=x` → `/en/about?ref=x`
/// - `/` → `/en`
#[must_use]
pub fn with_locale_segment(path: &str, code: &str, locales: &Locales) -> String {
    let (pathname, suffix) = split_suffix(path);
    let (leading, rest) = pathname.split_at(pathname.find(|c| c != '/').unwrap_or(pathname.len()));
    let (first, after_first) = rest.split_at(rest.find('/').unwrap_or(rest.len()));

    let mut rewritten = String::with_capacity(path.len() + code.len() + 2);
    if leading.is_empty() {
        rewritten.push('/');
    }
    rewritten.push_str(leading);
    rewritten.push_str(code);
    if locales.contains(first) {
        rewritten.push_str(after_first);
    } else if !rest.is_empty() {
        rewritten.push('/');
        rewritten.push_str(rest);
    }
    rewritten.push_str(suffix);
    rewritten
}

/// Picks the initial locale.
///
/// Priority: (1) supported locale in the URL path, (2) persisted preference
/// if still supported, (3) first environment language tag that negotiates to
/// a supported locale, (4) the default locale.
#[must_use]
pub fn resolve_initial_locale<'a, S: AsRef<str>>(
    locales: &'a Locales,
    path: &str,
    persisted: Option<&str>,
    preferred_languages: &[S],
) -> ResolvedLocale<'a> {
    if let Some(locale) = extract_locale_from_path(path, locales).and_then(|c| locales.get(c)) {
        return ResolvedLocale { locale, source: LocaleSource::Url };
    }

    if let Some(locale) = persisted.and_then(|code| locales.get(code)) {
        return ResolvedLocale { locale, source: LocaleSource::Persisted };
    }

    if let Some(locale) = preferred_languages.iter().find_map(|tag| locales.negotiate(tag.as_ref()))
    {
        return ResolvedLocale { locale, source: LocaleSource::Environment };
    }

    ResolvedLocale { locale: locales.default_locale(), source: LocaleSource::Default }
}

/// Splits `path` into the pathname and the `?query#fragment` suffix.
fn split_suffix(path: &str) -> (&str, &str) {
    path.find(['?', '#']).map_or((path, ""), |index| path.split_at(index))
}
