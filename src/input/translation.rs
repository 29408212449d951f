//! Translation bundle sources.

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::future::Future;
use std::path::{
    Path,
    PathBuf,
};

use globset::Glob;
use ignore::WalkBuilder;
use jsonc_parser::ParseOptions;
use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

use crate::locale::Locales;
use crate::tree::{
    TranslationTree,
    TreeError,
    deep_merge,
};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No translation bundle available for locale '{0}'")]
    NotFound(String),

    #[error("Failed to read translation file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse translation file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid translation bundle for locale '{locale}': {source}")]
    InvalidBundle {
        locale: String,
        #[source]
        source: TreeError,
    },

    #[error("Invalid translation file pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

/// Supplies the raw bundle of one locale.
///
/// Each locale is fetched independently; a failed fetch only affects that
/// locale.
pub trait BundleSource {
    fn fetch(&self, locale: &str) -> impl Future<Output = Result<TranslationTree, SourceError>>;
}

/// Bundles held in memory, e.g. compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    /// Locale code to raw bundle
    bundles: BTreeMap<String, Value>,
}

impl StaticSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bundle(mut self, locale: &str, bundle: Value) -> Self {
        self.bundles.insert(locale.to_string(), bundle);
        self
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for StaticSource {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self { bundles: iter.into_iter().map(|(locale, bundle)| (locale.into(), bundle)).collect() }
    }
}

impl BundleSource for StaticSource {
    async fn fetch(&self, locale: &str) -> Result<TranslationTree, SourceError> {
        let bundle =
            self.bundles.get(locale).ok_or_else(|| SourceError::NotFound(locale.to_string()))?;
        TranslationTree::from_value(bundle.clone())
            .map_err(|source| SourceError::InvalidBundle { locale: locale.to_string(), source })
    }
}

/// Bundles stored as JSON/JSONC files below a directory.
///
/// Files are attributed to a locale by path (`de.json`, `de/common.json`,
/// `common/de.json`). Several files of one locale are deep-merged in path
/// order.
#[derive(Debug, Clone, Default)]
pub struct DirectorySource {
    /// Locale code to its files, sorted
    files: HashMap<String, Vec<PathBuf>>,
}

impl DirectorySource {
    /// Scans `root` for files matching `file_pattern` (relative to `root`).
    ///
    /// Files that cannot be attributed to a supported locale are ignored.
    ///
    /// # Errors
    /// Returns [`SourceError::Pattern`] if `file_pattern` is not a valid glob.
    pub fn discover(
        root: &Path,
        file_pattern: &str,
        locales: &Locales,
    ) -> Result<Self, SourceError> {
        tracing::debug!(root = %root.display(), file_pattern, "Discovering translation files");
        let matcher = Glob::new(file_pattern)
            .map_err(|e| SourceError::Pattern {
                pattern: file_pattern.to_string(),
                message: e.to_string(),
            })?
            .compile_matcher();

        let mut files: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for result in WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(false)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Ok(relative_path) = path.strip_prefix(root) else {
                continue;
            };
            if !matcher.is_match(relative_path) {
                continue;
            }

            match detect_locale_from_path(relative_path, locales) {
                Some(code) => files.entry(code).or_default().push(path.to_path_buf()),
                None => tracing::debug!(path = %path.display(), "No locale detected, skipping"),
            }
        }

        for paths in files.values_mut() {
            paths.sort();
        }

        Ok(Self { files })
    }

    /// Files attributed to `locale`.
    #[must_use]
    pub fn files_for(&self, locale: &str) -> &[PathBuf] {
        self.files.get(locale).map(Vec::as_slice).unwrap_or_default()
    }
}

impl BundleSource for DirectorySource {
    async fn fetch(&self, locale: &str) -> Result<TranslationTree, SourceError> {
        let paths = self.files_for(locale);
        if paths.is_empty() {
            return Err(SourceError::NotFound(locale.to_string()));
        }

        let mut merged = Map::new();
        let mut last_error = None;
        let mut loaded = 0_usize;
        for path in paths {
            match read_bundle_file(path).await {
                Ok(map) => {
                    deep_merge(&mut merged, map);
                    loaded += 1;
                }
                Err(err) => {
                    tracing::warn!(locale, "Skipping translation file: {err}");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if loaded == 0 => Err(err),
            _ => Ok(TranslationTree::new(merged)),
        }
    }
}

/// Reads and parses one bundle file. Comments and trailing commas are allowed.
async fn read_bundle_file(path: &Path) -> Result<Map<String, Value>, SourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io { path: path.to_path_buf(), source })?;
    parse_bundle_text(&content, path)
}

/// Parses bundle text into its root object.
pub(crate) fn parse_bundle_text(
    content: &str,
    path: &Path,
) -> Result<Map<String, Value>, SourceError> {
    let value = jsonc_parser::parse_to_serde_value(content, &ParseOptions::default())
        .map_err(|e| SourceError::Parse { path: path.to_path_buf(), message: e.to_string() })?;

    match value {
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(SourceError::Parse {
            path: path.to_path_buf(),
            message: format!("root must be an object, found {}", crate::tree::json_kind(&other)),
        }),
        None => Err(SourceError::Parse {
            path: path.to_path_buf(),
            message: "file contains no JSON value".to_string(),
        }),
    }
}

/// Detects the locale of a bundle file from its path.
///
/// Splits the path by separators and '.', then searches backwards for a part
/// that names a supported locale (case-insensitive, `_` and `-` equivalent).
///
/// # Examples
/// - `de.json` → `de`
/// - `de/translation.json` → `de`
/// - `common/ja.json` → `ja`
/// - `pt_BR/common.json` → `pt-BR` (if supported)
fn detect_locale_from_path(relative_path: &Path, locales: &Locales) -> Option<String> {
    let path_str = relative_path.to_string_lossy();
    let parts: Vec<&str> = path_str.split(['/', '\\', '.']).collect();

    parts.iter().rev().find_map(|part| {
        let normalized = normalize_language_code(part);
        locales
            .codes()
            .find(|code| normalize_language_code(code) == normalized)
            .map(str::to_string)
    })
}

/// Normalize language code (lowercase and replace _ with -)
fn normalize_language_code(code: &str) -> String {
    code.to_lowercase().replace('_', "-")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::locale::{
        Locale,
        TextDirection,
    };

    #[rstest]
    #[case("de.json", Some("de"))]
    #[case("de/translation.json", Some("de"))]
    #[case("common/ja.json", Some("ja"))]
    #[case("nested/zh/landing.jsonc", Some("zh"))]
    // When multiple locale names are included, the last match is returned
    #[case("en/ru.json", Some("ru"))]
    #[case("fr.json", None)]
    #[case("de-trans.json", None)]
    #[case("common.json", None)]
    fn test_detect_locale_from_path(#[case] path: &str, #[case] expected: Option<&str>) {
        let result = detect_locale_from_path(Path::new(path), &Locales::builtin());
        assert_eq!(result.as_deref(), expected);
    }

    #[rstest]
    fn test_detect_locale_from_path_regional_code() {
        let locales = Locales::new(
            vec![Locale::new("pt-BR", "Português (Brasil)", "🇧🇷", TextDirection::Ltr)],
            "pt-BR",
        )
        .unwrap();

        let result = detect_locale_from_path(Path::new("pt_BR/common.json"), &locales);

        assert_eq!(result.as_deref(), Some("pt-BR"));
    }

    #[googletest::test]
    fn parse_bundle_text_accepts_jsonc() {
        let text = r#"{
  // landing page
  "hero": { "title": "Welcome", },
}"#;

        let map = parse_bundle_text(text, Path::new("en.jsonc")).unwrap();

        expect_that!(map.get("hero"), some(eq(&json!({"title": "Welcome"}))));
    }

    #[rstest]
    #[case::array("[1, 2]", "found an array")]
    #[case::empty("", "no JSON value")]
    #[case::broken("{\"a\": ", "")]
    fn parse_bundle_text_rejects_invalid(#[case] text: &str, #[case] message_part: &str) {
        let result = parse_bundle_text(text, Path::new("en.json"));

        match result {
            Err(SourceError::Parse { message, .. }) => {
                assert!(message.contains(message_part), "unexpected message: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[googletest::test]
    fn static_source_fetch() {
        let source = StaticSource::new()
            .with_bundle("en", json!({"common": {"hello": "Hello"}}))
            .with_bundle("de", json!("not an object"));

        let en = tokio_test::block_on(source.fetch("en")).unwrap();
        let de = tokio_test::block_on(source.fetch("de"));
        let ja = tokio_test::block_on(source.fetch("ja"));

        expect_that!(en.get("common.hello", "."), some(eq(&json!("Hello"))));
        expect_that!(matches!(de, Err(SourceError::InvalidBundle { .. })), eq(true));
        expect_that!(matches!(ja, Err(SourceError::NotFound(_))), eq(true));
    }

    #[googletest::test]
    fn directory_source_merges_files_per_locale() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("de")).unwrap();
        fs::write(root.join("de/common.json"), r#"{"common": {"hello": "Hallo"}}"#).unwrap();
        fs::write(root.join("de/landing.json"), r#"{"common": {"bye": "Tschüss"}}"#).unwrap();
        fs::write(root.join("en.json"), r#"{"common": {"hello": "Hello"}}"#).unwrap();
        fs::write(root.join("README.md"), "not a bundle").unwrap();
        fs::write(root.join("schema.json"), "{}").unwrap();

        let source = DirectorySource::discover(root, "**/*.json", &Locales::builtin()).unwrap();
        let de = tokio_test::block_on(source.fetch("de")).unwrap();

        expect_that!(source.files_for("de").len(), eq(2));
        expect_that!(source.files_for("en").len(), eq(1));
        expect_that!(source.files_for("ja").len(), eq(0));
        expect_that!(de.get("common.hello", "."), some(eq(&json!("Hallo"))));
        expect_that!(de.get("common.bye", "."), some(eq(&json!("Tschüss"))));
        expect_that!(
            matches!(tokio_test::block_on(source.fetch("ja")), Err(SourceError::NotFound(_))),
            eq(true)
        );
    }

    #[googletest::test]
    fn directory_source_skips_broken_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("es")).unwrap();
        fs::write(root.join("es/a.json"), "{ broken").unwrap();
        fs::write(root.join("es/b.json"), r#"{"title": "Hola"}"#).unwrap();
        fs::write(root.join("tr.json"), "{ broken").unwrap();

        let source = DirectorySource::discover(root, "**/*.json", &Locales::builtin()).unwrap();

        let es = tokio_test::block_on(source.fetch("es")).unwrap();
        let tr = tokio_test::block_on(source.fetch("tr"));

        expect_that!(es.get("title", "."), some(eq(&json!("Hola"))));
        expect_that!(matches!(tr, Err(SourceError::Parse { .. })), eq(true));
    }

    #[googletest::test]
    fn discover_rejects_invalid_pattern() {
        let temp_dir = TempDir::new().unwrap();

        let result = DirectorySource::discover(temp_dir.path(), "**/*.{json", &Locales::builtin());

        expect_that!(matches!(result, Err(SourceError::Pattern { .. })), eq(true));
    }
}
