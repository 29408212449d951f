//! Host environment seams: navigation history, persisted preference and the
//! user's language preferences.
//!
//! The translation service only talks to these traits, so it runs the same
//! way against in-memory doubles, a preference file, or a real browser shell.

use std::fmt;
use std::fs;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
};

/// Current URL path plus push/replace navigation.
pub trait History: fmt::Debug {
    /// Path of the current location, including query string and fragment.
    fn current_path(&self) -> String;

    /// Navigates to `path`, adding a history entry.
    fn push_path(&self, path: &str);

    /// Rewrites the current entry to `path` without adding one.
    fn replace_path(&self, path: &str);
}

/// Storage for the single persisted locale preference.
pub trait PreferenceStore: fmt::Debug {
    fn get(&self) -> Option<String>;

    fn set(&self, code: &str);
}

/// Ordered language tags the user prefers (`navigator.languages`, `LANG`...).
pub trait LanguagePreferences: fmt::Debug {
    fn preferred_languages(&self) -> Vec<String>;
}

/// Recorded state of a [`MemoryHistory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    /// Every path visited, oldest first; the last one is current
    pub entries: Vec<String>,
    /// Number of `push_path` calls
    pub pushes: usize,
    /// Number of `replace_path` calls
    pub replaces: usize,
}

/// In-memory history. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    /// Shared navigation log
    log: Arc<Mutex<HistoryLog>>,
}

impl MemoryHistory {
    #[must_use]
    pub fn new(initial_path: &str) -> Self {
        let log = HistoryLog { entries: vec![initial_path.to_string()], ..HistoryLog::default() };
        Self { log: Arc::new(Mutex::new(log)) }
    }

    /// Snapshot of the recorded navigation.
    #[must_use]
    pub fn log(&self) -> HistoryLog {
        self.lock().clone()
    }

    /// Locks the log, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, HistoryLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl History for MemoryHistory {
    fn current_path(&self) -> String {
        self.lock().entries.last().cloned().unwrap_or_else(|| "/".to_string())
    }

    fn push_path(&self, path: &str) {
        let mut log = self.lock();
        log.entries.push(path.to_string());
        log.pushes += 1;
    }

    fn replace_path(&self, path: &str) {
        let mut log = self.lock();
        match log.entries.last_mut() {
            Some(current) => path.clone_into(current),
            None => log.entries.push(path.to_string()),
        }
        log.replaces += 1;
    }
}

/// In-memory preference. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    /// Shared preference slot
    value: Arc<Mutex<Option<String>>>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn new(initial: Option<&str>) -> Self {
        Self { value: Arc::new(Mutex::new(initial.map(str::to_string))) }
    }

    /// Locks the slot, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self) -> Option<String> {
        self.lock().clone()
    }

    fn set(&self, code: &str) {
        *self.lock() = Some(code.to_string());
    }
}

/// Preference persisted as a single line in a file.
///
/// I/O failures are logged and otherwise ignored: a preference that cannot
/// be read behaves like no preference.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    /// File holding the locale code
    path: PathBuf,
}

impl FilePreferenceStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let code = content.trim();
                (!code.is_empty()).then(|| code.to_string())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "Failed to read locale preference: {err}");
                None
            }
        }
    }

    fn set(&self, code: &str) {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(err) = fs::create_dir_all(parent)
        {
            tracing::warn!(path = %parent.display(), "Failed to create preference directory: {err}");
            return;
        }
        if let Err(err) = fs::write(&self.path, format!("{code}\n")) {
            tracing::warn!(path = %self.path.display(), "Failed to persist locale preference: {err}");
        }
    }
}

/// Fixed list of preferred language tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticLanguagePreferences(pub Vec<String>);

impl StaticLanguagePreferences {
    #[must_use]
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }
}

impl LanguagePreferences for StaticLanguagePreferences {
    fn preferred_languages(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Language preferences from the POSIX locale variables.
///
/// Order: `LANGUAGE` (colon-separated list), `LC_ALL`, `LC_MESSAGES`, `LANG`.
/// The `C` and `POSIX` locales carry no language and are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvLanguagePreferences;

impl EnvLanguagePreferences {
    /// Variables consulted, highest priority first.
    const VARIABLES: [&'static str; 4] = ["LANGUAGE", "LC_ALL", "LC_MESSAGES", "LANG"];

    /// Collects tags from `(variable, value)` pairs in priority order.
    fn collect<'a>(values: impl IntoIterator<Item = (&'a str, Option<String>)>) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for (variable, value) in values {
            let Some(value) = value else { continue };
            let candidates: Vec<&str> = if variable == "LANGUAGE" {
                value.split(':').collect()
            } else {
                vec![value.as_str()]
            };
            for candidate in candidates {
                let candidate = candidate.trim();
                if candidate.is_empty() || candidate == "C" || candidate == "POSIX" {
                    continue;
                }
                if !tags.iter().any(|existing| existing == candidate) {
                    tags.push(candidate.to_string());
                }
            }
        }
        tags
    }
}

impl LanguagePreferences for EnvLanguagePreferences {
    fn preferred_languages(&self) -> Vec<String> {
        Self::collect(Self::VARIABLES.iter().map(|name| (*name, std::env::var(name).ok())))
    }
}

/// Everything the translation service needs from its host.
#[derive(Debug)]
pub struct Environment {
    pub history: Box<dyn History>,
    pub preference: Box<dyn PreferenceStore>,
    pub languages: Box<dyn LanguagePreferences>,
}

impl Environment {
    #[must_use]
    pub fn new(
        history: impl History + 'static,
        preference: impl PreferenceStore + 'static,
        languages: impl LanguagePreferences + 'static,
    ) -> Self {
        Self {
            history: Box::new(history),
            preference: Box::new(preference),
            languages: Box::new(languages),
        }
    }

    /// Root path, nothing persisted, no language preferences.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            MemoryHistory::new("/"),
            MemoryPreferenceStore::default(),
            StaticLanguagePreferences::default(),
        )
    }
}
