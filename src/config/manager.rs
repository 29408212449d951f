//! Settings management.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    I18nSettings,
    loader,
};

/// Holds the validated settings and the workspace they were loaded from.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// Current settings
    current_settings: I18nSettings,

    /// Workspace root the settings were loaded from
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: I18nSettings::default(), workspace_root: None }
    }

    /// Loads and validates settings for a workspace.
    ///
    /// Falls back to defaults when the workspace has no settings file.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation errors
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", workspace_root);

        let settings = if let Some(root) = &workspace_root {
            loader::load_from_workspace(root)?.map_or_else(I18nSettings::default, |ws| {
                tracing::debug!("Loaded workspace settings: {:?}", ws);
                ws
            })
        } else {
            I18nSettings::default()
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.workspace_root = workspace_root;
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings);

        Ok(())
    }

    #[must_use]
    pub const fn get_settings(&self) -> &I18nSettings {
        &self.current_settings
    }

    /// Resolves a settings path against the workspace root.
    ///
    /// Absolute paths are returned unchanged.
    #[must_use]
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        let path = Path::new(relative);
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Absolute location of the bundle directory.
    #[must_use]
    pub fn locales_dir(&self) -> PathBuf {
        self.resolve_path(&self.current_settings.locales_dir)
    }

    /// Absolute location of the persisted-preference file, if configured.
    #[must_use]
    pub fn preference_file(&self) -> Option<PathBuf> {
        self.current_settings.preference_file.as_deref().map(|path| self.resolve_path(path))
    }
}
