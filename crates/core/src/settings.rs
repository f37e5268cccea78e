//! User preferences persisted between runs.
//!
//! Only the selection axes are stored. The API key is never written to disk.

use crate::catalog::{Language, Mode};
use crate::config::DEFAULT_MODEL;
use crate::error::Result;
use crate::session::Selection;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Gemini models offered for selection.
pub const AVAILABLE_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-flash-latest",
    "gemini-flash-lite-latest",
];

/// Stored as JSON in the user's config directory
/// (e.g., `~/.config/smashpass/settings.json` on Linux).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub model: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub language: Language,
}

impl Settings {
    /// Returns the path to the settings file, if the platform has a config dir.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "smashpass").map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from the default location, falling back to defaults.
    pub fn load(default_model: &str) -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path, default_model))
            .unwrap_or_else(|| Self::with_defaults(default_model))
    }

    /// Loads settings from `path`. A missing or unreadable file yields defaults.
    pub fn load_from(path: &Path, default_model: &str) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_else(|| Self::with_defaults(default_model))
    }

    pub fn with_defaults(model: &str) -> Self {
        Self {
            model: model.to_string(),
            mode: Mode::default(),
            language: Language::default(),
        }
    }

    /// Persists settings to the default location.
    pub fn save(&self) -> Result<Option<PathBuf>> {
        match Self::config_path() {
            Some(path) => {
                self.save_to(&path)?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }

    /// Persists settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn selection(&self) -> Selection {
        Selection {
            mode: self.mode,
            language: self.language,
            model_id: self.model.clone(),
        }
    }
}

impl From<&Selection> for Settings {
    fn from(selection: &Selection) -> Self {
        Self {
            model: selection.model_id.clone(),
            mode: selection.mode,
            language: selection.language,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_MODEL)
    }
}
