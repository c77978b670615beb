//! Reading and writing the tileset view preferences file

use super::ViewPreferences;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const PREFERENCES_FILE: &str = "tileset_view.json";

#[derive(Debug)]
pub enum PreferencesError {
    IoError { path: PathBuf, message: String },
    ParseError { path: PathBuf, message: String },
    SerializeError(String),
    NoConfigDir,
}

impl std::fmt::Display for PreferencesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferencesError::IoError { path, message } => {
                write!(f, "cannot access {}: {}", path.display(), message)
            }
            PreferencesError::ParseError { path, message } => {
                write!(f, "invalid preferences in {}: {}", path.display(), message)
            }
            PreferencesError::SerializeError(e) => write!(f, "cannot serialize preferences: {}", e),
            PreferencesError::NoConfigDir => write!(f, "no config directory on this platform"),
        }
    }
}

impl std::error::Error for PreferencesError {}

fn io_error(path: &Path, e: std::io::Error) -> PreferencesError {
    PreferencesError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

impl ViewPreferences {
    /// Platform config directory shared by the tileset tools
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "bevy_map_editor", "bevy_map_tileset_editor")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn preferences_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(PREFERENCES_FILE))
    }

    /// Stored preferences, or the defaults when there are none or they
    /// cannot be read
    pub fn load() -> Self {
        let loaded = Self::preferences_path()
            .ok_or(PreferencesError::NoConfigDir)
            .and_then(|path| Self::load_from_path(&path));
        loaded.unwrap_or_else(|e| {
            bevy::log::warn!("Tileset view preferences not loaded ({}), using defaults", e);
            Self::default()
        })
    }

    /// Read preferences from `path`. A missing file reads as the defaults.
    ///
    /// Zoom entries that are not positive, or equal the default zoom, are
    /// dropped so a hand-edited file cannot produce an unusable view.
    pub fn load_from_path(path: &Path) -> Result<Self, PreferencesError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(io_error(path, e)),
        };

        let mut prefs: Self =
            serde_json::from_str(&content).map_err(|e| PreferencesError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let stored = prefs.tileset_scales.len();
        prefs
            .tileset_scales
            .retain(|_, scale| scale.is_finite() && *scale > 0.0 && *scale != 1.0);
        if prefs.tileset_scales.len() != stored {
            bevy::log::debug!(
                "Dropped {} stored tileset zoom values",
                stored - prefs.tileset_scales.len()
            );
        }
        Ok(prefs)
    }

    /// Write to the platform config directory
    pub fn save(&self) -> Result<(), PreferencesError> {
        let path = Self::preferences_path().ok_or(PreferencesError::NoConfigDir)?;
        self.save_to_path(&path)
    }

    /// Write to `path`, creating missing parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<(), PreferencesError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PreferencesError::SerializeError(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| io_error(path, e))?;

        bevy::log::debug!(
            "Wrote tileset view preferences ({} tileset zooms) to {}",
            self.tileset_scales.len(),
            path.display()
        );
        Ok(())
    }
}
