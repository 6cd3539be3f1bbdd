//! Settings Loader
//!
//! Loads and merges settings files from the usual locations, then applies
//! environment overrides.

use crate::config::settings::{GithubSettings, KeyList, Settings};
use crate::error::{OrbitError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings loader with support for multiple sources
pub struct SettingsLoader {
    /// Merged JSON of every file loaded so far
    merged: Value,

    settings: Settings,
}

impl SettingsLoader {
    fn empty() -> Self {
        Self {
            merged: Value::Object(Default::default()),
            settings: Settings::default(),
        }
    }

    /// Load from default locations and the process environment
    pub fn new() -> Result<Self> {
        let mut loader = Self::empty();
        loader.load_from_default_paths()?;
        loader.apply_env_overrides();
        Ok(loader)
    }

    /// Load a specific settings file plus the process environment
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self::empty();
        loader.load_from_file(path)?;
        loader.apply_env_overrides();
        Ok(loader)
    }

    /// Load configuration from default paths
    fn load_from_default_paths(&mut self) -> Result<()> {
        for path in Self::get_settings_paths() {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }
        Ok(())
    }

    /// Settings paths, lowest precedence last
    fn get_settings_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Environment variable
        if let Ok(custom_path) = std::env::var("ORBIT_SETTINGS_PATH") {
            paths.push(PathBuf::from(custom_path));
        }

        // 2. Current directory
        paths.push(PathBuf::from("orbit.json"));

        // 3. User config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("orbit").join("settings.json"));
        }

        // 4. Home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".orbit").join("settings.json"));
        }

        // Earlier entries must win, so they are merged last
        paths.reverse();
        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OrbitError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let value: Value = serde_json::from_str(&content).map_err(|e| {
            OrbitError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "loaded settings file");
        self.merge_value(value)
    }

    /// Deep-merge another settings document (later values override earlier)
    fn merge_value(&mut self, other: Value) -> Result<()> {
        merge_json(&mut self.merged, other);
        self.settings = serde_json::from_value(self.merged.clone())
            .map_err(|e| OrbitError::Config(format!("Invalid settings: {}", e)))?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// `GEMINI_KEYS` and the GitHub variables only fill values the files left
    /// unset; `GEMINI_API_BASE` and `ORBIT_DOCUMENT_PATH` always win.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let settings = &mut self.settings;

        let has_keys = settings
            .gemini_keys
            .as_ref()
            .is_some_and(|k| !k.to_keys().is_empty());
        if !has_keys {
            if let Some(keys) = lookup("GEMINI_KEYS").filter(|k| !k.trim().is_empty()) {
                settings.gemini_keys = Some(KeyList::Joined(keys));
            }
        }

        if let Some(base) = lookup("GEMINI_API_BASE") {
            settings.model.api_base = base;
        }

        if let Some(path) = lookup("ORBIT_DOCUMENT_PATH") {
            settings.document_path = Some(PathBuf::from(path));
        }

        let token = lookup("GITHUB_TOKEN").or_else(|| lookup("GITHUB_KEYS"));
        let repo = lookup("GITHUB_REPO");
        if token.is_some() || repo.is_some() {
            let github = settings.github.get_or_insert_with(GithubSettings::default);
            if github.token.is_none() {
                github.token = token;
            }
            if github.repo.is_none() {
                github.repo = repo;
            }
        }
    }

    /// Get the loaded settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Take ownership of the settings
    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

/// Recursively merge `overlay` into `base`; non-object values replace
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
