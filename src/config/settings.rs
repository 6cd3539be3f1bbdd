//! Settings Schema
//!
//! Defines the JSON settings file: credentials, document storage and the
//! dispatcher's tuning constants.

use crate::client::DEFAULT_API_BASE;
use crate::error::{OrbitError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Gemini API keys, as a list or one comma-separated string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_keys: Option<KeyList>,

    /// GitHub repository holding the study document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubSettings>,

    /// Local study document path (fallback store)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_path: Option<PathBuf>,

    /// Model discovery and backend location
    #[serde(default)]
    pub model: ModelSettings,

    /// Retry and rotation tuning
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

/// Key list as written in settings: a JSON array or a comma-separated string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyList {
    List(Vec<String>),
    Joined(String),
}

impl KeyList {
    /// Expand into individual trimmed keys, dropping blanks
    pub fn to_keys(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            KeyList::List(keys) => keys.iter().map(String::as_str).collect(),
            KeyList::Joined(s) => s.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Remote document store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSettings {
    /// Personal access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// "owner/name"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Path of the document inside the repository
    #[serde(default = "default_document_file")]
    pub path: String,

    /// API base, overridable for GitHub Enterprise
    #[serde(default = "default_github_api")]
    pub api_base: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            token: None,
            repo: None,
            path: default_document_file(),
            api_base: default_github_api(),
        }
    }
}

impl GithubSettings {
    /// Token and repo, when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.token.as_deref(), self.repo.as_deref()) {
            (Some(token), Some(repo)) if !token.is_empty() && !repo.is_empty() => {
                Some((token, repo))
            }
            _ => None,
        }
    }
}

/// Model discovery preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Gemini API base URL
    pub api_base: String,

    /// Skip the catalog probe and use this model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<String>,

    /// Preferred variant, matched by substring
    pub preferred: String,

    /// Lightweight family tag
    pub family: String,

    /// Newer generation excluded from the family rule
    pub excluded_generation: String,

    /// Tag marking experimental models
    pub experimental_tag: String,

    /// Tag marking moving "latest" aliases
    pub latest_tag: String,

    /// Used when the probe fails or finds nothing
    pub fallback: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            pinned: None,
            preferred: "gemini-1.5-flash".to_string(),
            family: "flash".to_string(),
            excluded_generation: "gemini-2".to_string(),
            experimental_tag: "exp".to_string(),
            latest_tag: "latest".to_string(),
            fallback: "gemini-1.5-flash".to_string(),
        }
    }
}

/// Dispatcher tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Pause after a failed attempt, in milliseconds
    pub rotation_delay_ms: u64,

    /// Attempts granted on top of one per key
    pub extra_attempts: u32,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            rotation_delay_ms: 1000,
            extra_attempts: 1,
        }
    }
}

impl DispatchSettings {
    pub fn rotation_delay(&self) -> Duration {
        Duration::from_millis(self.rotation_delay_ms)
    }
}

impl Settings {
    /// Configured Gemini keys; fails fast when there are none
    pub fn credentials(&self) -> Result<Vec<String>> {
        let keys = self
            .gemini_keys
            .as_ref()
            .map(KeyList::to_keys)
            .unwrap_or_default();

        if keys.is_empty() {
            return Err(OrbitError::NoCredentials);
        }
        Ok(keys)
    }

    /// Local document path, defaulting to the user config directory
    pub fn local_document_path(&self) -> PathBuf {
        if let Some(path) = &self.document_path {
            return path.clone();
        }
        dirs::config_dir()
            .map(|d| d.join("orbit").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }
}

fn default_document_file() -> String {
    "config.json".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}
