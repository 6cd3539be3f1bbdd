//! Orbit - Personal Study Assistant
//!
//! Chat, quizzes and curriculum tracking over Gemini, with API key rotation
//! and a study document synced to GitHub.

pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod router;
pub mod store;
pub mod study;

pub use app::StudyApp;
pub use client::{GeminiClient, ModelBackend};
pub use config::{Settings, SettingsLoader};
pub use error::{OrbitError, Result};
pub use router::{Dispatcher, KeyPool};
pub use store::{ConfigStore, StudyDocument};

/// Load settings from the default locations, or from `path` when given
pub fn load_settings(path: Option<&str>) -> Result<Settings> {
    let loader = match path {
        Some(path) => SettingsLoader::from_path(path)?,
        None => SettingsLoader::new()?,
    };
    Ok(loader.into_settings())
}
