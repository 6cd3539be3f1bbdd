//! Configuration Module
//!
//! Settings loading and the settings schema.

pub mod loader;
pub mod settings;

pub use loader::SettingsLoader;
pub use settings::{DispatchSettings, GithubSettings, KeyList, ModelSettings, Settings};
