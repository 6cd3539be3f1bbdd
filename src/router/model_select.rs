//! Model Selection
//!
//! Picks the model name to use for the session from the backend catalog.

use crate::api::ModelInfo;
use crate::config::ModelSettings;

const MODEL_PREFIX: &str = "models/";

/// Strip the catalog's "models/" prefix
pub fn short_name(name: &str) -> &str {
    name.strip_prefix(MODEL_PREFIX).unwrap_or(name)
}

/// Choose a model from `catalog`, falling back to `settings.fallback`.
///
/// Priority:
/// 1. the preferred variant, excluding "latest" and experimental aliases
/// 2. any lightweight-family model outside the excluded generation, non-experimental
/// 3. the first model that supports `generateContent`
pub fn select_model(catalog: &[ModelInfo], settings: &ModelSettings) -> String {
    let capable: Vec<&str> = catalog
        .iter()
        .filter(|m| m.can_generate())
        .map(|m| m.name.as_str())
        .collect();

    let experimental = settings.experimental_tag.as_str();

    let preferred = capable.iter().find(|name| {
        name.contains(settings.preferred.as_str())
            && !name.contains(settings.latest_tag.as_str())
            && !name.contains(experimental)
    });

    let family = || {
        capable.iter().find(|name| {
            name.contains(settings.family.as_str())
                && !name.contains(settings.excluded_generation.as_str())
                && !name.contains(experimental)
        })
    };

    preferred
        .or_else(family)
        .or_else(|| capable.first())
        .map(|name| short_name(name).to_string())
        .unwrap_or_else(|| settings.fallback.clone())
}
