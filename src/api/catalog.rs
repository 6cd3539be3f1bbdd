//! Model Catalog API
//!
//! Response body of the `models` listing endpoint.

use serde::{Deserialize, Serialize};

/// Method name a model must support to be usable for chat
pub const GENERATE_CONTENT: &str = "generateContent";

/// One entry in the model catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Fully qualified name, e.g. "models/gemini-1.5-flash"
    pub name: String,

    /// Generation methods the model accepts
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, methods: &[&str]) -> Self {
        Self {
            name: name.into(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Whether the model can serve `generateContent`
    pub fn can_generate(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_CONTENT)
    }
}

/// One page of the model listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,

    /// Present when more pages follow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}
