//! Client Module
//!
//! Model backend abstraction, the Gemini HTTP client and failure classification.

pub mod classify;
pub mod http;

use crate::api::ModelInfo;
use async_trait::async_trait;

pub use classify::{classify, BackendError, FailureClass};
pub use http::{GeminiClient, DEFAULT_API_BASE};

/// Outbound interface of the dispatcher. Each call carries the credential the
/// active model handle is bound to.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// List the backend's model catalog
    async fn list_models(&self, credential: &str) -> Result<Vec<ModelInfo>, BackendError>;

    /// Generate a text response for `prompt`
    async fn generate(
        &self,
        credential: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, BackendError>;
}
