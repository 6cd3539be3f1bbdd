//! API Module
//!
//! Gemini REST request and response types.

pub mod catalog;
pub mod generate;

pub use catalog::{ListModelsResponse, ModelInfo, GENERATE_CONTENT};
pub use generate::{
    Candidate, Content, ErrorBody, ErrorResponse, GenerateContentRequest,
    GenerateContentResponse, Part, UsageMetadata,
};
