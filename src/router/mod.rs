//! Router Module
//!
//! Handles model selection, API key pool management and request dispatch.

pub mod dispatcher;
pub mod key_pool;
pub mod model_select;

pub use dispatcher::{Dispatcher, ModelHandle};
pub use key_pool::{ApiKey, KeyPool, KeyPoolStats};
pub use model_select::{select_model, short_name};
