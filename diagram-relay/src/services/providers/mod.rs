//! Chat backend abstractions and implementations.
//!
//! The relay talks to its inference backend only through [`ChatProvider`],
//! so the Ollama client can be swapped for the mock in tests.

pub mod mock;
pub mod ollama;

use crate::models::ChatMessage;
use async_trait::async_trait;
use thiserror::Error;

pub use mock::MockProvider;
pub use ollama::OllamaProvider;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Model '{0}' not found on backend")]
    ModelNotFound(String),
}

/// Non-streaming chat completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one chat completion and return the assistant content verbatim.
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ProviderError>;

    /// Names of the models the backend can serve.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;

    /// Download a model so later chat calls can use it.
    async fn pull_model(&self, model: &str) -> Result<(), ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

/// Whether `available` satisfies a request for `model`.
///
/// Ollama lists `mistral` as `mistral:latest`, so an untagged identifier
/// matches any tag of the same name.
pub fn model_matches(available: &str, model: &str) -> bool {
    if available == model {
        return true;
    }
    if model.contains(':') {
        return false;
    }
    available
        .split_once(':')
        .is_some_and(|(name, _tag)| name == model)
}
