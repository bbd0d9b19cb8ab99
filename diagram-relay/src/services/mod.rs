pub mod providers;
pub mod readiness;

pub use providers::{ChatProvider, MockProvider, OllamaProvider, ProviderError};
