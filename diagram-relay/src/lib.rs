//! diagram-relay: HTTP relay from natural-language prompts to Mermaid
//! flowcharts generated by a local Ollama model.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{build_router, AppState, Application};
