pub mod chat;
pub mod generation;

pub use chat::{build_conversation, ChatMessage, ChatRole, SYSTEM_INSTRUCTION};
pub use generation::{GenerateRequest, GenerateResponse};
