//! Chat turns exchanged with the inference backend.

use serde::{Deserialize, Serialize};

/// Fixed instruction constraining the model to raw Mermaid output.
pub const SYSTEM_INSTRUCTION: &str = "You are a Mermaid flowchart code generator. You must only output the raw Mermaid code and nothing else. Start the flowchart with 'graph TD'.";

const USER_TURN_PREFIX: &str = "Create a flowchart for: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// The two-turn conversation sent for every generation request.
pub fn build_conversation(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_INSTRUCTION),
        ChatMessage::user(format!("{}{}", USER_TURN_PREFIX, prompt)),
    ]
}
