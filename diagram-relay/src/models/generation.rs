use serde::{Deserialize, Serialize};

/// Body of `POST /generate`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl GenerateRequest {
    /// The prompt, or an empty string when the caller left it out.
    pub fn prompt_text(&self) -> &str {
        self.prompt.as_deref().unwrap_or_default()
    }

    pub fn has_prompt(&self) -> bool {
        !self.prompt_text().trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub mermaid_code: String,
}
