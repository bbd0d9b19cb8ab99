//! Ollama provider implementation.
//!
//! Speaks the non-streaming subset of the Ollama REST API:
//! `/api/chat`, `/api/tags` and `/api/pull`.

use super::{ChatProvider, ProviderError};
use crate::config::BackendConfig;
use crate::models::ChatMessage;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection attempts fail fast; generation itself may run for minutes.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Ollama HTTP client.
pub struct OllamaProvider {
    base_url: String,
    client: Client,
    request_timeout: Duration,
    /// `None` lets a pull run until the download completes.
    pull_timeout: Option<Duration>,
}

impl OllamaProvider {
    pub fn new(config: &BackendConfig) -> Result<Self, ProviderError> {
        // Total timeouts are set per request: pulls outlive chat calls by far.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            request_timeout: config.request_timeout(),
            pull_timeout: config.pull_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Unavailable(format!("request to {} timed out", self.base_url))
        } else {
            ProviderError::Unavailable(format!("cannot reach {}: {}", self.base_url, err))
        }
    }

    /// Turn a non-2xx response into an `Api` error, preferring Ollama's `{"error": ..}` body.
    async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        let message = if message.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            message
        };

        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model,
            messages,
            stream: false,
        };

        tracing::debug!(
            model = %model,
            turns = messages.len(),
            "Sending chat request to Ollama"
        );

        let response = self
            .client
            .post(self.api_url("chat"))
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = Self::ensure_success(response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse chat response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(ProviderError::Api {
                status: 200,
                message: error,
            });
        }

        body.message
            .map(|m| m.content)
            .ok_or_else(|| ProviderError::InvalidResponse("chat response has no message".to_string()))
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .get(self.api_url("tags"))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = Self::ensure_success(response).await?;

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse model list: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull_model(&self, model: &str) -> Result<(), ProviderError> {
        tracing::info!(model = %model, "Pulling model from Ollama registry");

        let mut request = self.client.post(self.api_url("pull")).json(&PullRequest {
            model,
            stream: false,
        });
        if let Some(timeout) = self.pull_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = Self::ensure_success(response).await?;

        let body: PullResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse pull response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(ProviderError::Api {
                status: 200,
                message: error,
            });
        }

        match body.status.as_deref() {
            Some("success") => Ok(()),
            other => Err(ProviderError::InvalidResponse(format!(
                "pull of '{}' ended with status {:?}",
                model, other
            ))),
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(self.api_url("tags"))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::ensure_success(response).await.map(|_| ())
    }
}

// ============================================================================
// Ollama API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}
