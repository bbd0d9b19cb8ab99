//! Mock provider implementation for testing.

use super::{model_matches, ChatProvider, ProviderError};
use crate::models::ChatMessage;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// What the mock answers to chat calls.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Unavailable(String),
    ApiError(u16, String),
}

/// In-memory provider that records every conversation it receives.
pub struct MockProvider {
    reply: MockReply,
    models: Mutex<Vec<String>>,
    unhealthy_checks: AtomicU32,
    health_checks: AtomicU32,
    stall_health_checks: AtomicBool,
    chats: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    pulls: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Provider that answers every chat with `text` and already has `mistral`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockReply::Text(text.into()))
    }

    /// Provider whose chat calls fail as if the backend were down.
    pub fn unavailable() -> Self {
        Self::new(MockReply::Unavailable("connection refused".to_string()))
    }

    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            models: Mutex::new(vec!["mistral:latest".to_string()]),
            unhealthy_checks: AtomicU32::new(0),
            health_checks: AtomicU32::new(0),
            stall_health_checks: AtomicBool::new(false),
            chats: Mutex::new(Vec::new()),
            pulls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the model list reported by `list_models`.
    pub fn with_models(self, models: &[&str]) -> Self {
        *self.models.lock().unwrap_or_else(|e| e.into_inner()) =
            models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Fail the first `count` health checks before reporting healthy.
    pub fn failing_health_checks(self, count: u32) -> Self {
        self.unhealthy_checks.store(count, Ordering::SeqCst);
        self
    }

    /// Health checks never answer, like a backend that accepts connections and hangs.
    pub fn stalling_health_checks(self) -> Self {
        self.stall_health_checks.store(true, Ordering::SeqCst);
        self
    }

    /// Conversations received so far, with the model they targeted.
    pub fn chats(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.chats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn chat_count(&self) -> usize {
        self.chats.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn pulls(&self) -> Vec<String> {
        self.pulls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn health_check_count(&self) -> u32 {
        self.health_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        self.chats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((model.to_string(), messages.to_vec()));

        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Unavailable(msg) => Err(ProviderError::Unavailable(msg.clone())),
            MockReply::ApiError(status, msg) => Err(ProviderError::Api {
                status: *status,
                message: msg.clone(),
            }),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.models.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn pull_model(&self, model: &str) -> Result<(), ProviderError> {
        self.pulls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(model.to_string());

        let mut models = self.models.lock().unwrap_or_else(|e| e.into_inner());
        if !models.iter().any(|m| model_matches(m, model)) {
            models.push(model.to_string());
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);

        if self.stall_health_checks.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let remaining = self.unhealthy_checks.load(Ordering::SeqCst);
        if remaining > 0 {
            self.unhealthy_checks.store(remaining - 1, Ordering::SeqCst);
            return Err(ProviderError::Unavailable("backend starting".to_string()));
        }

        match self.reply {
            MockReply::Unavailable(ref msg) => Err(ProviderError::Unavailable(msg.clone())),
            _ => Ok(()),
        }
    }
}
