//! Model backends.
//!
//! The pipeline talks to a [`ModelBackend`]. The live backend calls an
//! OpenAI-compatible chat completion through rig-core; the mock backend
//! answers with a fixed, schema-valid payload when no API key is configured.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bbot_core::mask_secret;
use log::{debug, info};
use reqwest::Client as HttpClient;
use rig::{client::CompletionClient, completion::Prompt, providers::openai};
use serde_json::{json, Value};

use crate::error::AiError;

// ============================================================================
// Backend Trait
// ============================================================================

/// One chat-style completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub temperature: f64,
    /// Upper bound for the call; enforced by the caller.
    pub timeout: Duration,
}

/// What a backend returned.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    /// Free text with `### EXPLANATION` / `### SETTINGS_JSON` sections.
    Text(String),
    /// An `{explanation, settings}` object.
    Structured(Value),
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Whether calls reach a real model.
    fn is_live(&self) -> bool;

    /// Human-readable description with secrets masked.
    fn describe(&self) -> String;

    async fn complete(&self, request: &CompletionRequest) -> Result<BackendReply, AiError>;
}

// ============================================================================
// OpenAI Backend
// ============================================================================

/// OpenAI chat completions through rig-core.
pub struct OpenAiBackend {
    client: openai::CompletionsClient<HttpClient>,
    model: String,
    masked_key: String,
}

impl OpenAiBackend {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AiError> {
        if api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey("openai".to_string()));
        }
        if model.trim().is_empty() {
            return Err(AiError::Configuration("ai.model must not be empty".to_string()));
        }
        // Completions API rather than the Responses API.
        let key = api_key.to_string();
        let client = openai::CompletionsClient::builder()
            .api_key(&key)
            .build()
            .map_err(|e| AiError::Provider(e.to_string()))?;

        Ok(Self {
            client,
            model: model.to_string(),
            masked_key: mask_secret(api_key),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn is_live(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("OpenAI client (key: {})", self.masked_key)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<BackendReply, AiError> {
        debug!(
            "Calling model {} (temperature {})",
            self.model, request.temperature
        );
        let agent = self
            .client
            .agent(&self.model)
            .preamble(&request.system_prompt)
            .temperature(request.temperature)
            .build();

        let text = agent
            .prompt(&request.user_message)
            .await
            .map_err(|e| AiError::Provider(e.to_string()))?;
        Ok(BackendReply::Text(text))
    }
}

// ============================================================================
// Mock Backend
// ============================================================================

pub const MOCK_EXPLANATION: &str = "Mock AI because no OpenAI key was provided.";

/// Deterministic backend used without an API key.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockBackend;

impl MockBackend {
    pub fn payload() -> Value {
        json!({
            "explanation": MOCK_EXPLANATION,
            "settings": {
                "budget_usdt": 150,
                "max_orders": 4,
                "grid_step_pct": 0.4,
                "take_profit_pct": 1.8,
                "stop_loss_pct": 1.2,
                "cooldown_seconds": 12,
                "update_interval_ms": 1200
            }
        })
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn is_live(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "Mock AI client (no key)".to_string()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<BackendReply, AiError> {
        info!(
            "Running mock AI (no key). User message: {}",
            request.user_message
        );
        Ok(BackendReply::Structured(Self::payload()))
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================

/// A scripted backend for tests.
///
/// Replies are served in order; the last one repeats once the script runs
/// out. An optional delay simulates a slow model.
pub struct FakeBackend {
    replies: Mutex<VecDeque<Result<BackendReply, AiError>>>,
    delay: Option<Duration>,
    live: bool,
    calls: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl FakeBackend {
    pub fn new(replies: Vec<Result<BackendReply, AiError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            delay: None,
            live: true,
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always answer with `text`.
    pub fn with_text(text: &str) -> Self {
        Self::new(vec![Ok(BackendReply::Text(text.to_string()))])
    }

    /// Sleep `delay` before every reply.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn offline(mut self) -> Self {
        self.live = false;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl ModelBackend for FakeBackend {
    fn is_live(&self) -> bool {
        self.live
    }

    fn describe(&self) -> String {
        "Fake AI client".to_string()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<BackendReply, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap_or_else(|p| p.into_inner()) = Some(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut replies = self.replies.lock().unwrap_or_else(|p| p.into_inner());
        match replies.len() {
            0 => Err(AiError::provider("no scripted reply")),
            1 => replies[0].clone(),
            _ => replies
                .pop_front()
                .unwrap_or_else(|| Err(AiError::provider("no scripted reply"))),
        }
    }
}
