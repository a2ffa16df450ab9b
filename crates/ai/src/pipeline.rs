//! AI response pipeline: call the backend, validate, retry, report state.

use std::sync::Arc;
use std::time::Duration;

use bbot_core::{AiConfig, AppState, Config, RetryDecision, RetryOutcome, RetryPolicy, StateMachine};
use log::{error, info, warn};
use tokio::time::Instant;

use crate::backend::{BackendReply, CompletionRequest, MockBackend, ModelBackend, OpenAiBackend};
use crate::error::AiError;
use crate::parser::parse_reply;
use crate::schema::AiAnalysis;

const HEALTHCHECK_PROMPT: &str = "Say OK";
const HEALTHCHECK_MESSAGE: &str = "Ping";
const HEALTHCHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs settings analysis against a model backend.
///
/// The state handle is shared with the shell, which renders it.
pub struct AiResponsePipeline {
    backend: Arc<dyn ModelBackend>,
    settings: AiConfig,
    state: Arc<StateMachine>,
}

impl AiResponsePipeline {
    /// Live OpenAI backend when a key is configured, mock backend otherwise.
    pub fn from_config(config: &Config, state: Arc<StateMachine>) -> Result<Self, AiError> {
        let backend: Arc<dyn ModelBackend> = match config.api_keys.openai_key() {
            Some(key) => Arc::new(OpenAiBackend::new(key, &config.ai.model)?),
            None => Arc::new(MockBackend),
        };
        Ok(Self::with_backend(backend, config.ai.clone(), state))
    }

    pub fn with_backend(
        backend: Arc<dyn ModelBackend>,
        settings: AiConfig,
        state: Arc<StateMachine>,
    ) -> Self {
        Self {
            backend,
            settings,
            state,
        }
    }

    /// False when answers come from the mock backend.
    pub fn can_run_live(&self) -> bool {
        self.backend.is_live()
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    pub fn state(&self) -> &Arc<StateMachine> {
        &self.state
    }

    /// Run analysis with the configured retry budget.
    pub async fn run_chat(&self, prompt: &str, user_message: &str) -> Result<AiAnalysis, AiError> {
        self.run_analysis(prompt, user_message, self.settings.max_retries)
            .await
    }

    /// Up to `max_retries + 1` attempts. Every failed attempt sets the state to
    /// `ERROR`; success sets `AI_READY`.
    pub async fn run_analysis(
        &self,
        prompt: &str,
        user_message: &str,
        max_retries: u32,
    ) -> Result<AiAnalysis, AiError> {
        let request = CompletionRequest {
            system_prompt: prompt.to_string(),
            user_message: user_message.to_string(),
            temperature: self.settings.temperature,
            timeout: Duration::from_secs(self.settings.timeout_seconds),
        };
        let request = &request;

        let outcome = RetryPolicy::new(max_retries)
            .run(
                |_| self.attempt(request),
                |attempt, err: &AiError| {
                    self.state.fail(err.to_string());
                    error!(
                        "AI response validation failed (attempt {}): {}",
                        attempt, err
                    );
                    if err.is_retryable() {
                        RetryDecision::Retry
                    } else {
                        RetryDecision::Abort
                    }
                },
            )
            .await;

        match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                if let Err(e) = self.state.set_state(AppState::AiReady, None) {
                    warn!("Could not mark AI as ready: {}", e);
                }
                info!(
                    "AI response valid after {} attempt(s) with settings: {:?}",
                    attempts, value.settings
                );
                Ok(value)
            }
            RetryOutcome::Exhausted { error, attempts } => Err(AiError::RetriesExhausted {
                attempts,
                last: Box::new(error),
            }),
            RetryOutcome::Aborted { error, .. } => Err(error),
        }
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<AiAnalysis, AiError> {
        let started = Instant::now();
        let reply = tokio::time::timeout(request.timeout, self.backend.complete(request)).await;
        if self.backend.is_live() {
            info!("AI latency: {:.0}ms", started.elapsed().as_secs_f64() * 1000.0);
        }

        match reply {
            Err(_) => Err(AiError::Timeout(request.timeout)),
            Ok(Err(e)) => Err(e),
            Ok(Ok(BackendReply::Text(text))) => parse_reply(&text),
            Ok(Ok(BackendReply::Structured(value))) => AiAnalysis::from_value(&value),
        }
    }

    /// Cheap reachability check. Always false in mock mode; never changes state.
    pub async fn healthcheck(&self) -> bool {
        if !self.can_run_live() {
            return false;
        }
        let request = CompletionRequest {
            system_prompt: HEALTHCHECK_PROMPT.to_string(),
            user_message: HEALTHCHECK_MESSAGE.to_string(),
            temperature: 0.0,
            timeout: HEALTHCHECK_TIMEOUT,
        };
        match tokio::time::timeout(HEALTHCHECK_TIMEOUT, self.backend.complete(&request)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("AI healthcheck failed: {}", e);
                false
            }
            Err(_) => {
                warn!("AI healthcheck timed out");
                false
            }
        }
    }
}
