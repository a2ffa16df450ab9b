//! BBOT AI - trading-settings analysis using rig-core.
//!
//! This crate turns a model reply into validated trading settings. It builds
//! the system prompt, calls a model backend (or a deterministic mock when no
//! API key is configured), parses and validates the reply, retries within a
//! bounded budget and reports progress through the shared state machine.
//!
//! # Architecture
//!
//! - `backend`: `ModelBackend` trait, rig-core OpenAI backend, mock and fake backends
//! - `prompt`: System prompt built from config, snapshot and filters
//! - `parser`: `### EXPLANATION` / `### SETTINGS_JSON` splitting
//! - `schema`: `AiSettings` validation and the resulting config diff
//! - `pipeline`: Retry loop, timeouts, healthcheck and state updates
//! - `error`: `AiError` with codes and retry classification
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bbot_ai::{build_prompt, AiResponsePipeline};
//! use bbot_core::StateMachine;
//!
//! let state = Arc::new(StateMachine::new());
//! let pipeline = AiResponsePipeline::from_config(&config, state.clone())?;
//! let prompt = build_prompt(&config, Some(&snapshot), None, &[]);
//! let analysis = pipeline.run_chat(&prompt, "Suggest safer settings").await?;
//! let next = config.apply(&analysis.to_config_update());
//! ```

pub mod backend;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod schema;

pub use backend::{
    BackendReply, CompletionRequest, FakeBackend, MockBackend, ModelBackend, OpenAiBackend,
};
pub use error::AiError;
pub use parser::{parse_reply, split_blocks};
pub use pipeline::AiResponsePipeline;
pub use prompt::build_prompt;
pub use schema::{AiAnalysis, AiSettings};
