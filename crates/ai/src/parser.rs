//! Free-text reply parsing.
//!
//! Replies carry two sections introduced by `### EXPLANATION` and
//! `### SETTINGS_JSON`. Anchors match case-insensitively; everything after
//! the settings anchor must be a JSON document.

use serde_json::Value;

use crate::error::AiError;
use crate::schema::AiAnalysis;

pub const EXPLANATION_ANCHOR: &str = "### EXPLANATION";
pub const SETTINGS_ANCHOR: &str = "### SETTINGS_JSON";

/// Split a reply into `(explanation, settings_text)`.
///
/// The explanation is empty when its anchor is missing or comes after the
/// settings anchor.
pub fn split_blocks(content: &str) -> Result<(&str, &str), AiError> {
    // ASCII lowering keeps byte offsets aligned with `content`.
    let lower = content.to_ascii_lowercase();
    let settings_at = lower
        .find(&SETTINGS_ANCHOR.to_ascii_lowercase())
        .ok_or_else(|| AiError::parse("Missing SETTINGS_JSON block in AI response"))?;

    let explanation = match lower.find(&EXPLANATION_ANCHOR.to_ascii_lowercase()) {
        Some(at) if at + EXPLANATION_ANCHOR.len() <= settings_at => {
            content[at + EXPLANATION_ANCHOR.len()..settings_at].trim()
        }
        _ => "",
    };
    let settings = content[settings_at + SETTINGS_ANCHOR.len()..].trim();
    Ok((explanation, settings))
}

/// Parse the settings block as JSON. A surrounding code fence is tolerated.
pub fn parse_settings(settings_text: &str) -> Result<Value, AiError> {
    serde_json::from_str(strip_code_fence(settings_text))
        .map_err(|e| AiError::parse(format!("Failed to parse SETTINGS_JSON: {}", e)))
}

/// Parse and validate a free-text reply.
pub fn parse_reply(content: &str) -> Result<AiAnalysis, AiError> {
    let (explanation, settings_text) = split_blocks(content)?;
    let settings = parse_settings(settings_text)?;
    AiAnalysis::new(explanation, &settings)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an info string such as `json`.
    let body = match body.find('\n') {
        Some(newline) => &body[newline + 1..],
        None => body,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
