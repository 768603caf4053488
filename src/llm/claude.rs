//! Anthropic Messages API client used by the primary prompt-composition path.

use std::time::Duration;

use anyhow::anyhow;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::composer::PromptGenerationError;
use crate::config::CONFIG;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

const ANTHROPIC_VERSION: &str = "2023-06-01";

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn redact_api_key(text: &str) -> String {
    let key = CONFIG.anthropic_api_key.trim();
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, "[redacted]")
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string());
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn extract_text(response: &Value) -> String {
    let blocks = response
        .get("content")
        .and_then(|value| value.as_array())
        .cloned()
        .unwrap_or_default();

    let mut parts = Vec::new();
    for block in blocks {
        if block.get("type").and_then(|v| v.as_str()) == Some("text") {
            if let Some(text) = block.get("text").and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    parts.push(text.to_string());
                }
            }
        }
    }
    parts.join("\n")
}

/// Sends system instructions plus a user brief and returns the model's single
/// prose reply. Transport timeouts surface as the distinct timeout error so
/// callers can tell cancellation from a generation failure.
pub async fn generate(system: &str, user: &str) -> Result<String, PromptGenerationError> {
    if CONFIG.anthropic_api_key.trim().is_empty() {
        return Err(PromptGenerationError::Api(anyhow!(
            "ANTHROPIC_API_KEY is not set"
        )));
    }

    let timeout_seconds = CONFIG.prompt_timeout_seconds;
    let payload = json!({
        "model": CONFIG.anthropic_model,
        "max_tokens": CONFIG.anthropic_max_tokens,
        "system": system,
        "messages": [
            { "role": "user", "content": user }
        ],
    });

    debug!(
        target: "studio.claude",
        model = %CONFIG.anthropic_model,
        system_chars = system.chars().count(),
        brief_chars = user.chars().count(),
        "Anthropic request"
    );

    let model = CONFIG.anthropic_model.clone();
    log_llm_timing("anthropic", &model, "compose_prompt", None, || async {
        let client = get_http_client();
        let response = client
            .post(format!(
                "{}/v1/messages",
                CONFIG.anthropic_base_url.trim_end_matches('/')
            ))
            .header("x-api-key", &CONFIG.anthropic_api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(Duration::from_secs(timeout_seconds))
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    return PromptGenerationError::Timeout(timeout_seconds);
                }
                let err_text = redact_api_key(&err.to_string());
                warn!(
                    "Anthropic request failed to send: {} (timeout={}, connect={})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect()
                );
                PromptGenerationError::Api(anyhow!("Anthropic request failed: {err_text}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!(
                "Anthropic API error: status={}, body={}",
                status, body_summary
            );
            let detail = message.unwrap_or(body_summary);
            return Err(PromptGenerationError::Api(anyhow!(
                "Anthropic request failed with status {status}: {detail}"
            )));
        }

        let value = response.json::<Value>().await.map_err(|err| {
            PromptGenerationError::Api(anyhow!("Failed to decode Anthropic response: {err}"))
        })?;

        let text = extract_text(&value);
        if text.trim().is_empty() {
            return Err(PromptGenerationError::Api(anyhow!(
                "Anthropic response contained no text content"
            )));
        }
        Ok(text)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_joined_text_blocks() {
        let response = json!({
            "content": [
                { "type": "text", "text": "first" },
                { "type": "tool_use", "id": "x" },
                { "type": "text", "text": "second" }
            ]
        });
        assert_eq!(extract_text(&response), "first\nsecond");
    }

    #[test]
    fn error_body_summary_prefers_api_message() {
        let (message, _) =
            summarize_error_body(r#"{"error": {"type": "overloaded", "message": "busy"}}"#);
        assert_eq!(message.as_deref(), Some("busy"));
        let (message, summary) = summarize_error_body("   ");
        assert!(message.is_none());
        assert_eq!(summary, "empty response body");
    }
}
