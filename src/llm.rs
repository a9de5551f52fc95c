//! Claude Messages API client.
//!
//! One request, one response: the analyze stage sends the assembled prompt
//! and gets back free text that should follow the four-section format.
//! There is deliberately no retry/backoff here — batch processing is
//! sequential and a fixed courtesy delay between files is the only rate
//! limiting. A failed call costs that one file; the batch driver logs it
//! and moves on.

use crate::config::ClaudeConfig;
use crate::error::NotesError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const MESSAGES_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Client for the Claude Messages API.
pub struct ClaudeClient {
    http: reqwest::Client,
    config: ClaudeConfig,
}

impl ClaudeClient {
    pub fn new(config: ClaudeConfig) -> Result<Self, NotesError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| NotesError::LlmApi {
                detail: format!("failed to build HTTP client: {e}"),
            })?;
        info!("Claude API client initialized (model: {})", config.model);
        Ok(Self { http, config })
    }

    /// Build a client from `ANTHROPIC_API_KEY` / `CLAUDE_MODEL`.
    pub fn from_env() -> Result<Self, NotesError> {
        Self::new(ClaudeConfig::from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one analysis prompt and return the response text.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, NotesError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Sending request to Claude API (model: {})", self.config.model);
        let start = Instant::now();

        let response = self
            .http
            .post(MESSAGES_API_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotesError::LlmApi {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotesError::LlmApi {
                detail: format!("HTTP {status}: {}", api_error_message(&body)),
            });
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| NotesError::LlmResponse {
                detail: format!("response was not valid JSON: {e}"),
            })?;

        let text = parsed
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(NotesError::LlmResponse {
                detail: "response contained no text content".to_string(),
            });
        }

        info!(
            "Received response from Claude API (time: {:.2}s)",
            start.elapsed().as_secs_f64()
        );
        Ok(text)
    }
}

/// Pull the human-readable message out of an API error body, falling back
/// to the (truncated) raw body when it isn't the documented error shape.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| truncate(body, 300).to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_messages_shape() {
        let request = MessagesRequest {
            model: "claude-3-5-sonnet-20240620",
            max_tokens: 1024,
            system: "system prompt",
            messages: [Message {
                role: "user",
                content: "user prompt",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-5-sonnet-20240620");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "user prompt");
    }

    #[test]
    fn response_text_blocks_joined() {
        let parsed: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"SUMMARY:\nfirst"},{"type":"text","text":" second"}]}"#,
        )
        .unwrap();
        let text: String = parsed
            .content
            .iter()
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(text, "SUMMARY:\nfirst second");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }

    #[test]
    fn api_error_message_prefers_structured_body() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        assert_eq!(api_error_message(body), "invalid x-api-key");
        assert_eq!(api_error_message("<html>gateway timeout</html>"), "<html>gateway timeout</html>");
    }
}
