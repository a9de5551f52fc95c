//! Configuration for the pipeline stages.
//!
//! Credentials come from the environment (matching the `.env` convention
//! the pipeline has always used); per-run behaviour comes from small
//! option structs the CLI fills in. Keeping the two apart means library
//! callers never need to fake environment variables to change a flag.

use crate::error::NotesError;
use serde::{Deserialize, Serialize};

/// Default Claude model when `CLAUDE_MODEL` is not set.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-20240620";

/// Zotero API credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoteroConfig {
    pub library_id: String,
    pub api_key: String,
    /// "user" or "group".
    pub library_type: String,
}

impl ZoteroConfig {
    /// Read credentials from `ZOTERO_LIBRARY_ID` / `ZOTERO_API_KEY` /
    /// `ZOTERO_LIBRARY_TYPE` (default "user").
    ///
    /// Returns `None` when either required variable is missing — abstract
    /// lookup is optional, so this is not an error.
    pub fn from_env() -> Option<Self> {
        let library_id = non_empty_env("ZOTERO_LIBRARY_ID")?;
        let api_key = non_empty_env("ZOTERO_API_KEY")?;
        let library_type =
            non_empty_env("ZOTERO_LIBRARY_TYPE").unwrap_or_else(|| "user".to_string());
        Some(Self {
            library_id,
            api_key,
            library_type,
        })
    }
}

/// Claude API settings for the analyze stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    pub api_key: String,
    /// Model identifier, e.g. "claude-3-5-sonnet-20240620".
    pub model: String,
    /// Response token cap. 1024 comfortably fits the four-section format.
    pub max_tokens: u32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ClaudeConfig {
    /// Read settings from `ANTHROPIC_API_KEY` (required) and
    /// `CLAUDE_MODEL` (optional).
    ///
    /// A missing key is the one hard error in the pipeline: without it the
    /// analyze stage cannot do anything at all.
    pub fn from_env() -> Result<Self, NotesError> {
        let api_key = non_empty_env("ANTHROPIC_API_KEY").ok_or(NotesError::MissingCredential {
            var: "ANTHROPIC_API_KEY",
        })?;
        let model = non_empty_env("CLAUDE_MODEL").unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string());
        Ok(Self {
            api_key,
            model,
            max_tokens: 1024,
            request_timeout_secs: 120,
        })
    }
}

/// Per-run options for the analyze stage.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Replace an existing `CLAUDE ANALYSIS:` section instead of skipping
    /// the file.
    pub overwrite: bool,
    /// Courtesy pause between consecutive API calls in batch mode. This is
    /// a fixed delay, not backpressure — there is no adaptive retry.
    pub delay_ms: u64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            delay_ms: 1000,
        }
    }
}

/// Per-run options for the markdown stage.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Replace an existing markdown file instead of skipping it.
    pub overwrite: bool,
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
