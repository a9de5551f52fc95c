//! Parsing of the LLM's free-text analysis response.
//!
//! The prompt asks for four labeled sections; the model usually complies,
//! but nothing guarantees it. The parser reuses the record section scanner,
//! so a missing or empty section simply yields an empty value — rendering
//! later omits empty sections instead of erroring here. A section that is
//! present but empty and a section that is absent are indistinguishable
//! downstream, by design.

use crate::record::section;
use serde::{Deserialize, Serialize};

/// Structured view of one `CLAUDE ANALYSIS:` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub gap: String,
    pub objectives: String,
    /// Raw keyword tokens as the model returned them (five by contract,
    /// but the parser tolerates fewer or more). Singularization happens
    /// at render time.
    pub keywords: Vec<String>,
}

impl AnalysisResult {
    /// Parse the text that follows the `CLAUDE ANALYSIS:` label.
    pub fn parse(body: &str) -> Self {
        let keywords = section(body, "KEYWORDS:")
            .map(|text| {
                text.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            summary: section(body, "SUMMARY:").unwrap_or_default(),
            gap: section(body, "RESEARCH GAP/PROBLEM:").unwrap_or_default(),
            objectives: section(body, "OBJECTIVES:").unwrap_or_default(),
            keywords,
        }
    }

    /// Whether the analysis carries nothing worth rendering.
    ///
    /// A record whose analysis has neither a summary nor keywords is
    /// treated as unanalyzed by stage 3.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.keywords.is_empty()
    }
}
