//! The flat-text paper record: the contract between pipeline stages.
//!
//! Stage 1 writes a record per paper, stage 2 appends a `CLAUDE ANALYSIS:`
//! section to it, stage 3 parses the whole thing back. The format is a
//! fixed set of uppercase labels:
//!
//! ```text
//! TITLE: Deep Dwelling Foraminifera
//! AUTHORS: E. Revkov, A. Smith
//! YEAR: 2023
//!
//! ABSTRACT:
//! Multi-line abstract text…
//!
//! INTRODUCTION:
//! Multi-line introduction text…
//!
//! CLAUDE ANALYSIS:
//! SUMMARY:
//! …
//! ```
//!
//! A section value runs from its label to the next blank line followed by
//! another uppercase label, or to the end of the text. The grammar is small
//! and fixed, so parsing is a hand-written scanner rather than a general
//! parser. The parser is deliberately permissive: a missing label yields a
//! sentinel or an empty string, never an error, because upstream formatting
//! is not schema-validated.

use serde::{Deserialize, Serialize};

/// Label that opens the appended LLM analysis section.
pub const ANALYSIS_LABEL: &str = "CLAUDE ANALYSIS:";

/// Extracted metadata and body text for one paper.
///
/// Produced by stage 1, persisted as a flat text record, re-derived by
/// stages 2 and 3 by parsing the same serialized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: String,
    /// Four digits, or the sentinel "Unknown Year".
    pub year: String,
    /// May be empty when no Zotero match was found.
    pub abstract_text: String,
    pub introduction: String,
}

impl PaperRecord {
    /// Serialize to the on-disk record format.
    ///
    /// The layout is exact: three single-line fields, then the two
    /// blank-line-delimited multi-line sections.
    pub fn to_text(&self) -> String {
        format!(
            "TITLE: {}\nAUTHORS: {}\nYEAR: {}\n\nABSTRACT:\n{}\n\nINTRODUCTION:\n{}\n",
            self.title, self.authors, self.year, self.abstract_text, self.introduction
        )
    }

    /// Parse a record back out of its serialized text.
    ///
    /// Missing labels fall back to sentinels (single-line fields) or empty
    /// strings (multi-line sections). The introduction stops before any
    /// appended `CLAUDE ANALYSIS:` section.
    pub fn parse(content: &str) -> Self {
        Self {
            title: line_field(content, "TITLE:").unwrap_or_else(|| "Unknown Title".to_string()),
            authors: line_field(content, "AUTHORS:")
                .unwrap_or_else(|| "Unknown Authors".to_string()),
            year: line_field(content, "YEAR:").unwrap_or_else(|| "Unknown Year".to_string()),
            abstract_text: section(content, "ABSTRACT:").unwrap_or_default(),
            introduction: section(content, "INTRODUCTION:").unwrap_or_default(),
        }
    }
}

/// Whether the record text already carries an analysis section.
pub fn has_analysis(content: &str) -> bool {
    content.contains(ANALYSIS_LABEL)
}

/// Append an analysis section, replacing any existing one.
///
/// If a `CLAUDE ANALYSIS:` section exists, it and everything after it are
/// removed first — re-analysis is last-write-wins at the file level, old
/// analysis fully discarded, never merged.
pub fn append_analysis(content: &str, analysis: &str) -> String {
    let base = match content.find(ANALYSIS_LABEL) {
        // Also drop the blank line that preceded the old section.
        Some(pos) => content[..pos].trim_end(),
        None => content.trim_end(),
    };
    format!("{base}\n\n{ANALYSIS_LABEL}\n{analysis}")
}

/// Return the body of the analysis section, if present.
///
/// Runs from the label to the end of the record — the analysis is always
/// the final section.
pub fn analysis_body(content: &str) -> Option<String> {
    let pos = content.find(ANALYSIS_LABEL)?;
    Some(content[pos + ANALYSIS_LABEL.len()..].trim().to_string())
}

// ── Section scanner ──────────────────────────────────────────────────────

/// Extract a single-line field: the rest of the first line starting with
/// `label`.
fn line_field(content: &str, label: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .map(|rest| rest.trim().to_string())
}

/// Extract a multi-line section value.
///
/// The value runs from just after `label` to the next blank line that is
/// followed by an uppercase label, or to the end of the text. Uppercase
/// labels are runs of capitals (spaces and slashes allowed after the first
/// letter) ending in a colon — this covers every label the pipeline emits,
/// including "RESEARCH GAP/PROBLEM:" and "CLAUDE ANALYSIS:".
pub fn section(content: &str, label: &str) -> Option<String> {
    let start = find_label(content, label)? + label.len();
    let body = &content[start..];

    let mut end = body.len();
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.trim().is_empty() {
            // A blank line terminates the section only when the next
            // non-empty text begins with another uppercase label.
            let after = &body[offset + line.len()..];
            if is_label_line(after.trim_start_matches('\n')) {
                end = offset;
                break;
            }
        }
        offset += line.len();
    }

    Some(body[..end].trim().to_string())
}

/// Find `label` at the start of a line.
fn find_label(content: &str, label: &str) -> Option<usize> {
    if content.starts_with(label) {
        return Some(0);
    }
    content
        .find(&format!("\n{label}"))
        .map(|pos| pos + 1)
}

/// Whether `text` begins with an uppercase label (`SUMMARY:`,
/// `CLAUDE ANALYSIS:`, `RESEARCH GAP/PROBLEM:`…).
fn is_label_line(text: &str) -> bool {
    let Some(first) = text.lines().next() else {
        return false;
    };
    let Some(colon) = first.find(':') else {
        return false;
    };
    let head = &first[..colon];
    !head.is_empty()
        && head.starts_with(|c: char| c.is_ascii_uppercase())
        && head
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == ' ' || c == '/')
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PaperRecord {
        PaperRecord {
            title: "Deep Dwelling Foraminifera".to_string(),
            authors: "E. Revkov, A. Smith".to_string(),
            year: "2023".to_string(),
            abstract_text: "First abstract line.\nSecond abstract line.".to_string(),
            introduction: "Intro paragraph one.\n\nIntro paragraph two.".to_string(),
        }
    }

    #[test]
    fn round_trip_is_identity() {
        let record = sample();
        let parsed = PaperRecord::parse(&record.to_text());
        assert_eq!(parsed, record);
    }

    #[test]
    fn round_trip_with_empty_abstract() {
        let record = PaperRecord {
            abstract_text: String::new(),
            ..sample()
        };
        let parsed = PaperRecord::parse(&record.to_text());
        assert_eq!(parsed, record);
    }

    #[test]
    fn missing_labels_yield_sentinels() {
        let parsed = PaperRecord::parse("some unrelated text\n");
        assert_eq!(parsed.title, "Unknown Title");
        assert_eq!(parsed.authors, "Unknown Authors");
        assert_eq!(parsed.year, "Unknown Year");
        assert_eq!(parsed.abstract_text, "");
        assert_eq!(parsed.introduction, "");
    }

    #[test]
    fn introduction_stops_before_analysis() {
        let text = append_analysis(&sample().to_text(), "SUMMARY:\nA summary.");
        let parsed = PaperRecord::parse(&text);
        assert_eq!(parsed.introduction, sample().introduction);
        assert!(!parsed.introduction.contains("SUMMARY"));
    }

    #[test]
    fn append_is_idempotent() {
        let base = sample().to_text();
        let once = append_analysis(&base, "SUMMARY:\nFirst analysis.");
        let twice = append_analysis(&once, "SUMMARY:\nSecond analysis.");

        assert_eq!(twice.matches(ANALYSIS_LABEL).count(), 1);
        assert!(twice.contains("Second analysis."));
        assert!(!twice.contains("First analysis."));
        // The record fields survive the rewrite.
        assert_eq!(PaperRecord::parse(&twice), sample());
    }

    #[test]
    fn analysis_body_extracts_full_tail() {
        let text = append_analysis(
            &sample().to_text(),
            "SUMMARY:\nS.\n\nKEYWORDS:\na, b",
        );
        let body = analysis_body(&text).unwrap();
        assert!(body.starts_with("SUMMARY:"));
        assert!(body.ends_with("a, b"));
    }

    #[test]
    fn section_terminates_on_multiword_label() {
        let text = "OBJECTIVES:\nFind things.\n\nRESEARCH GAP/PROBLEM:\nUnknown.\n";
        assert_eq!(section(text, "OBJECTIVES:").unwrap(), "Find things.");
        assert_eq!(
            section(text, "RESEARCH GAP/PROBLEM:").unwrap(),
            "Unknown."
        );
    }

    #[test]
    fn section_keeps_internal_blank_lines() {
        let text = "INTRODUCTION:\nPara one.\n\nPara two.\n\nKEYWORDS:\nx\n";
        assert_eq!(
            section(text, "INTRODUCTION:").unwrap(),
            "Para one.\n\nPara two."
        );
    }

    #[test]
    fn label_must_start_a_line() {
        let text = "notes about the TITLE: marker\nTITLE: Real Title\n";
        assert_eq!(line_field(text, "TITLE:").unwrap(), "Real Title");
    }

    #[test]
    fn is_label_line_accepts_pipeline_labels() {
        for label in [
            "TITLE: x",
            "ABSTRACT:",
            "CLAUDE ANALYSIS:",
            "RESEARCH GAP/PROBLEM:",
        ] {
            assert!(is_label_line(label), "should accept {label:?}");
        }
        assert!(!is_label_line("Not a label: lowercase head"));
        assert!(!is_label_line("plain text"));
    }
}
