//! Error types for the papernotes library.
//!
//! The pipeline distinguishes two failure modes:
//!
//! * [`NotesError`] — **Per-file fatal**: the current file cannot be
//!   processed at all (missing path, wrong extension, unreadable PDF,
//!   missing API key, API failure). Returned as `Err(NotesError)` from the
//!   single-file stage functions. Batch drivers catch it, log, and move on
//!   to the next file; only a missing API key aborts a whole analyze batch.
//!
//! * **Degraded fields** — extraction and lookup failures inside a file
//!   never surface as errors. A title that cannot be found becomes
//!   "Unknown Title", a failed Zotero lookup becomes an empty abstract,
//!   a malformed LLM response becomes empty analysis sections. The pipeline
//!   always produces output for a readable input.
//!
//! The split keeps batch runs resilient: one bad paper costs one record,
//! never the run.

use std::path::PathBuf;
use thiserror::Error;

/// All per-file errors returned by the papernotes library.
#[derive(Debug, Error)]
pub enum NotesError {
    // ── Precondition errors ───────────────────────────────────────────────
    /// Input file or folder was not found at the given path.
    #[error("Input not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// The input file does not carry the extension the stage expects.
    #[error("'{path}' is not a .{expected} file")]
    WrongExtension { path: PathBuf, expected: &'static str },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// lopdf could not parse the document structure.
    #[error("PDF '{path}' could not be parsed: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    // ── Record errors ─────────────────────────────────────────────────────
    /// The record holds neither an abstract nor an introduction, so there
    /// is nothing to send to the LLM.
    #[error("Record '{path}' has no abstract or introduction to analyze")]
    EmptyRecord { path: PathBuf },

    /// Stage 3 found no analysis section in the record.
    #[error("Record '{path}' has no analysis section\nRun `papernotes analyze` on it first.")]
    NoAnalysis { path: PathBuf },

    // ── API errors ────────────────────────────────────────────────────────
    /// A required API credential is missing from the environment.
    #[error("Missing API credential: set the {var} environment variable")]
    MissingCredential { var: &'static str },

    /// The Zotero API call failed (network, auth, or non-2xx status).
    #[error("Zotero API request failed: {detail}")]
    ZoteroApi { detail: String },

    /// The Claude API call failed (network, auth, or non-2xx status).
    #[error("Claude API request failed: {detail}")]
    LlmApi { detail: String },

    /// The Claude API answered, but not in the shape we expect.
    #[error("Unexpected Claude API response: {detail}")]
    LlmResponse { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Reading an input file failed.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_extension_display() {
        let e = NotesError::WrongExtension {
            path: PathBuf::from("notes.docx"),
            expected: "pdf",
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.docx"), "got: {msg}");
        assert!(msg.contains(".pdf"), "got: {msg}");
    }

    #[test]
    fn missing_credential_names_the_variable() {
        let e = NotesError::MissingCredential {
            var: "ANTHROPIC_API_KEY",
        };
        assert!(e.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn no_analysis_hints_at_next_step() {
        let e = NotesError::NoAnalysis {
            path: PathBuf::from("Smith_2021.txt"),
        };
        assert!(e.to_string().contains("analyze"));
    }
}
