//! # papernotes
//!
//! Convert academic PDF papers into structured Markdown notes using the
//! Claude API.
//!
//! ## Why this crate?
//!
//! Reading a paper produces three artifacts worth keeping: what it says
//! (summary), why it matters (research gap and objectives), and how to
//! find it again (tags). Collecting those by hand for a folder of PDFs is
//! an afternoon of copy-paste. This crate automates the mechanical part:
//! extract the text, let a model do the summarizing, and render notes
//! that drop straight into an Obsidian-style knowledge base.
//!
//! ## Pipeline Overview
//!
//! ```text
//! papers/*.pdf
//!  │
//!  ├─ 1. extract   title/authors/year/introduction from each PDF
//!  │               (+ abstract from Zotero, when configured)
//!  │               → records/Author_Year.txt
//!  ├─ 2. analyze   send record text to Claude, append the
//!  │               CLAUDE ANALYSIS: section in place
//!  └─ 3. markdown  render YAML frontmatter + H1 sections
//!                  → notes/Author_Year.md
//! ```
//!
//! The flat-text record is the contract between stages: stages 2 and 3
//! re-derive everything by parsing the same text stage 1 wrote, so the
//! stages can be run independently, re-run safely (analysis replacement
//! is idempotent), and inspected with a plain text editor in between.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use papernotes::{stages, ClaudeClient, AnalyzeOptions, RenderOptions};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Stage 1: PDFs → records (Zotero lookup skipped without credentials)
//!     stages::extract_folder(Path::new("papers"), Path::new("records"), None, None).await?;
//!
//!     // Stage 2: records → records + analysis (needs ANTHROPIC_API_KEY)
//!     let claude = ClaudeClient::from_env()?;
//!     stages::analyze_folder(
//!         Path::new("records"),
//!         &claude,
//!         &AnalyzeOptions::default(),
//!         None,
//!     )
//!     .await?;
//!
//!     // Stage 3: records → markdown notes
//!     stages::render_folder(
//!         Path::new("records"),
//!         Path::new("notes"),
//!         &RenderOptions::default(),
//!         None,
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod stages;
pub mod zotero;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnalyzeOptions, ClaudeConfig, RenderOptions, ZoteroConfig};
pub use error::NotesError;
pub use llm::ClaudeClient;
pub use pipeline::analysis::AnalysisResult;
pub use progress::BatchProgress;
pub use record::PaperRecord;
pub use stages::{FileOutcome, StageSummary};
pub use zotero::ZoteroClient;
