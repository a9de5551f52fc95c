//! Text-processing stages of the paper pipeline.
//!
//! Each submodule implements exactly one transformation and is a pure
//! function over immutable input wherever possible, which keeps every
//! heuristic independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! pdf ──▶ extract ──▶ filename ──▶ [record] ──▶ analysis ──▶ keywords ──▶ markdown
//! (lopdf)  (fields)   (Author_Year)  (flat text)  (LLM reply)  (singular)   (note)
//! ```
//!
//! 1. [`pdf`]      — metadata strings and page text from the document
//! 2. [`extract`]  — title/authors/year via metadata-first fallback chains
//! 3. [`filename`] — canonical `Author_Year` output name
//! 4. [`analysis`] — structured fields out of the LLM's free-text reply
//! 5. [`keywords`] — suffix-rule singularization for tags
//! 6. [`markdown`] — frontmatter + fixed-order sections

pub mod analysis;
pub mod extract;
pub mod filename;
pub mod keywords;
pub mod markdown;
pub mod pdf;
