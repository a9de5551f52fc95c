//! PDF access: document metadata and plain-text extraction via lopdf.
//!
//! The pipeline consumes exactly two capabilities from the PDF layer:
//! per-document metadata strings (title / author / dates from the Info
//! dictionary) and per-page plain text. Everything else about PDF parsing
//! is delegated to lopdf.
//!
//! Info-dictionary strings are raw PDF string bytes: either PDFDocEncoding
//! (treated as Latin-ish UTF-8 here) or UTF-16BE with a BOM prefix. Both
//! forms appear in the wild and both are decoded here.

use crate::error::NotesError;
use lopdf::{Dictionary, Document};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sentinel stored in the record when no introduction could be located.
pub const INTRO_FAILED: &str = "Introduction extraction failed.";

/// Pages scanned when hunting for the introduction section.
const INTRO_MAX_PAGES: u32 = 6;

/// Length cap on the extracted introduction.
const INTRO_MAX_CHARS: usize = 8000;

/// Document metadata strings from the Info dictionary.
#[derive(Debug, Clone, Default)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
}

/// An opened paper PDF.
#[derive(Debug)]
pub struct PaperPdf {
    doc: Document,
    path: PathBuf,
}

impl PaperPdf {
    /// Open and validate a PDF file.
    ///
    /// Validates the `%PDF` magic bytes before handing the file to lopdf,
    /// so an accidental `.pdf`-named text file produces a clear error
    /// instead of a parser backtrace.
    pub fn open(path: &Path) -> Result<Self, NotesError> {
        let mut file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NotesError::InputNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                NotesError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let mut magic = [0u8; 4];
        if file.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
            return Err(NotesError::NotAPdf {
                path: path.to_path_buf(),
                magic,
            });
        }
        drop(file);

        let doc = Document::load(path).map_err(|e| NotesError::CorruptPdf {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        debug!("Opened PDF: {}", path.display());
        Ok(Self {
            doc,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Metadata strings from the trailer's Info dictionary, if any.
    pub fn metadata(&self) -> PdfMetadata {
        let Some(info) = self.info_dict() else {
            return PdfMetadata::default();
        };
        PdfMetadata {
            title: dict_string(info, b"Title"),
            author: dict_string(info, b"Author"),
            creation_date: dict_string(info, b"CreationDate"),
            mod_date: dict_string(info, b"ModDate"),
        }
    }

    /// Plain text of a single page (1-indexed); `None` when extraction fails.
    pub fn page_text(&self, page: u32) -> Option<String> {
        self.doc.extract_text(&[page]).ok()
    }

    /// Plain text of page 1, or empty when the page cannot be read.
    pub fn first_page_text(&self) -> String {
        self.page_text(1).unwrap_or_default()
    }

    /// Extract the introduction section from the leading pages.
    ///
    /// Degrades to the [`INTRO_FAILED`] sentinel so stage 1 always writes
    /// a complete record.
    pub fn extract_introduction(&self) -> String {
        let pages = self.page_count().min(INTRO_MAX_PAGES as usize) as u32;
        let mut text = String::new();
        for page in 1..=pages {
            if let Some(t) = self.page_text(page) {
                text.push_str(&t);
                text.push('\n');
            }
        }
        introduction_from_text(&text).unwrap_or_else(|| INTRO_FAILED.to_string())
    }

    fn info_dict(&self) -> Option<&Dictionary> {
        let info = self.doc.trailer.get(b"Info").ok()?;
        let reference = info.as_reference().ok()?;
        self.doc.get_object(reference).ok()?.as_dict().ok()
    }
}

/// Read a string entry out of a PDF dictionary, decoding UTF-16BE when the
/// bytes carry a BOM.
fn dict_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .ok()
        .and_then(|obj| obj.as_str().ok())
        .map(decode_pdf_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (decoded, ..) = encoding_rs::UTF_16BE.decode(&bytes[2..]);
        decoded.into_owned()
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

// ── Introduction heuristic ───────────────────────────────────────────────

static RE_INTRO_HEADING: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"(?m)^\s*(?:\d{1,2}[.)]?\s*)?introduction\s*$")
        .case_insensitive(true)
        .build()
        .expect("intro-heading regex")
});

static RE_SECTION_END: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(
        r"(?m)^\s*(?:\d{1,2}[.)]?\s*)?(?:materials and methods|materials|methods|methodology|background|related work|results|discussion|literature review|study area|theory|conclusions?)\s*$|^\s*\d{1,2}[.)]\s+\S",
    )
    .case_insensitive(true)
    .build()
    .expect("section-end regex")
});

/// Pull the introduction body out of raw document text.
///
/// Starts after a (possibly numbered) "Introduction" heading line and runs
/// to the next section heading, capped at a fixed character length.
pub fn introduction_from_text(text: &str) -> Option<String> {
    let heading = RE_INTRO_HEADING.find(text)?;
    let tail = &text[heading.end()..];

    let body = match RE_SECTION_END.find(tail) {
        Some(end) => &tail[..end.start()],
        None => tail,
    };

    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    Some(body.chars().take(INTRO_MAX_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_missing_file_is_input_not_found() {
        let err = PaperPdf::open(Path::new("/nonexistent/paper.pdf")).unwrap_err();
        assert!(matches!(err, NotesError::InputNotFound { .. }), "got {err:?}");
    }

    #[test]
    fn open_non_pdf_reports_magic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world, definitely not a pdf").unwrap();
        let err = PaperPdf::open(file.path()).unwrap_err();
        assert!(matches!(err, NotesError::NotAPdf { .. }), "got {err:?}");
    }

    #[test]
    fn decode_handles_utf16be_bom() {
        // "Ab" in UTF-16BE with BOM.
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x62];
        assert_eq!(decode_pdf_string(&bytes), "Ab");
        assert_eq!(decode_pdf_string(b"plain title"), "plain title");
    }

    #[test]
    fn introduction_between_headings() {
        let text = "Title page\nAbstract text here.\n\n1. Introduction\n\
Foraminifera are widespread.\nThey record oxygen conditions.\n\n\
2. Materials and Methods\nWe collected cores.";
        let intro = introduction_from_text(text).unwrap();
        assert!(intro.starts_with("Foraminifera are widespread."));
        assert!(intro.ends_with("They record oxygen conditions."));
        assert!(!intro.contains("cores"));
    }

    #[test]
    fn bare_heading_and_numbered_end() {
        let text = "INTRODUCTION\nBody text.\nMore body.\n2) Data\nrest";
        let intro = introduction_from_text(text).unwrap();
        assert_eq!(intro, "Body text.\nMore body.");
    }

    #[test]
    fn runs_to_end_without_terminator() {
        let text = "Introduction\nOnly body until the end.";
        assert_eq!(
            introduction_from_text(text).unwrap(),
            "Only body until the end."
        );
    }

    #[test]
    fn no_heading_means_none() {
        assert_eq!(introduction_from_text("No sections at all."), None);
        assert_eq!(introduction_from_text("Introduction\n\n\n"), None);
    }

    #[test]
    fn length_capped() {
        let text = format!("Introduction\n{}", "x".repeat(INTRO_MAX_CHARS * 2));
        assert_eq!(
            introduction_from_text(&text).unwrap().chars().count(),
            INTRO_MAX_CHARS
        );
    }
}
