//! Field extraction: title, authors, and year from PDF metadata and text.
//!
//! Every field follows the same shape: trust the document metadata first,
//! fall back to a first-page heuristic when the metadata is missing or a
//! known placeholder, and degrade to a sentinel value rather than fail.
//! The rules are ordered by observed reliability — embedded metadata is
//! usually correct when present, curated filenames beat metadata for the
//! year, and in-text scanning is a last resort scoped to the top of page 1
//! to avoid false positives from citations in the body.
//!
//! All functions here are pure over immutable input strings; PDF-level
//! failures are handled by the caller, which substitutes the sentinel
//! triple ("Unknown Title", "Unknown Author", "Unknown Year").

use crate::pipeline::pdf::PdfMetadata;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Metadata titles that mean "no real title was set".
const TITLE_PLACEHOLDERS: [&str; 3] = ["untitled", "document", ""];

/// How many first-page lines to scan for an author line.
const AUTHOR_SCAN_LINES: usize = 15;

/// How much of page 1 to scan for a bare year.
const YEAR_SCAN_CHARS: usize = 1000;

static RE_AUTHOR_LINE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"by|authors?:|et al\.|\bcorresponding author\b")
        .case_insensitive(true)
        .build()
        .expect("author-line regex")
});

static RE_AUTHOR_PREFIX: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^\s*(by|authors?:|corresponding author:?)\s*")
        .case_insensitive(true)
        .build()
        .expect("author-prefix regex")
});

static RE_YEAR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("year regex"));

static RE_PDF_DATE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"D:(\d{4})").expect("pdf-date regex"));

static RE_TEXT_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("text-year regex"));

/// Derive (title, authors) from document metadata with first-page fallbacks.
pub fn extract_title_authors(meta: &PdfMetadata, first_page: &str) -> (String, String) {
    let mut title = meta.title.as_deref().unwrap_or("").trim().to_string();
    let mut authors = meta.author.as_deref().unwrap_or("").trim().to_string();

    if TITLE_PLACEHOLDERS.contains(&title.to_lowercase().as_str()) {
        // Assume the first non-blank line of page 1 is the title.
        if let Some(line) = first_page.lines().find(|l| !l.trim().is_empty()) {
            title = line.trim().to_string();
        }
    }

    if authors.is_empty() || authors == "Unknown Author" {
        for line in first_page.lines().take(AUTHOR_SCAN_LINES) {
            if RE_AUTHOR_LINE.is_match(line) {
                authors = RE_AUTHOR_PREFIX.replace(line.trim(), "").to_string();
                break;
            }
        }
    }

    (title, authors)
}

/// Derive the publication year, most-reliable source first.
///
/// 1. A 4-digit run in the source filename (curated by reference managers).
/// 2. A `D:YYYY` prefix in the metadata creation or modification date.
/// 3. A 19xx/20xx token in the first 1000 characters of page-1 text.
/// 4. The sentinel "Unknown Year".
pub fn extract_year(filename: &str, meta: &PdfMetadata, first_page: &str) -> String {
    if let Some(m) = RE_YEAR_DIGITS.find(filename) {
        return m.as_str().to_string();
    }

    for date in [meta.creation_date.as_deref(), meta.mod_date.as_deref()]
        .into_iter()
        .flatten()
    {
        if let Some(caps) = RE_PDF_DATE_YEAR.captures(date) {
            return caps[1].to_string();
        }
    }

    let head: String = first_page.chars().take(YEAR_SCAN_CHARS).collect();
    if let Some(m) = RE_TEXT_YEAR.find(&head) {
        return m.as_str().to_string();
    }

    "Unknown Year".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(title: &str, author: &str) -> PdfMetadata {
        PdfMetadata {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            creation_date: None,
            mod_date: None,
        }
    }

    #[test]
    fn metadata_title_preferred() {
        let (title, _) = extract_title_authors(
            &meta("Real Title", "J. Doe"),
            "First page line\nmore text",
        );
        assert_eq!(title, "Real Title");
    }

    #[test]
    fn placeholder_title_falls_back_to_first_line() {
        for placeholder in ["Untitled", "document", "", "DOCUMENT"] {
            let (title, _) = extract_title_authors(
                &meta(placeholder, "J. Doe"),
                "\n  \nDeep Dwelling Foraminifera\nE. Revkov",
            );
            assert_eq!(title, "Deep Dwelling Foraminifera", "for {placeholder:?}");
        }
    }

    #[test]
    fn missing_author_found_by_pattern() {
        let page = "A Title\nsubtitle text\nby E. Revkov and A. Smith\nAffiliation";
        let (_, authors) = extract_title_authors(&meta("T", ""), page);
        assert_eq!(authors, "E. Revkov and A. Smith");
    }

    #[test]
    fn author_prefix_stripped_case_insensitively() {
        let page = "Title\nAUTHORS: Jane Roe, John Doe";
        let (_, authors) = extract_title_authors(&meta("T", "Unknown Author"), page);
        assert_eq!(authors, "Jane Roe, John Doe");
    }

    #[test]
    fn et_al_line_kept_verbatim() {
        let page = "Title\nRevkov et al.\nUniversity";
        let (_, authors) = extract_title_authors(&meta("T", ""), page);
        assert_eq!(authors, "Revkov et al.");
    }

    #[test]
    fn author_scan_limited_to_first_lines() {
        let mut page = String::from("Title\n");
        page.push_str(&"filler\n".repeat(20));
        page.push_str("by Too Late");
        let (_, authors) = extract_title_authors(&meta("T", ""), &page);
        assert_eq!(authors, "");
    }

    #[test]
    fn year_from_filename_wins() {
        let m = PdfMetadata {
            creation_date: Some("D:19990101".to_string()),
            ..meta("T", "A")
        };
        assert_eq!(extract_year("Revkov_2023_paper.pdf", &m, "© 2001"), "2023");
    }

    #[test]
    fn year_from_metadata_date() {
        let m = PdfMetadata {
            creation_date: Some("D:20210415120000Z".to_string()),
            ..meta("T", "A")
        };
        assert_eq!(extract_year("paper.pdf", &m, ""), "2021");
    }

    #[test]
    fn year_from_mod_date_when_creation_missing() {
        let m = PdfMetadata {
            mod_date: Some("D:20190704".to_string()),
            ..meta("T", "A")
        };
        assert_eq!(extract_year("paper.pdf", &m, ""), "2019");
    }

    #[test]
    fn year_from_page_text_is_scoped() {
        let m = meta("T", "A");
        assert_eq!(extract_year("paper.pdf", &m, "Published 2015."), "2015");

        // A year beyond the scan window is not picked up.
        let mut page = "x".repeat(YEAR_SCAN_CHARS);
        page.push_str(" 2015");
        assert_eq!(extract_year("paper.pdf", &m, &page), "Unknown Year");
    }

    #[test]
    fn year_sentinel_when_nothing_matches() {
        assert_eq!(
            extract_year("paper.pdf", &meta("T", "A"), "no dates here"),
            "Unknown Year"
        );
    }
}
