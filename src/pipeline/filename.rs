//! Filename normalization: map an arbitrary source filename to a canonical
//! `Author_Year` identifier.
//!
//! Reference managers export wildly different punctuation styles, so the
//! normalizer tries an ordered list of patterns, first match wins. Later
//! patterns are strictly more permissive than earlier ones — the order is
//! what preserves clean output when a filename matches more than one rule.
//!
//! 1. `Author - Year - Title`  (Zotero's default export style)
//! 2. `Author_Year_Title`
//! 3. anything, then a bare 4-digit year between separators
//! 4. fallback: squash every non-word character to `_`

use once_cell::sync::Lazy;
use regex::Regex;

static RE_DASH_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*-\s*(\d{4})\s*-\s*(.*)").expect("dash-style regex"));

static RE_UNDERSCORE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)_(\d{4})_(.*)").expect("underscore-style regex"));

static RE_LOOSE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.*?)(?:\s|_)(\d{4})(?:\s|_)").expect("loose-year regex"));

static RE_NON_WORD_OR_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w_]").expect("cleanup regex"));

static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").expect("fallback regex"));

static RE_UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("collapse regex"));

/// Normalize a filename stem (no directory, no extension) to `Author_Year`.
pub fn normalize_stem(stem: &str) -> String {
    // Pattern 1: 'Author et al. - Year - Title'
    if let Some(caps) = RE_DASH_STYLE.captures(stem) {
        let author = clean_author(caps[1].trim().replace('.', ""));
        return format!("{}_{}", author, &caps[2]);
    }

    // Pattern 2: 'Author et al_Year_Title'
    if let Some(caps) = RE_UNDERSCORE_STYLE.captures(stem) {
        let author = clean_author(caps[1].to_string());
        return format!("{}_{}", author, &caps[2]);
    }

    // Pattern 3: a bare year between whitespace/underscore separators,
    // with whatever precedes it treated as the author.
    if let Some(caps) = RE_LOOSE_YEAR.captures(stem) {
        let author = clean_author(caps[1].replace('.', "").trim().to_string());
        return format!("{}_{}", author, &caps[2]);
    }

    // Fallback: just clean up the whole stem.
    let cleaned = RE_NON_WORD.replace_all(stem, "_");
    RE_UNDERSCORE_RUNS.replace_all(&cleaned, "_").into_owned()
}

/// Shared author cleanup: spaces to underscores, then strip everything that
/// is not a word character or underscore.
fn clean_author(author: String) -> String {
    let author = author.replace(' ', "_");
    RE_NON_WORD_OR_UNDERSCORE
        .replace_all(&author, "")
        .into_owned()
}
