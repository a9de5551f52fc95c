//! Zotero Web API client for abstract lookup.
//!
//! Stage 1 extracts title/authors/year from the PDF itself, but abstracts
//! are often images or oddly segmented in the PDF text layer. When Zotero
//! credentials are configured, the extracted title is searched against the
//! user's library and the best-matching item's `abstractNote` fills the
//! record's ABSTRACT section.
//!
//! Matching is deliberately fuzzy: extracted titles carry OCR noise and
//! truncations, so an exact-equality match would almost never fire. A
//! candidate matches when either cleaned title contains the other
//! (case-insensitive), optionally filtered by the year appearing in the
//! item's date. With no containment match, the top search result is used.
//!
//! Every failure path — missing credentials, network error, no match,
//! empty abstract — degrades to `None` with a log line. An abstract is an
//! optional enrichment, never a reason to fail a file.

use crate::config::ZoteroConfig;
use crate::error::NotesError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const ZOTERO_API_URL: &str = "https://api.zotero.org";

const USER_AGENT: &str = concat!("papernotes/", env!("CARGO_PKG_VERSION"));

/// Search results are capped; the first five hits are plenty for a
/// title-phrase query against a personal library.
const SEARCH_LIMIT: usize = 5;

static RE_NON_WORD_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("title-clean regex"));

/// One item from a Zotero search response.
#[derive(Debug, Deserialize)]
pub struct ZoteroItem {
    #[serde(default)]
    pub data: ZoteroItemData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ZoteroItemData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "abstractNote", default)]
    pub abstract_note: String,
}

/// Authenticated Zotero Web API client.
pub struct ZoteroClient {
    http: reqwest::Client,
    items_url: String,
    api_key: String,
}

impl ZoteroClient {
    /// Build a client and verify the credentials with a 1-item request.
    pub async fn connect(config: ZoteroConfig) -> Result<Self, NotesError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| NotesError::ZoteroApi {
                detail: format!("failed to build HTTP client: {e}"),
            })?;

        let client = Self {
            http,
            items_url: format!(
                "{ZOTERO_API_URL}/{}s/{}/items",
                config.library_type, config.library_id
            ),
            api_key: config.api_key,
        };

        // Touch the library once so bad credentials surface at startup
        // rather than as a silent empty abstract on every file.
        client.search("", 1).await?;
        info!("Connected to Zotero API");
        Ok(client)
    }

    /// Look up the abstract for a paper by fuzzy title match.
    pub async fn find_abstract(&self, title: &str, year: &str) -> Option<String> {
        if title.is_empty() {
            return None;
        }

        let clean_title = clean_title_for_search(title);
        let query = search_terms(&clean_title);

        info!("Searching Zotero for: {query}");
        let items = match self.search(&query, SEARCH_LIMIT).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Zotero search failed: {e}");
                return None;
            }
        };

        if items.is_empty() {
            info!("No results found in Zotero");
            return None;
        }

        let item = best_match(&items, &clean_title, year);
        let abstract_note = item.data.abstract_note.trim();
        if abstract_note.is_empty() {
            info!("No abstract found in Zotero for '{}'", item.data.title);
            return None;
        }

        info!(
            "Found abstract in Zotero ({} characters)",
            abstract_note.len()
        );
        Some(abstract_note.to_string())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ZoteroItem>, NotesError> {
        let limit = limit.to_string();
        let response = self
            .http
            .get(&self.items_url)
            .header("Zotero-API-Key", &self.api_key)
            .query(&[("q", query), ("limit", limit.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| NotesError::ZoteroApi {
                detail: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotesError::ZoteroApi {
                detail: format!("HTTP {status}"),
            });
        }

        response.json().await.map_err(|e| NotesError::ZoteroApi {
            detail: format!("response was not valid JSON: {e}"),
        })
    }
}

/// Strip punctuation so OCR noise doesn't poison the search query.
fn clean_title_for_search(title: &str) -> String {
    RE_NON_WORD_SPACE
        .replace_all(title, " ")
        .trim()
        .to_string()
}

/// First few words of the cleaned title — short queries match better than
/// full titles against Zotero's everything-field search.
fn search_terms(clean_title: &str) -> String {
    let words: Vec<&str> = clean_title.split_whitespace().collect();
    if words.len() > 5 {
        words[..5].join(" ")
    } else {
        clean_title.to_string()
    }
}

/// Pick the candidate whose title contains / is contained by ours,
/// honouring the year filter; fall back to the top result.
fn best_match<'a>(items: &'a [ZoteroItem], clean_title: &str, year: &str) -> &'a ZoteroItem {
    let needle = clean_title.to_lowercase();
    for item in items {
        let candidate = item.data.title.to_lowercase();
        if candidate.is_empty() {
            continue;
        }
        if needle.contains(&candidate) || candidate.contains(&needle) {
            if year != "Unknown Year" && !item.data.date.contains(year) {
                debug!("Title match '{}' rejected by year filter", item.data.title);
                continue;
            }
            info!("Found match in Zotero: {}", item.data.title);
            return item;
        }
    }

    info!(
        "No exact match, using closest result: {}",
        items[0].data.title
    );
    &items[0]
}
