//! Markdown rendering: frontmatter plus fixed-order H1 sections.
//!
//! The output is the final artifact of the pipeline — a note ready for a
//! personal knowledge base (Obsidian-style): YAML frontmatter carrying
//! title/author/year/tags, then one H1 section per populated field. A
//! section with empty content is omitted entirely, never rendered as a
//! bare heading.

use crate::pipeline::analysis::AnalysisResult;
use crate::pipeline::keywords::singularize_all;
use crate::record::PaperRecord;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_YAML_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s,;.-]").expect("yaml-unsafe regex"));

static RE_WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

static RE_GAP_LABEL_IN_SUMMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)RESEARCH GAP/PROBLEM:.*").expect("gap-label regex"));

/// Render a complete markdown note from a record and its analysis.
pub fn render_note(record: &PaperRecord, analysis: &AnalysisResult) -> String {
    let tags = singularize_all(&analysis.keywords);

    // Guard against a model response that ran the gap section into the
    // summary on a single-newline boundary.
    let summary = RE_GAP_LABEL_IN_SUMMARY
        .replace(&analysis.summary, "")
        .trim()
        .to_string();

    let mut md = String::with_capacity(1024);

    md.push_str(&frontmatter(record, &tags));

    push_section(&mut md, "TITLE", &record.title);
    push_section(&mut md, "AUTHOR", &record.authors);
    push_section(&mut md, "SUMMARY", &summary);
    if !tags.is_empty() {
        let hashtags: Vec<String> = tags.iter().map(|t| format!("#{t}")).collect();
        push_section(&mut md, "KEYWORDS", &hashtags.join(", "));
    }
    push_section(&mut md, "RESEARCH GAP/PROBLEM", &analysis.gap);
    push_section(&mut md, "OBJECTIVES", &analysis.objectives);
    push_section(&mut md, "ABSTRACT", &record.abstract_text);

    md
}

/// Clean an author string for the frontmatter: strip everything outside
/// word chars, whitespace, commas, semicolons, periods and hyphens, then
/// collapse whitespace runs.
pub fn clean_author(author: &str) -> String {
    let cleaned = RE_YAML_UNSAFE.replace_all(author, "");
    RE_WHITESPACE_RUNS
        .replace_all(&cleaned, " ")
        .trim()
        .to_string()
}

/// The `---`-delimited YAML frontmatter block.
fn frontmatter(record: &PaperRecord, tags: &[String]) -> String {
    let mut yaml = String::from("---\n");
    yaml.push_str(&format!("title: \"{}\"\n", escape_yaml(&record.title)));
    yaml.push_str(&format!(
        "author: \"{}\"\n",
        escape_yaml(&clean_author(&record.authors))
    ));
    yaml.push_str(&format!("year: \"{}\"\n", escape_yaml(&record.year)));
    if tags.is_empty() {
        yaml.push_str("tags: []\n");
    } else {
        yaml.push_str("tags:\n");
        for tag in tags {
            yaml.push_str(&format!("- {tag}\n"));
        }
    }
    yaml.push_str("---\n\n");
    yaml
}

fn escape_yaml(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Append `# HEADING\nbody\n\n`, or nothing when the body is empty.
fn push_section(md: &mut String, heading: &str, body: &str) {
    if body.is_empty() {
        return;
    }
    md.push_str(&format!("# {heading}\n{body}\n\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PaperRecord {
        PaperRecord {
            title: "Deep Dwelling Foraminifera".to_string(),
            authors: "E. Revkov*, A. Smith†".to_string(),
            year: "2023".to_string(),
            abstract_text: "An abstract.".to_string(),
            introduction: "An introduction.".to_string(),
        }
    }

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            summary: "A summary.".to_string(),
            gap: "A gap.".to_string(),
            objectives: "Objectives.".to_string(),
            keywords: vec!["biomarkers".to_string(), "species".to_string()],
        }
    }

    #[test]
    fn sections_in_fixed_order() {
        let md = render_note(&record(), &analysis());
        let order: Vec<usize> = [
            "# TITLE",
            "# AUTHOR",
            "# SUMMARY",
            "# KEYWORDS",
            "# RESEARCH GAP/PROBLEM",
            "# OBJECTIVES",
            "# ABSTRACT",
        ]
        .iter()
        .map(|h| md.find(h).unwrap_or_else(|| panic!("missing {h}")))
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "order: {order:?}");
    }

    #[test]
    fn empty_gap_omits_heading() {
        let analysis = AnalysisResult {
            gap: String::new(),
            ..analysis()
        };
        let md = render_note(&record(), &analysis);
        assert!(!md.contains("# RESEARCH GAP/PROBLEM"));
        assert!(md.contains("# OBJECTIVES"));
    }

    #[test]
    fn empty_abstract_omits_heading() {
        let record = PaperRecord {
            abstract_text: String::new(),
            ..record()
        };
        let md = render_note(&record, &analysis());
        assert!(!md.contains("# ABSTRACT"));
    }

    #[test]
    fn keywords_rendered_as_hashtags_singularized() {
        let md = render_note(&record(), &analysis());
        assert!(md.contains("# KEYWORDS\n#biomarker, #species\n"));
    }

    #[test]
    fn tags_listed_in_frontmatter() {
        let md = render_note(&record(), &analysis());
        assert!(md.starts_with("---\n"));
        assert!(md.contains("tags:\n- biomarker\n- species\n"));
    }

    #[test]
    fn no_keywords_renders_empty_tag_list_and_no_section() {
        let analysis = AnalysisResult {
            keywords: Vec::new(),
            ..analysis()
        };
        let md = render_note(&record(), &analysis);
        assert!(md.contains("tags: []"));
        assert!(!md.contains("# KEYWORDS"));
    }

    #[test]
    fn author_cleaned_for_frontmatter_only() {
        let md = render_note(&record(), &analysis());
        // Frontmatter: daggers and asterisks stripped, whitespace collapsed.
        assert!(md.contains("author: \"E. Revkov, A. Smith\"\n"));
        // Body keeps the original author line.
        assert!(md.contains("# AUTHOR\nE. Revkov*, A. Smith†\n"));
    }

    #[test]
    fn clean_author_collapses_whitespace() {
        assert_eq!(clean_author("  A.  B.\tSmith ; C. Jones "), "A. B. Smith ; C. Jones");
    }

    #[test]
    fn stray_gap_label_trimmed_from_summary() {
        let analysis = AnalysisResult {
            summary: "Real summary.\nRESEARCH GAP/PROBLEM: leaked text".to_string(),
            ..analysis()
        };
        let md = render_note(&record(), &analysis);
        assert!(md.contains("# SUMMARY\nReal summary.\n"));
        assert!(!md.contains("leaked text"));
    }
}
