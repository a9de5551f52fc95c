//! Keyword singularization by suffix rule.
//!
//! Three ordered rules, first matching suffix wins. This is a heuristic,
//! not a linguistic singularizer: it is known to mishandle irregular
//! plurals ("analyses" becomes "analys"). That is a documented limitation
//! of the rule set, not a defect to fix — tags stay stable as long as the
//! rules stay stable.

/// Singularize one keyword.
pub fn singularize(keyword: &str) -> String {
    if keyword.ends_with("ies") && !keyword.ends_with("series") {
        format!("{}y", &keyword[..keyword.len() - 3])
    } else if keyword.ends_with("es")
        && !keyword.ends_with("species")
        && !keyword.ends_with("series")
    {
        keyword[..keyword.len() - 2].to_string()
    } else if keyword.ends_with('s')
        && !keyword.ends_with("ss")
        && !keyword.ends_with("is")
        && !keyword.ends_with("us")
        && !keyword.ends_with("os")
    {
        keyword[..keyword.len() - 1].to_string()
    } else {
        keyword.to_string()
    }
}

/// Singularize a keyword list, dropping entries that end up empty.
pub fn singularize_all(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| singularize(k))
        .filter(|k| !k.is_empty())
        .collect()
}
