//! Prompts for the Claude analysis call.
//!
//! Centralising the prompt here keeps it a single source of truth — the
//! four section labels below are load-bearing, because the analysis parser
//! and the markdown renderer both key off them. Change a label here and
//! the record format changes with it.

/// System prompt for the analysis request.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert at analyzing scientific literature. \
Focus on extracting the most important information accurately.";

/// Build the user prompt embedding title, abstract, and introduction.
///
/// Returns `None` when both bodies are empty — there is nothing to send.
/// Whichever of abstract/introduction is available is included; the model
/// works from either.
pub fn build_analysis_prompt(title: &str, abstract_text: &str, introduction: &str) -> Option<String> {
    let mut analysis_text = String::new();
    if !abstract_text.is_empty() {
        analysis_text.push_str(&format!("Abstract:\n{abstract_text}\n\n"));
    }
    if !introduction.is_empty() {
        analysis_text.push_str(&format!("Introduction:\n{introduction}\n\n"));
    }
    if analysis_text.is_empty() {
        return None;
    }

    Some(format!(
        r#"I have content from a scientific paper that I need you to analyze. Please:

1. Summarize the key points in 4-6 sentences
2. Identify the main research gap or problem being addressed
3. Extract the paper's apparent objectives or research questions
4. Generate EXACTLY 5 important keywords/concepts. Choose only the most critical 5 terms that best represent the paper.

When generating keywords, please follow these rules:
- Use SINGULAR forms only (e.g., "biomarker" not "biomarkers")
- Use underscores instead of spaces (e.g., "gene_expression")
- Maintain standard capitalization for abbreviations (RNA-Seq, miRNA, DNA)

Title: {title}

{analysis_text}Respond in this format:
SUMMARY:
[Your summary here]

RESEARCH GAP/PROBLEM:
[Identified research gap or problem]

OBJECTIVES:
[Research objectives/questions]

KEYWORDS:
[5 singular keywords separated by commas]"#
    ))
}
