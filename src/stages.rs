//! Stage drivers: single-file operations and their folder batch loops.
//!
//! Each stage is a sequential transform of one file into one file:
//!
//! 1. **extract** — `paper.pdf` → `Author_Year.txt` record
//! 2. **analyze** — record → record + `CLAUDE ANALYSIS:` section (in place)
//! 3. **render**  — record → `Author_Year.md` note
//!
//! Batch mode iterates a folder one file at a time, no parallelism —
//! records are independent and the only slow operations are the external
//! API calls, which the analyze stage paces with a fixed courtesy delay.
//!
//! Error policy per file:
//! * extraction failures degrade to sentinel values and still write a
//!   record;
//! * lookup/LLM failures degrade to an empty abstract / a failed file,
//!   logged, batch continues;
//! * precondition failures (missing path, wrong extension) fail that file
//!   with an error — in batch mode they are counted and skipped.
//!
//! All output writes go through a temp-file-then-rename so a crash never
//! leaves a half-written record or note behind.

use crate::config::{AnalyzeOptions, RenderOptions};
use crate::error::NotesError;
use crate::llm::ClaudeClient;
use crate::pipeline::analysis::AnalysisResult;
use crate::pipeline::extract::{extract_title_authors, extract_year};
use crate::pipeline::filename::normalize_stem;
use crate::pipeline::markdown::render_note;
use crate::pipeline::pdf::{PaperPdf, PdfMetadata, INTRO_FAILED};
use crate::progress::BatchProgress;
use crate::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::record::{self, PaperRecord};
use crate::zotero::ZoteroClient;
use std::path::{Path, PathBuf};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Processed,
    Skipped,
}

/// Outcome counts for one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

// ── Stage 1: extract ─────────────────────────────────────────────────────

/// Extract one PDF into a flat-text record in `output_dir`.
///
/// Returns the path of the written record. Unreadable PDF content degrades
/// to sentinel fields — the record is written regardless; only a missing
/// path or wrong extension is an error.
pub async fn extract_pdf(
    pdf_path: &Path,
    output_dir: &Path,
    zotero: Option<&ZoteroClient>,
) -> Result<PathBuf, NotesError> {
    require_extension(pdf_path, "pdf")?;

    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!("Processing: {file_name}");

    let (title, authors, year, introduction) = match PaperPdf::open(pdf_path) {
        Ok(pdf) => {
            let meta = pdf.metadata();
            let first_page = pdf.first_page_text();
            let (title, authors) = extract_title_authors(&meta, &first_page);
            let year = extract_year(&file_name, &meta, &first_page);
            let introduction = pdf.extract_introduction();
            (title, authors, year, introduction)
        }
        Err(NotesError::InputNotFound { path }) => {
            return Err(NotesError::InputNotFound { path });
        }
        Err(e) => {
            // Unreadable content: fall back to sentinels, but the filename
            // can still supply a year.
            error!("Error extracting metadata from PDF: {e}");
            let year = extract_year(&file_name, &PdfMetadata::default(), "");
            (
                "Unknown Title".to_string(),
                "Unknown Author".to_string(),
                year,
                INTRO_FAILED.to_string(),
            )
        }
    };

    info!("Title: {title}");
    info!("Authors: {authors}");
    info!("Year: {year}");

    let abstract_text = match zotero {
        Some(client) => client.find_abstract(&title, &year).await.unwrap_or_default(),
        None => String::new(),
    };

    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base_name = normalize_stem(&stem);
    info!("Base name for output: {base_name}");

    let record = PaperRecord {
        title,
        authors,
        year,
        abstract_text,
        introduction,
    };

    let output_path = output_dir.join(format!("{base_name}.txt"));
    write_atomic(&output_path, &record.to_text()).await?;
    info!("Saved extracted data to: {}", output_path.display());

    Ok(output_path)
}

/// Extract every `*.pdf` in `input_dir`.
pub async fn extract_folder(
    input_dir: &Path,
    output_dir: &Path,
    zotero: Option<&ZoteroClient>,
    progress: Option<&dyn BatchProgress>,
) -> Result<StageSummary, NotesError> {
    let files = files_with_extension(input_dir, "pdf")?;
    info!("Found {} PDF files to process", files.len());

    let mut summary = StageSummary {
        total: files.len(),
        ..StageSummary::default()
    };
    notify(progress, |p| p.on_batch_start(files.len()));

    for (i, pdf_path) in files.iter().enumerate() {
        let name = display_name(pdf_path);
        info!("Processing file {}/{}", i + 1, files.len());
        notify(progress, |p| p.on_file_start(i + 1, files.len(), &name));

        match extract_pdf(pdf_path, output_dir, zotero).await {
            Ok(_) => {
                summary.processed += 1;
                notify(progress, |p| p.on_file_processed(i + 1, files.len(), &name));
            }
            Err(e) => {
                error!("Failed to process {name}: {e}");
                summary.failed += 1;
                notify(progress, |p| {
                    p.on_file_failed(i + 1, files.len(), &name, &e.to_string())
                });
            }
        }
    }

    log_summary("extract", &summary);
    notify(progress, |p| {
        p.on_batch_complete(summary.processed, summary.skipped, summary.failed)
    });
    Ok(summary)
}

// ── Stage 2: analyze ─────────────────────────────────────────────────────

/// Analyze one record with Claude, appending the result in place.
///
/// Skips records that already carry an analysis unless
/// `overwrite` is set. A record with neither abstract nor introduction is
/// an error — there is nothing to analyze.
pub async fn analyze_file(
    txt_path: &Path,
    client: &ClaudeClient,
    overwrite: bool,
) -> Result<FileOutcome, NotesError> {
    require_extension(txt_path, "txt")?;
    let content = read_to_string(txt_path).await?;

    if record::has_analysis(&content) && !overwrite {
        info!(
            "Skipping {} - analysis already exists (use --overwrite to replace)",
            display_name(txt_path)
        );
        return Ok(FileOutcome::Skipped);
    }

    let record = PaperRecord::parse(&content);
    let prompt = build_analysis_prompt(&record.title, &record.abstract_text, &record.introduction)
        .ok_or_else(|| NotesError::EmptyRecord {
            path: txt_path.to_path_buf(),
        })?;

    let response = client.complete(ANALYSIS_SYSTEM_PROMPT, &prompt).await?;

    let updated = record::append_analysis(&content, &response);
    write_atomic(txt_path, &updated).await?;
    info!("Analysis appended to {}", txt_path.display());

    Ok(FileOutcome::Processed)
}

/// Analyze every `*.txt` record in `input_dir`, pausing between API calls.
pub async fn analyze_folder(
    input_dir: &Path,
    client: &ClaudeClient,
    options: &AnalyzeOptions,
    progress: Option<&dyn BatchProgress>,
) -> Result<StageSummary, NotesError> {
    let files = files_with_extension(input_dir, "txt")?;
    info!("Found {} text files to process", files.len());

    let mut summary = StageSummary {
        total: files.len(),
        ..StageSummary::default()
    };
    notify(progress, |p| p.on_batch_start(files.len()));

    for (i, txt_path) in files.iter().enumerate() {
        let name = display_name(txt_path);
        info!("Processing file {}/{}: {name}", i + 1, files.len());
        notify(progress, |p| p.on_file_start(i + 1, files.len(), &name));

        match analyze_file(txt_path, client, options.overwrite).await {
            Ok(FileOutcome::Processed) => {
                summary.processed += 1;
                notify(progress, |p| p.on_file_processed(i + 1, files.len(), &name));
                // Courtesy pause between consecutive API calls.
                if i + 1 < files.len() && options.delay_ms > 0 {
                    sleep(Duration::from_millis(options.delay_ms)).await;
                }
            }
            Ok(FileOutcome::Skipped) => {
                summary.skipped += 1;
                notify(progress, |p| {
                    p.on_file_skipped(i + 1, files.len(), &name, "analysis already exists")
                });
            }
            Err(e) => {
                error!("Analysis failed for {name}: {e}");
                summary.failed += 1;
                notify(progress, |p| {
                    p.on_file_failed(i + 1, files.len(), &name, &e.to_string())
                });
            }
        }
    }

    log_summary("analyze", &summary);
    notify(progress, |p| {
        p.on_batch_complete(summary.processed, summary.skipped, summary.failed)
    });
    Ok(summary)
}

// ── Stage 3: render ──────────────────────────────────────────────────────

/// Render one record into a markdown note in `output_dir`.
///
/// Skips when the target file already exists unless `overwrite` is set.
/// A record with no usable analysis (no summary and no keywords) is an
/// error — the note would be empty boilerplate.
pub async fn render_file(
    txt_path: &Path,
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<FileOutcome, NotesError> {
    require_extension(txt_path, "txt")?;

    let stem = txt_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let md_path = output_dir.join(format!("{stem}.md"));

    if md_path.exists() && !options.overwrite {
        info!(
            "Skipping {} - markdown file already exists (use --overwrite to replace)",
            display_name(txt_path)
        );
        return Ok(FileOutcome::Skipped);
    }

    let content = read_to_string(txt_path).await?;
    let record = PaperRecord::parse(&content);
    let analysis = record::analysis_body(&content)
        .map(|body| AnalysisResult::parse(&body))
        .unwrap_or_default();

    if analysis.is_empty() {
        warn!("No analysis found in {}", txt_path.display());
        return Err(NotesError::NoAnalysis {
            path: txt_path.to_path_buf(),
        });
    }

    write_atomic(&md_path, &render_note(&record, &analysis)).await?;
    info!("Created markdown file: {}", md_path.display());

    Ok(FileOutcome::Processed)
}

/// Render every `*.txt` record in `input_dir` into `output_dir`.
pub async fn render_folder(
    input_dir: &Path,
    output_dir: &Path,
    options: &RenderOptions,
    progress: Option<&dyn BatchProgress>,
) -> Result<StageSummary, NotesError> {
    let files = files_with_extension(input_dir, "txt")?;
    info!("Found {} text files to process", files.len());

    let mut summary = StageSummary {
        total: files.len(),
        ..StageSummary::default()
    };
    notify(progress, |p| p.on_batch_start(files.len()));

    for (i, txt_path) in files.iter().enumerate() {
        let name = display_name(txt_path);
        info!("Processing file {}/{}: {name}", i + 1, files.len());
        notify(progress, |p| p.on_file_start(i + 1, files.len(), &name));

        match render_file(txt_path, output_dir, options).await {
            Ok(FileOutcome::Processed) => {
                summary.processed += 1;
                notify(progress, |p| p.on_file_processed(i + 1, files.len(), &name));
            }
            Ok(FileOutcome::Skipped) => {
                summary.skipped += 1;
                notify(progress, |p| {
                    p.on_file_skipped(i + 1, files.len(), &name, "markdown already exists")
                });
            }
            Err(e) => {
                error!("Failed to process {name}: {e}");
                summary.failed += 1;
                notify(progress, |p| {
                    p.on_file_failed(i + 1, files.len(), &name, &e.to_string())
                });
            }
        }
    }

    log_summary("render", &summary);
    notify(progress, |p| {
        p.on_batch_complete(summary.processed, summary.skipped, summary.failed)
    });
    Ok(summary)
}

// ── Shared helpers ───────────────────────────────────────────────────────

/// List files in `dir` with the given extension, sorted for deterministic
/// batch order.
fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, NotesError> {
    if !dir.is_dir() {
        return Err(NotesError::InputNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| NotesError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Precondition check: the path exists and carries the expected extension.
fn require_extension(path: &Path, expected: &'static str) -> Result<(), NotesError> {
    if !path.exists() {
        return Err(NotesError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let ok = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(expected));
    if !ok {
        return Err(NotesError::WrongExtension {
            path: path.to_path_buf(),
            expected,
        });
    }
    Ok(())
}

async fn read_to_string(path: &Path) -> Result<String, NotesError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| NotesError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Write via temp file + rename so readers never see a partial file.
async fn write_atomic(path: &Path, content: &str) -> Result<(), NotesError> {
    let map_err = |e: std::io::Error| NotesError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(map_err)?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, content).await.map_err(map_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(map_err)?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn notify(progress: Option<&dyn BatchProgress>, f: impl FnOnce(&dyn BatchProgress)) {
    if let Some(p) = progress {
        f(p);
    }
}

fn log_summary(stage: &str, summary: &StageSummary) {
    info!(
        "Completed {stage}: {} files — {} processed, {} skipped, {} failed",
        summary.total, summary.processed, summary.skipped, summary.failed
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn render_rejects_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        tokio::fs::write(&path, "x").await.unwrap();

        let err = render_file(&path, dir.path(), &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NotesError::WrongExtension { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn render_requires_existing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_file(
            &dir.path().join("missing.txt"),
            dir.path(),
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, NotesError::InputNotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn render_without_analysis_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let record = PaperRecord {
            title: "T".to_string(),
            authors: "A".to_string(),
            year: "2020".to_string(),
            abstract_text: "abs".to_string(),
            introduction: "intro".to_string(),
        };
        let path = dir.path().join("T_2020.txt");
        tokio::fs::write(&path, record.to_text()).await.unwrap();

        let err = render_file(&path, dir.path(), &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NotesError::NoAnalysis { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn render_skips_existing_output_unless_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let record = PaperRecord {
            title: "T".to_string(),
            authors: "A".to_string(),
            year: "2020".to_string(),
            abstract_text: String::new(),
            introduction: "intro".to_string(),
        };
        let text = record::append_analysis(
            &record.to_text(),
            "SUMMARY:\nS.\n\nKEYWORDS:\nkeywords",
        );
        let txt_path = dir.path().join("T_2020.txt");
        tokio::fs::write(&txt_path, &text).await.unwrap();

        let first = render_file(&txt_path, dir.path(), &RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(first, FileOutcome::Processed);

        let second = render_file(&txt_path, dir.path(), &RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(second, FileOutcome::Skipped);

        let third = render_file(&txt_path, dir.path(), &RenderOptions { overwrite: true })
            .await
            .unwrap();
        assert_eq!(third, FileOutcome::Processed);
    }

    #[tokio::test]
    async fn folder_listing_is_filtered_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.TXT", "c.md", "d.pdf"] {
            tokio::fs::write(dir.path().join(name), "x").await.unwrap();
        }
        let files = files_with_extension(dir.path(), "txt").unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, ["a.TXT", "b.txt"]);
    }

    #[tokio::test]
    async fn missing_folder_is_input_not_found() {
        let err = files_with_extension(Path::new("/no/such/dir"), "txt").unwrap_err();
        assert!(matches!(err, NotesError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn atomic_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/record.txt");
        write_atomic(&path, "content").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
        assert!(!path.with_extension("tmp").exists());
    }
}
