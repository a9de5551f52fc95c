//! CLI binary for papernotes.
//!
//! A thin shim over the library crate that maps subcommands and flags to
//! the stage drivers and prints batch results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use papernotes::{
    stages, AnalyzeOptions, BatchProgress, ClaudeClient, RenderOptions, StageSummary,
    ZoteroClient, ZoteroConfig,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a progress bar plus one log line per file.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl BatchProgress for CliProgress {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_files} files…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_file_processed(&self, index: usize, total: usize, name: &str) {
        self.bar
            .println(format!("  {} {:>3}/{:<3}  {}", green("✓"), index, total, name));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, index: usize, total: usize, name: &str, reason: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            dim("∙"),
            index,
            total,
            name,
            dim(reason)
        ));
        self.bar.inc(1);
    }

    fn on_file_failed(&self, index: usize, total: usize, name: &str, err: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if err.chars().count() > 80 {
            let head: String = err.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            err.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _processed: usize, _skipped: usize, _failed: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Stage 1: extract PDFs into flat-text records
  papernotes extract papers/ records/

  # Stage 1 for a single file
  papernotes extract papers/Revkov_2023.pdf records/

  # Stage 2: analyze records with Claude (needs ANTHROPIC_API_KEY)
  papernotes analyze records/

  # Re-analyze, replacing existing analyses
  papernotes analyze records/ --overwrite

  # Stage 3: render markdown notes
  papernotes markdown records/ notes/ --overwrite

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY     Claude API key (required for `analyze`)
  CLAUDE_MODEL          Claude model ID (default: claude-3-5-sonnet-20240620)
  ZOTERO_LIBRARY_ID     Zotero library ID (optional, enables abstract lookup)
  ZOTERO_API_KEY        Zotero API key (optional)
  ZOTERO_LIBRARY_TYPE   "user" or "group" (default: user)

RECORD FORMAT:
  Stage 1 writes one UTF-8 text record per paper (TITLE:/AUTHORS:/YEAR:/
  ABSTRACT:/INTRODUCTION:). Stage 2 appends a CLAUDE ANALYSIS: section in
  place; re-running replaces it. Stage 3 never edits records."#;

/// Convert academic PDF papers into structured Markdown notes.
#[derive(Parser, Debug)]
#[command(
    name = "papernotes",
    version,
    about = "Convert academic PDF papers into structured Markdown notes using Claude",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAPERNOTES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PAPERNOTES_QUIET")]
    quiet: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "PAPERNOTES_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract title/authors/year/introduction from PDFs into text records.
    Extract {
        /// PDF file or folder of PDFs.
        input: PathBuf,

        /// Output folder for the text records.
        output: PathBuf,

        /// Skip the Zotero abstract lookup even when credentials are set.
        #[arg(long)]
        no_lookup: bool,
    },

    /// Analyze records with Claude and append the results in place.
    Analyze {
        /// Record file or folder of records.
        input: PathBuf,

        /// Replace existing analyses instead of skipping those files.
        #[arg(long)]
        overwrite: bool,

        /// Delay between consecutive API calls in milliseconds.
        #[arg(long, env = "PAPERNOTES_DELAY_MS", default_value_t = 1000)]
        delay_ms: u64,
    },

    /// Render analyzed records into markdown notes with YAML frontmatter.
    Markdown {
        /// Record file or folder of records.
        input: PathBuf,

        /// Output folder for the markdown notes.
        output: PathBuf,

        /// Replace existing markdown files instead of skipping them.
        #[arg(long)]
        overwrite: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides per-file feedback, so INFO-level library
    // logs are suppressed while it is active. Single-file mode has no bar
    // and keeps the per-file logs instead.
    let input_is_dir = match &cli.command {
        Commands::Extract { input, .. }
        | Commands::Analyze { input, .. }
        | Commands::Markdown { input, .. } => input.is_dir(),
    };
    let show_progress = !cli.quiet && !cli.no_progress && input_is_dir;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress: Option<CliProgress> = show_progress.then(CliProgress::new);
    let progress_ref = progress.as_ref().map(|p| p as &dyn BatchProgress);

    match cli.command {
        Commands::Extract {
            input,
            output,
            no_lookup,
        } => {
            let zotero = if no_lookup {
                None
            } else {
                connect_zotero().await
            };

            if input.is_dir() {
                let summary =
                    stages::extract_folder(&input, &output, zotero.as_ref(), progress_ref)
                        .await
                        .context("Extract failed")?;
                print_summary(&summary, cli.quiet);
            } else {
                let record = stages::extract_pdf(&input, &output, zotero.as_ref())
                    .await
                    .with_context(|| format!("Failed to process {}", input.display()))?;
                if !cli.quiet {
                    eprintln!("{} {}", green("✔"), bold(&record.display().to_string()));
                }
            }
        }

        Commands::Analyze {
            input,
            overwrite,
            delay_ms,
        } => {
            let claude = match ClaudeClient::from_env() {
                Ok(client) => client,
                Err(e) if input.is_dir() => {
                    // Missing credentials disable the whole capability;
                    // nothing useful can run, so return early.
                    error!("{e}");
                    return Ok(());
                }
                Err(e) => return Err(e).context("Cannot analyze"),
            };
            let options = AnalyzeOptions {
                overwrite,
                delay_ms,
            };

            if input.is_dir() {
                let summary = stages::analyze_folder(&input, &claude, &options, progress_ref)
                    .await
                    .context("Analyze failed")?;
                print_summary(&summary, cli.quiet);
            } else {
                stages::analyze_file(&input, &claude, overwrite)
                    .await
                    .with_context(|| format!("Failed to process {}", input.display()))?;
                if !cli.quiet {
                    eprintln!("{} {}", green("✔"), bold(&input.display().to_string()));
                }
            }
        }

        Commands::Markdown {
            input,
            output,
            overwrite,
        } => {
            let options = RenderOptions { overwrite };

            if input.is_dir() {
                let summary = stages::render_folder(&input, &output, &options, progress_ref)
                    .await
                    .context("Markdown rendering failed")?;
                print_summary(&summary, cli.quiet);
            } else {
                stages::render_file(&input, &output, &options)
                    .await
                    .with_context(|| format!("Failed to process {}", input.display()))?;
                if !cli.quiet {
                    eprintln!("{} {}", green("✔"), bold(&input.display().to_string()));
                }
            }
        }
    }

    Ok(())
}

/// Connect to Zotero when credentials are configured; lookup is optional.
async fn connect_zotero() -> Option<ZoteroClient> {
    let Some(config) = ZoteroConfig::from_env() else {
        warn!("Zotero API credentials not found. Abstract retrieval will be skipped.");
        return None;
    };
    match ZoteroClient::connect(config).await {
        Ok(client) => Some(client),
        Err(e) => {
            error!("Error initializing Zotero: {e}");
            None
        }
    }
}

/// One-line batch summary with a green/amber/red tick.
fn print_summary(summary: &StageSummary, quiet: bool) {
    if quiet {
        return;
    }
    let tick = if summary.failed == 0 {
        green("✔")
    } else if summary.processed == 0 && summary.failed == summary.total {
        red("✘")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{tick} {}/{} files processed  {}  {}",
        bold(&summary.processed.to_string()),
        summary.total,
        dim(&format!("{} skipped", summary.skipped)),
        if summary.failed > 0 {
            red(&format!("{} failed", summary.failed))
        } else {
            dim("0 failed")
        },
    );
}
