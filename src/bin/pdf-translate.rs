//! CLI binary for edgequake-pdf-translate.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `TranslationConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use edgequake_pdf_translate::{
    inspect, translate_pdf, ProgressCallback, TableStrategy, TranslationConfig, TranslationProgressCallback,
    UnitProgress,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per unit.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the unit currently in flight.
    started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// The bar starts as a spinner; `on_translation_start` sets its length.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Extracting text and tables…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} units  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Translating");
        self.bar.reset_eta();
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_translation_start(&self, total_units: usize) {
        self.activate_bar(total_units);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Translating {total_units} units…"))
        ));
    }

    fn on_unit_start(&self, unit: &UnitProgress) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.bar
            .set_message(format!("page {} {} {}", unit.page, unit.kind, unit.index));
    }

    fn on_unit_complete(&self, unit: &UnitProgress) {
        self.bar.println(format!(
            "  {} Page {:>3}  {:<5} {:>2}  {}",
            green("✓"),
            unit.page,
            unit.kind,
            unit.index,
            self.elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_unit_error(&self, unit: &UnitProgress, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}  {:<5} {:>2}  {}  {}",
            red("✗"),
            unit.page,
            unit.kind,
            unit.index,
            red(&msg),
            self.elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_translation_complete(&self, total_units: usize, translated: usize) {
        let failed = total_units.saturating_sub(translated);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} units translated",
                green("✔"),
                bold(&translated.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} units translated  ({} left out)",
                if translated == 0 { red("✘") } else { cyan("⚠") },
                bold(&translated.to_string()),
                total_units,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # English to Chinese (default), writes book_translated.pdf
  pdf-translate book.pdf

  # Into French, as Markdown
  pdf-translate book.pdf --target-lang French -o book_fr.md

  # First 3 pages only, CJK font for the PDF writer
  pdf-translate --pages 3 --font fonts/NotoSansSC-Regular.ttf book.pdf

  # Use a specific model
  pdf-translate --model gpt-4.1-mini --provider openai book.pdf

  # Translate from a URL
  pdf-translate https://example.com/paper.pdf -o paper_zh.md

  # Inspect PDF metadata (no API key needed)
  pdf-translate --inspect-only book.pdf

OUTPUT FORMATS:
  .pdf              paginated PDF (default)
  .md, .markdown    Markdown, pipe tables, '---' between pages

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory

  PDFium (~30 MB) is downloaded automatically on first run and cached.
"#;

/// Translate PDF books with LLMs into PDF or Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-translate",
    version,
    about = "Translate PDF files and URLs with LLMs into PDF or Markdown",
    long_about = "Translate the text and tables of a PDF document (local file or URL) with a \
language model and write the result as a paginated PDF or as Markdown. Supports OpenAI, \
Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint (Ollama, vLLM, \
LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    book: String,

    /// Output file; the extension (.pdf, .md, .markdown) picks the format.
    /// Default: <book>_translated.pdf next to the input.
    #[arg(short, long, env = "PDF_TRANSLATE_OUTPUT")]
    output: Option<PathBuf>,

    /// Language of the document.
    #[arg(long, env = "PDF_TRANSLATE_SOURCE_LANG", default_value = "English")]
    source_lang: String,

    /// Language to translate into.
    #[arg(long, env = "PDF_TRANSLATE_TARGET_LANG", default_value = "Chinese")]
    target_lang: String,

    /// Translate only the first N pages.
    #[arg(long, env = "PDF_TRANSLATE_PAGES",
          value_parser = clap::value_parser!(u64).range(1..))]
    pages: Option<u64>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// TrueType font for PDF output (needed for CJK and other non-Latin targets).
    #[arg(long, env = "PDF_TRANSLATE_FONT")]
    font: Option<PathBuf>,

    /// How tables are found: `lines` (ruled grids) or `text` (aligned columns).
    #[arg(long, env = "PDF_TRANSLATE_TABLES", value_enum, default_value_t = TablesArg::Lines)]
    tables: TablesArg,

    /// Body font size of PDF output, in points.
    #[arg(long, env = "PDF_TRANSLATE_FONT_SIZE", default_value_t = 12.0)]
    font_size: f32,

    /// Max LLM output tokens per content unit.
    #[arg(long, env = "PDF_TRANSLATE_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF_TRANSLATE_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Abort on the first unit that cannot be translated.
    #[arg(long, env = "PDF_TRANSLATE_FAIL_FAST")]
    fail_fast: bool,

    /// Print JSON (metadata or run summary) on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_TRANSLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no translation.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_TRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_TRANSLATE_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF_TRANSLATE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TablesArg {
    Lines,
    Text,
}

impl From<TablesArg> for TableStrategy {
    fn from(arg: TablesArg) -> Self {
        match arg {
            TablesArg::Lines => TableStrategy::Lines,
            TablesArg::Text => TableStrategy::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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

    // ── Ensure PDFium engine is available ───────────────────────────────────
    if !pdfium_auto::is_pdfium_cached() {
        if !cli.quiet {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(TICKS),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        } else {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
        }
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.book).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.book);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn TranslationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run translation ──────────────────────────────────────────────────
    let summary = translate_pdf(&cli.book, cli.output.as_deref(), &config)
        .await
        .context("Translation failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        let stats = &summary.stats;
        eprintln!(
            "{}  {}/{} units  {} pages  {}ms  →  {}",
            if stats.failed_units == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.translated_units,
            stats.total_units,
            summary.pages,
            summary.total_duration_ms,
            bold(&summary.output_path.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `TranslationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslationConfig> {
    let mut builder = TranslationConfig::builder()
        .source_language(&cli.source_lang)
        .target_language(&cli.target_lang)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .fail_fast(cli.fail_fast)
        .table_strategy(cli.tables.into())
        .font_size(cli.font_size)
        .download_timeout_secs(cli.download_timeout);

    if let Some(pages) = cli.pages {
        builder = builder.page_limit(pages as usize);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref font) = cli.font {
        builder = builder.font_path(font);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
