//! # edgequake-pdf-translate
//!
//! Translate PDF documents with language models, into a paginated PDF or
//! Markdown.
//!
//! ## Why this crate?
//!
//! Pasting a PDF into a chat window loses the tables: they come back as
//! ragged runs of words mixed into the prose. This crate keeps the two
//! apart. Each page is split into a prose block and the tables found on it,
//! the table text is removed from the prose, and every block is translated
//! on its own: prose as text, tables as JSON records so the grid survives
//! the round-trip.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Extract    page text + detected tables via pdfium (spawn_blocking)
//!  ├─ 3. Dedupe     strip table cells from the prose, first occurrence only
//!  ├─ 4. Translate  one LLM call per text block or table, in reading order
//!  └─ 5. Write      paginated PDF (pdfium) or Markdown (pipe tables)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_translate::{translate_pdf, TranslationConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = TranslationConfig::builder()
//!         .target_language("French")
//!         .build()?;
//!     let summary = translate_pdf("book.pdf", Some(Path::new("book_fr.md")), &config).await?;
//!     eprintln!(
//!         "{}/{} units translated → {}",
//!         summary.stats.translated_units,
//!         summary.stats.total_units,
//!         summary.output_path.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-translate` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf-translate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod writer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OutputFormat, TranslationConfig, TranslationConfigBuilder};
pub use convert::{inspect, resolve_backend, translate_pdf, translate_pdf_sync, translate_pdf_with};
pub use document::{Content, ContentType, ContentValue, Document, Page, TableGrid};
pub use error::{BackendError, ContentError, TableShapeError, TranslatorError};
pub use output::{DocumentMetadata, TranslationStats, TranslationSummary};
pub use pipeline::extract::{extract_document, parse_pdf, PageSource, RawPage};
pub use pipeline::llm::{LlmBackend, TranslationBackend};
pub use pipeline::tables::TableStrategy;
pub use pipeline::translate::Translator;
pub use progress::{NoopProgressCallback, ProgressCallback, TranslationProgressCallback, UnitProgress};
pub use writer::write_document;
