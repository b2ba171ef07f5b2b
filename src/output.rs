//! Result types returned alongside the written artifact.

use crate::config::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Counters for one translation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationStats {
    /// Content units found in the document.
    pub total_units: usize,
    /// Units whose translation was accepted.
    pub translated_units: usize,
    /// Units left untranslated (backend failure, bad table, image).
    pub failed_units: usize,
    /// Wall-clock time spent in the translation stage.
    pub duration_ms: u64,
}

/// What a full extract → translate → write run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSummary {
    pub output_path: PathBuf,
    pub format: OutputFormat,
    pub pages: usize,
    pub stats: TranslationStats,
    pub total_duration_ms: u64,
}

/// Document-level information readable without translating anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
