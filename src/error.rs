//! Error types for the edgequake-pdf-translate library.
//!
//! Failures come in three sizes:
//!
//! * [`TranslatorError`]: **Fatal**, the run cannot proceed (missing file,
//!   page limit beyond the document, unsupported output extension, a backend
//!   failure under `fail_fast`). Returned from the top-level entry points.
//!
//! * [`ContentError`]: **Per unit**, one content unit could not be
//!   translated (image units, a translation of the wrong kind, a failed
//!   backend call). With the
//!   default failure policy the unit is left untranslated and the run
//!   continues.
//!
//! * [`BackendError`]: a single translation call failed. Wrapped into a
//!   [`TranslatorError::Backend`] only when the caller asked to fail fast.

use crate::document::ContentType;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf-translate library.
#[derive(Debug, Error)]
pub enum TranslatorError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// More pages were requested than the document has.
    #[error("Page out of range: document has {available} pages, but {requested} pages were requested")]
    PageOutOfRange { available: usize, requested: usize },

    /// A raw table grid could not be turned into a labelled table.
    #[error("Page {page}: {source}")]
    TableShape {
        page: usize,
        #[source]
        source: TableShapeError,
    },

    // ── Translation errors ────────────────────────────────────────────────
    /// The configured provider could not be created (unknown name, missing key).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A backend call failed and the run was configured to fail fast.
    #[error("Page {page}, unit {index}: {source}")]
    Backend {
        page: usize,
        index: usize,
        #[source]
        source: BackendError,
    },

    /// A content unit could not be translated and the run was configured to fail fast.
    #[error("Page {page}, unit {index}: {source}")]
    Content {
        page: usize,
        index: usize,
        #[source]
        source: ContentError,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output path has an extension no writer understands.
    #[error("Unsupported output format '{extension}' (expected .pdf or .md)")]
    UnsupportedFormat { extension: String },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The paginated writer could not lay out or save the document.
    #[error("Failed to render '{path}': {detail}")]
    Render { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A raw table grid whose shape does not survive conversion to a labelled table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableShapeError {
    /// The grid has no header row at all.
    #[error("table has no header row")]
    Empty,

    /// A data row is wider or narrower than the header.
    #[error("table row {row} has {found} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A translation that cannot be attached to a content unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// The translation value belongs to a different content kind.
    #[error("invalid translation type: expected {expected}, got {found}")]
    TypeMismatch {
        expected: ContentType,
        found: ContentType,
    },

    /// No prompt form exists for this kind of content.
    #[error("unsupported content type: {0}")]
    Unsupported(ContentType),

    /// The backend response for a table could not be rebuilt into a grid.
    #[error("invalid table translation: {0}")]
    InvalidTable(String),

    /// The backend call itself failed; holds the rendered [`BackendError`].
    #[error("{0}")]
    Backend(String),
}

/// A failed call to a translation backend.
#[derive(Debug, Clone, Error)]
#[error("translation backend '{backend}' failed: {message}")]
pub struct BackendError {
    pub backend: String,
    pub message: String,
}

impl BackendError {
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}
