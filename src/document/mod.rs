//! The in-memory book: a source document made of pages made of content units.
//!
//! ```text
//! Document ── Page ── Content (Text | Table | Image)
//!                        └── TableGrid (header + rows)
//! ```
//!
//! A [`Document`] is built once by the extractor, moved into the translator
//! which fills in every unit's translation, and finally moved into a writer.
//! Nothing else holds on to it in between.

pub mod content;
pub mod page;
pub mod table;

pub use content::{Content, ContentType, ContentValue};
pub use page::Page;
pub use table::{RawTable, TableGrid};

use crate::config::OutputFormat;
use std::path::{Path, PathBuf};

/// A parsed source PDF: its path and its pages in order.
#[derive(Debug, Clone)]
pub struct Document {
    source: PathBuf,
    pages: Vec<Page>,
}

impl Document {
    /// Start an empty document for the given source file.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            pages: Vec::new(),
        }
    }

    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of content units across all pages.
    pub fn unit_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }

    /// Iterate over every unit with its 1-based page number and 0-based index.
    pub fn units(&self) -> impl Iterator<Item = (usize, usize, &Content)> {
        self.pages.iter().enumerate().flat_map(|(p, page)| {
            page.contents()
                .iter()
                .enumerate()
                .map(move |(i, c)| (p + 1, i, c))
        })
    }

    /// `<dir>/<stem>_translated.<ext>` next to the source file.
    pub fn default_output_path(&self, format: OutputFormat) -> PathBuf {
        translated_path(&self.source, format)
    }
}

/// `<dir>/<stem>_translated.<ext>` for a source at `source`.
pub fn translated_path(source: &Path, format: OutputFormat) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    source.with_file_name(format!("{stem}_translated.{}", format.extension()))
}
