//! Markdown rendering.
//!
//! The byte layout is fixed:
//!
//! ```text
//! line\n\n                      one per paragraph
//! | h1 | h2 |\n                 table header
//! | --- | --- |\n               separator, one `---` per column
//! | c1 | c2 |\n| c3 | c4 |\n\n  data rows joined by \n, then a blank line
//! ---\n\n                       between pages
//! ```

use super::layout::{Flowable, Story};
use crate::document::TableGrid;
use crate::error::TranslatorError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Render a story as Markdown text.
pub fn render_markdown(story: &Story) -> String {
    let mut out = String::new();
    for flowable in story.flowables() {
        match flowable {
            Flowable::Paragraph(line) => {
                out.push_str(line);
                out.push_str("\n\n");
            }
            Flowable::Table(grid) => out.push_str(&markdown_table(grid)),
            Flowable::PageBreak => out.push_str("---\n\n"),
        }
    }
    out
}

fn markdown_table(grid: &TableGrid) -> String {
    let header = format!("| {} |\n", grid.columns().join(" | "));
    let separator = format!("| {} |\n", vec!["---"; grid.column_count()].join(" | "));
    let body = grid
        .rows()
        .iter()
        .map(|row| format!("| {} |", row.join(" | ")))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{header}{separator}{body}\n\n")
}

/// Write `markdown` to `path` through a temp file in the same directory.
///
/// The destination is only replaced once the whole text is on disk; on any
/// error the temp file is removed and `path` is left untouched.
pub fn write_markdown(markdown: &str, path: &Path) -> Result<(), TranslatorError> {
    let write_failed = |source: std::io::Error| TranslatorError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_failed)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(markdown.as_bytes()).map_err(write_failed)?;
    tmp.flush().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    debug!("Wrote {} bytes of Markdown to {}", markdown.len(), path.display());
    Ok(())
}
