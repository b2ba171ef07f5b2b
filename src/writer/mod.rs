//! Output writers: render a translated [`Document`] as PDF or Markdown.
//!
//! ```text
//! Document ──▶ build_story ──▶ Story ──┬──▶ render_markdown ──▶ .md
//!                                      └──▶ paginate + pdfium ──▶ .pdf
//! ```
//!
//! The output format comes from the output path's extension and is settled
//! before any rendering starts, so an unsupported extension never leaves a
//! half-written file behind.

pub mod layout;
pub mod markdown;
pub mod pdf;

pub use layout::{build_story, Flowable, Story};
pub use markdown::render_markdown;

use crate::config::{OutputFormat, TranslationConfig};
use crate::document::Document;
use crate::error::TranslatorError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `document` to `output`, or next to its source when `output` is `None`.
///
/// Consumes the document. Returns the path written and the format used.
pub async fn write_document(
    document: Document,
    output: Option<&Path>,
    config: &TranslationConfig,
) -> Result<(PathBuf, OutputFormat), TranslatorError> {
    let format = OutputFormat::from_path(output)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| document.default_output_path(format));

    let story = build_story(&document)?;
    drop(document);

    match format {
        OutputFormat::Markdown => {
            markdown::write_markdown(&render_markdown(&story), &path)?;
        }
        OutputFormat::Pdf => {
            pdf::write_pdf(
                story,
                &path,
                pdf::PdfStyle::new(config.font_size),
                config.font_path.clone(),
            )
            .await?;
        }
    }

    info!("Translation written to {}", path.display());
    Ok((path, format))
}

/// Render `document` as Markdown text without touching the file system.
pub fn markdown_string(document: &Document) -> Result<String, TranslatorError> {
    Ok(render_markdown(&build_story(document)?))
}
