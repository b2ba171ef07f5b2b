//! Paginated PDF rendering through pdfium.
//!
//! Rendering happens in two passes:
//!
//! 1. [`paginate`] lays the [`Story`] out onto A4 pages: word wrapping,
//!    table rows and overflow onto a fresh page when the cursor reaches the
//!    bottom margin. The result is a list of positioned boxes and strings
//!    and does not touch pdfium, so it is unit-testable.
//! 2. [`render_pages`] draws those pages into a new pdfium document and
//!    saves it.
//!
//! Text widths are estimated from the font size (CJK glyphs are one em wide,
//! everything else half an em) rather than measured, which is close enough
//! for wrapping with the standard fonts.

use super::layout::{Flowable, Story};
use crate::document::TableGrid;
use crate::error::TranslatorError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const A4_WIDTH: f32 = 595.0;
const A4_HEIGHT: f32 = 842.0;

/// An RGB colour.
pub type Rgb = (u8, u8, u8);

const BLACK: Rgb = (0, 0, 0);
const GREY: Rgb = (128, 128, 128);
const WHITESMOKE: Rgb = (245, 245, 245);
const BEIGE: Rgb = (245, 245, 220);

/// Font sizes and spacing for the paginated writer.
#[derive(Debug, Clone)]
pub struct PdfStyle {
    pub font_size: f32,
    pub header_font_size: f32,
    pub leading: f32,
    pub margin: f32,
    pub cell_padding: f32,
}

impl PdfStyle {
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size,
            header_font_size: font_size + 2.0,
            leading: font_size * 1.2,
            margin: 56.0,
            cell_padding: 4.0,
        }
    }

    fn content_width(&self) -> f32 {
        A4_WIDTH - 2.0 * self.margin
    }
}

impl Default for PdfStyle {
    fn default() -> Self {
        Self::new(12.0)
    }
}

/// Something drawn at a fixed position on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Placed {
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        color: Rgb,
    },
    Cell {
        left: f32,
        bottom: f32,
        right: f32,
        top: f32,
        fill: Rgb,
    },
}

/// One output page worth of placed items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub items: Vec<Placed>,
}

struct Cursor<'s> {
    style: &'s PdfStyle,
    pages: Vec<LaidOutPage>,
    y: f32,
}

impl<'s> Cursor<'s> {
    fn new(style: &'s PdfStyle) -> Self {
        Self {
            style,
            pages: vec![LaidOutPage::default()],
            y: A4_HEIGHT - style.margin,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(LaidOutPage::default());
        self.y = A4_HEIGHT - self.style.margin;
    }

    /// Make room for `height` points, starting a new page when needed.
    ///
    /// A block taller than a whole page is placed at the top of a fresh page
    /// and allowed to run past the bottom margin.
    fn reserve(&mut self, height: f32) {
        let top = A4_HEIGHT - self.style.margin;
        if self.y - height < self.style.margin && self.y < top {
            self.new_page();
        }
    }

    fn place(&mut self, item: Placed) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
    }

    fn paragraph(&mut self, text: &str) {
        let style = self.style;
        let lines = wrap(text, style.content_width(), style.font_size);
        if lines.is_empty() {
            self.reserve(style.leading);
            self.y -= style.leading;
            return;
        }
        for line in lines {
            self.reserve(style.leading);
            self.y -= style.leading;
            self.place(Placed::Text {
                x: style.margin,
                y: self.y + (style.leading - style.font_size),
                text: line,
                size: style.font_size,
                color: BLACK,
            });
        }
    }

    fn table(&mut self, grid: &TableGrid) {
        let style = self.style;
        let columns = grid.column_count().max(1);
        let col_width = style.content_width() / columns as f32;

        self.row(grid.columns(), col_width, style.header_font_size, GREY, WHITESMOKE);
        for row in grid.rows() {
            self.row(row, col_width, style.font_size, BEIGE, BLACK);
        }
        // Gap after the table, like after a paragraph.
        self.y -= style.leading;
    }

    fn row(&mut self, cells: &[String], col_width: f32, size: f32, fill: Rgb, color: Rgb) {
        let style = self.style;
        let leading = size * 1.2;
        let inner = col_width - 2.0 * style.cell_padding;

        let wrapped: Vec<Vec<String>> = cells.iter().map(|c| wrap(c, inner, size)).collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let height = line_count as f32 * leading + 2.0 * style.cell_padding;

        self.reserve(height);
        let top = self.y;
        let bottom = top - height;

        for (i, lines) in wrapped.into_iter().enumerate() {
            let left = style.margin + i as f32 * col_width;
            self.place(Placed::Cell {
                left,
                bottom,
                right: left + col_width,
                top,
                fill,
            });
            for (n, line) in lines.into_iter().enumerate() {
                self.place(Placed::Text {
                    x: left + style.cell_padding,
                    y: top - style.cell_padding - (n + 1) as f32 * leading + (leading - size),
                    text: line,
                    size,
                    color,
                });
            }
        }
        self.y = bottom;
    }
}

/// Lay `story` out onto A4 pages.
pub fn paginate(story: &Story, style: &PdfStyle) -> Vec<LaidOutPage> {
    let mut cursor = Cursor::new(style);
    for flowable in story.flowables() {
        match flowable {
            Flowable::Paragraph(text) => cursor.paragraph(text),
            Flowable::Table(grid) => cursor.table(grid),
            Flowable::PageBreak => cursor.new_page(),
        }
    }
    cursor.pages
}

fn is_wide(c: char) -> bool {
    c >= '\u{2E80}'
}

fn char_width(c: char, size: f32) -> f32 {
    if is_wide(c) {
        size
    } else {
        size * 0.5
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(|c| char_width(c, size)).sum()
}

/// Break `text` into lines no wider than `max_width`.
///
/// Breaks at spaces where possible; words wider than a whole line (and runs
/// of CJK text, which has no spaces) are split between characters.
pub fn wrap(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0.0;
    let space = char_width(' ', size);

    for word in text.split_whitespace() {
        let word_width = text_width(word, size);
        let sep = if line.is_empty() { 0.0 } else { space };

        if width + sep + word_width <= max_width {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
            width += sep + word_width;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            width = 0.0;
        }

        if word_width <= max_width {
            line.push_str(word);
            width = word_width;
            continue;
        }

        for c in word.chars() {
            let w = char_width(c, size);
            if width + w > max_width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                width = 0.0;
            }
            line.push(c);
            width += w;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn color((r, g, b): Rgb) -> PdfColor {
    PdfColor::new(r, g, b, 255)
}

/// Draw laid-out pages into a new PDF and save it to `path`.
///
/// Saves to a temp file next to `path` first and renames it into place.
pub fn render_pages(
    pdfium: &Pdfium,
    pages: &[LaidOutPage],
    path: &Path,
    font_path: Option<&Path>,
) -> Result<(), TranslatorError> {
    let render_failed = |e: PdfiumError| TranslatorError::Render {
        path: path.to_path_buf(),
        detail: format!("{:?}", e),
    };
    let write_failed = |source: std::io::Error| TranslatorError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut document = pdfium.create_new_pdf().map_err(render_failed)?;
    let font = match font_path {
        Some(font_path) => {
            debug!("Loading font {}", font_path.display());
            document
                .fonts_mut()
                .load_true_type_from_file(font_path, true)
                .map_err(render_failed)?
        }
        None => document.fonts_mut().helvetica(),
    };

    for laid_out in pages {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .map_err(render_failed)?;
        let objects = page.objects_mut();

        for item in &laid_out.items {
            match item {
                Placed::Cell {
                    left,
                    bottom,
                    right,
                    top,
                    fill,
                } => {
                    objects
                        .create_path_object_rect(
                            PdfRect::new_from_values(*bottom, *left, *top, *right),
                            Some(color(BLACK)),
                            Some(PdfPoints::new(0.5)),
                            Some(color(*fill)),
                        )
                        .map_err(render_failed)?;
                }
                Placed::Text {
                    x,
                    y,
                    text,
                    size,
                    color: rgb,
                } => {
                    let mut object = objects
                        .create_text_object(
                            PdfPoints::new(*x),
                            PdfPoints::new(*y),
                            text,
                            font,
                            PdfPoints::new(*size),
                        )
                        .map_err(render_failed)?;
                    if *rgb != BLACK {
                        object.set_fill_color(color(*rgb)).map_err(render_failed)?;
                    }
                }
            }
        }
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_failed)?;
    let tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    document.save_to_file(tmp.path()).map_err(render_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}

/// Lay out and render `story` as a PDF at `path`.
///
/// pdfium work runs inside `spawn_blocking`.
const WIDE_SCRIPT_LANGUAGES: &[&str] = &[
    "chinese", "mandarin", "cantonese", "japanese", "korean",
];

/// Whether PDF output in `language` needs a font other than Helvetica.
pub fn language_needs_embedded_font(language: &str) -> bool {
    let lower = language.to_lowercase();
    lower.chars().any(is_wide) || WIDE_SCRIPT_LANGUAGES.iter().any(|l| lower.contains(l))
}

/// Whether any paragraph or cell of `story` holds CJK characters.
pub fn story_needs_embedded_font(story: &Story) -> bool {
    story.flowables().iter().any(|f| match f {
        Flowable::Paragraph(text) => text.chars().any(is_wide),
        Flowable::Table(grid) => grid.cells().any(|cell| cell.chars().any(is_wide)),
        Flowable::PageBreak => false,
    })
}

/// Reject PDF output in a CJK language when no TrueType font is configured.
///
/// The standard Helvetica font has no CJK glyphs, so such a run would only
/// produce blank boxes.
pub fn check_font(language: &str, font_path: Option<&Path>) -> Result<(), TranslatorError> {
    if font_path.is_none() && language_needs_embedded_font(language) {
        return Err(TranslatorError::InvalidConfig(format!(
            "PDF output in {language} needs a TrueType font with CJK glyphs; \
set font_path (--font) or write Markdown (.md) instead"
        )));
    }
    Ok(())
}

pub async fn write_pdf(
    story: Story,
    path: &Path,
    style: PdfStyle,
    font_path: Option<PathBuf>,
) -> Result<(), TranslatorError> {
    if font_path.is_none() && story_needs_embedded_font(&story) {
        return Err(TranslatorError::InvalidConfig(
            "translated text holds CJK characters but no TrueType font is set (--font)".into(),
        ));
    }
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let pages = paginate(&story, &style);
        info!("Rendering {} PDF pages to {}", pages.len(), path.display());
        let pdfium = crate::pipeline::extract::bind_pdfium()?;
        render_pages(&pdfium, &pages, &path, font_path.as_deref())
    })
    .await
    .map_err(|e| TranslatorError::Internal(format!("Render task panicked: {}", e)))?
}
