//! Extraction: turn each raw PDF page into a [`Page`] of content units.
//!
//! ## The text/table overlap
//!
//! Text extraction and table detection read the same glyphs independently,
//! so every table also shows up as a flat dump inside the page text. Before
//! the text is treated as prose, each cell string is removed from it, but
//! only its **first** occurrence: a cell value that also appears in a real
//! sentence elsewhere on the page loses at most one occurrence, while the
//! literal table dump disappears.
//!
//! ## Data flow
//!
//! ```text
//! PageSource ──▶ RawPage { text, tables } ──▶ build_page ──▶ Page
//!  (pdfium)                                   (dedupe, clean, grids)
//! ```

use crate::document::{Content, Document, Page, RawTable, TableGrid};
use crate::error::{TableShapeError, TranslatorError};
use crate::output::DocumentMetadata;
use crate::pipeline::tables::{detect_tables, Ruling, TableDetectorConfig, TableStrategy, TextSpan};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One page as the PDF parser sees it: full text plus detected table grids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    pub text: String,
    pub tables: Vec<RawTable>,
}

/// A document that can hand out raw pages.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Raw content of the page at 0-based `index`.
    fn raw_page(&self, index: usize) -> Result<RawPage, TranslatorError>;
}

/// Build a document from the first `page_limit` pages of `source` (all when `None`).
///
/// # Errors
/// [`TranslatorError::PageOutOfRange`] when `page_limit` exceeds the page
/// count; this is checked before any page is read. Any page error aborts
/// the whole extraction and no partial document is returned.
pub fn extract_document<S: PageSource>(
    source: &S,
    path: impl Into<PathBuf>,
    page_limit: Option<usize>,
) -> Result<Document, TranslatorError> {
    let available = source.page_count();
    if let Some(requested) = page_limit {
        if requested > available {
            return Err(TranslatorError::PageOutOfRange {
                available,
                requested,
            });
        }
    }

    let mut document = Document::new(path);
    for index in 0..page_limit.unwrap_or(available) {
        let raw = source.raw_page(index)?;
        let page = build_page(&raw).map_err(|source| TranslatorError::TableShape {
            page: index + 1,
            source,
        })?;
        debug!("Page {}: {} units", index + 1, page.len());
        document.add_page(page);
    }
    Ok(document)
}

/// Turn one raw page into content units: at most one text unit, then one
/// table unit per grid in the order given.
pub fn build_page(raw: &RawPage) -> Result<Page, TableShapeError> {
    let mut page = Page::new();

    let prose = clean_lines(&strip_table_text(&raw.text, &raw.tables));
    if !prose.is_empty() {
        debug!("[raw_text]\n{}", prose);
        page.add_content(Content::text(prose));
    }

    for table in &raw.tables {
        let grid = TableGrid::from_raw(table)?;
        debug!("[table]\n{}", grid.to_records_json());
        page.add_content(Content::table(grid));
    }

    Ok(page)
}

/// Remove the first occurrence of every cell string from `text`, in table,
/// row, then column order. Absent and empty cells are skipped.
pub fn strip_table_text(text: &str, tables: &[RawTable]) -> String {
    let mut text = text.to_string();
    let cells = tables
        .iter()
        .flatten()
        .flatten()
        .filter_map(|cell| cell.as_deref())
        .filter(|cell| !cell.is_empty());
    for cell in cells {
        text = text.replacen(cell, "", 1);
    }
    text
}

/// Drop blank lines, trim the rest and join them with single newlines.
pub fn clean_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── pdfium-backed source ─────────────────────────────────────────────────

/// Paths no thicker than this, in points, are strokes rather than rectangles.
const RULING_THICKNESS: f32 = 2.0;

/// Raw pages read from a PDF opened with pdfium.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
    detector: TableDetectorConfig,
}

impl<'a> PdfiumSource<'a> {
    pub fn open(pdfium: &'a Pdfium, path: &Path) -> Result<Self, TranslatorError> {
        Self::open_with(pdfium, path, TableStrategy::default())
    }

    pub fn open_with(
        pdfium: &'a Pdfium,
        path: &Path,
        strategy: TableStrategy,
    ) -> Result<Self, TranslatorError> {
        let document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| TranslatorError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: format!("{:?}", e),
                })?;
        Ok(Self {
            document,
            detector: TableDetectorConfig::with_strategy(strategy),
        })
    }

    pub fn document(&self) -> &PdfDocument<'a> {
        &self.document
    }
}

impl PageSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn raw_page(&self, index: usize) -> Result<RawPage, TranslatorError> {
        let corrupt = |e: PdfiumError| TranslatorError::CorruptPdf {
            path: PathBuf::from(format!("page {}", index + 1)),
            detail: format!("{:?}", e),
        };

        let page = self.document.pages().get(index as u16).map_err(corrupt)?;
        let text = page.text().map_err(corrupt)?;

        let spans: Vec<TextSpan> = text
            .segments()
            .iter()
            .map(|segment| {
                let bounds = segment.bounds();
                TextSpan::new(
                    segment.text(),
                    bounds.left().value,
                    bounds.bottom().value,
                    bounds.right().value,
                    bounds.top().value,
                )
            })
            .collect();

        let rulings: Vec<Ruling> = if self.detector.strategy == TableStrategy::Lines {
            page.objects()
                .iter()
                .filter(|object| object.object_type() == PdfPageObjectType::Path)
                .filter_map(|object| object.bounds().ok())
                .flat_map(|bounds| {
                    Ruling::from_bounds(
                        bounds.left().value,
                        bounds.bottom().value,
                        bounds.right().value,
                        bounds.top().value,
                        RULING_THICKNESS,
                    )
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(RawPage {
            text: text.all(),
            tables: detect_tables(&spans, &rulings, &self.detector),
        })
    }
}

/// Bind to the pdfium library, downloading it on first use.
pub(crate) fn bind_pdfium() -> Result<Pdfium, TranslatorError> {
    pdfium_auto::bind_pdfium_silent().map_err(|e| TranslatorError::PdfiumBindingFailed(e.to_string()))
}

/// Parse a PDF file into a [`Document`].
///
/// Runs inside `spawn_blocking` because pdfium calls are synchronous and
/// CPU-bound.
pub async fn parse_pdf(
    pdf_path: &Path,
    page_limit: Option<usize>,
) -> Result<Document, TranslatorError> {
    parse_pdf_with(pdf_path, page_limit, TableStrategy::default()).await
}

/// Like [`parse_pdf`] with an explicit table detection strategy.
pub async fn parse_pdf_with(
    pdf_path: &Path,
    page_limit: Option<usize>,
    strategy: TableStrategy,
) -> Result<Document, TranslatorError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let source = PdfiumSource::open_with(&pdfium, &path, strategy)?;
        info!("PDF loaded: {} pages", source.page_count());
        extract_document(&source, path.clone(), page_limit)
    })
    .await
    .map_err(|e| TranslatorError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Read document metadata without extracting any page content.
pub async fn extract_metadata(pdf_path: &Path) -> Result<DocumentMetadata, TranslatorError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let source = PdfiumSource::open(&pdfium, &path)?;
        let document = source.document();
        let metadata = document.metadata();

        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata
                .get(tag)
                .map(|t| t.value().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            page_count: source.page_count(),
            pdf_version: format!("{:?}", document.version()),
        })
    })
    .await
    .map_err(|e| TranslatorError::Internal(format!("Metadata task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ContentType;

    fn grid(rows: &[&[&str]]) -> RawTable {
        rows.iter()
            .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
            .collect()
    }

    /// In-memory pages for driving `extract_document` without pdfium.
    struct FakeSource(Vec<RawPage>);

    impl PageSource for FakeSource {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn raw_page(&self, index: usize) -> Result<RawPage, TranslatorError> {
            Ok(self.0[index].clone())
        }
    }

    #[test]
    fn page_without_tables_has_one_text_unit() {
        let page = build_page(&RawPage {
            text: "  Title  \n\n   \nBody line\n".into(),
            tables: vec![],
        })
        .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.count(ContentType::Table), 0);
        assert_eq!(page.contents()[0].to_display_string(), "Title\nBody line");
    }

    #[test]
    fn blank_page_has_no_units() {
        let page = build_page(&RawPage {
            text: " \n\t\n".into(),
            tables: vec![],
        })
        .unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn table_text_is_removed_from_prose() {
        let raw = RawPage {
            text: "Fruit prices\nName Price\nApple 3\nEnd of list".into(),
            tables: vec![grid(&[&["Name", "Price"], &["Apple", "3"]])],
        };
        let page = build_page(&raw).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.contents()[0].kind(), ContentType::Text);
        assert_eq!(
            page.contents()[0].to_display_string(),
            "Fruit prices\nEnd of list"
        );
        assert_eq!(page.contents()[1].kind(), ContentType::Table);
    }

    #[test]
    fn only_first_occurrence_of_a_cell_is_removed() {
        let text = "Apple pie uses Apple and Apple";
        let stripped = strip_table_text(text, &[grid(&[&["Apple"]])]);
        assert_eq!(stripped, " pie uses Apple and Apple");
        assert_eq!(
            text.matches("Apple").count() - stripped.matches("Apple").count(),
            1
        );
    }

    #[test]
    fn repeated_cells_remove_one_occurrence_each() {
        let text = "x x x";
        let stripped = strip_table_text(text, &[grid(&[&["x", "x"]])]);
        assert_eq!(stripped.matches('x').count(), 1);
    }

    #[test]
    fn absent_cells_are_ignored() {
        let table: RawTable = vec![
            vec![Some("a".into()), None],
            vec![None, Some("".into())],
        ];
        assert_eq!(strip_table_text("abc", &[table]), "bc");
    }

    #[test]
    fn tables_follow_text_in_supplied_order() {
        let raw = RawPage {
            text: "intro".into(),
            tables: vec![grid(&[&["first"], &["1"]]), grid(&[&["second"], &["2"]])],
        };
        let page = build_page(&raw).unwrap();
        let kinds: Vec<ContentType> = page.contents().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![ContentType::Text, ContentType::Table, ContentType::Table]
        );
        assert_eq!(page.contents()[1].to_display_string(), r#"[{"first":"1"}]"#);
    }

    #[test]
    fn ragged_grid_fails_page_construction() {
        let raw = RawPage {
            text: String::new(),
            tables: vec![vec![
                vec![Some("a".into()), Some("b".into())],
                vec![Some("1".into())],
            ]],
        };
        assert!(matches!(
            build_page(&raw),
            Err(TableShapeError::RaggedRow { .. })
        ));
    }

    #[test]
    fn page_limit_beyond_document_is_rejected() {
        let source = FakeSource(vec![RawPage::default(); 3]);
        let err = extract_document(&source, "book.pdf", Some(5)).unwrap_err();
        assert!(matches!(
            err,
            TranslatorError::PageOutOfRange {
                available: 3,
                requested: 5
            }
        ));
    }

    #[test]
    fn page_limit_truncates() {
        let pages = vec![
            RawPage { text: "one".into(), tables: vec![] },
            RawPage { text: "two".into(), tables: vec![] },
            RawPage { text: "three".into(), tables: vec![] },
        ];
        let doc = extract_document(&FakeSource(pages.clone()), "book.pdf", Some(2)).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.source_path(), Path::new("book.pdf"));

        let doc = extract_document(&FakeSource(pages), "book.pdf", None).unwrap();
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn ragged_table_reports_its_page() {
        let pages = vec![
            RawPage { text: "ok".into(), tables: vec![] },
            RawPage {
                text: String::new(),
                tables: vec![vec![vec![Some("a".into()), Some("b".into())], vec![None]]],
            },
        ];
        let err = extract_document(&FakeSource(pages), "book.pdf", None).unwrap_err();
        assert!(matches!(err, TranslatorError::TableShape { page: 2, .. }));
    }
}
