//! Story building: flatten a translated document into a flow of blocks.
//!
//! Both writers consume the same [`Story`], so the decisions about what is
//! rendered (accepted translations only), how text is split into
//! paragraphs and where page breaks go are made once, here.

use crate::document::{ContentType, ContentValue, Document, TableGrid};
use crate::error::TranslatorError;
use tracing::debug;

/// One block of output.
#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    /// A single line of translated text.
    Paragraph(String),
    /// A translated table, header first.
    Table(TableGrid),
    /// End of a source page; never emitted after the last page.
    PageBreak,
}

/// The ordered blocks of a document ready for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Story {
    flowables: Vec<Flowable>,
}

impl Story {
    pub fn flowables(&self) -> &[Flowable] {
        &self.flowables
    }

    pub fn is_empty(&self) -> bool {
        self.flowables.is_empty()
    }

    fn push(&mut self, flowable: Flowable) {
        self.flowables.push(flowable);
    }
}

impl From<Vec<Flowable>> for Story {
    fn from(flowables: Vec<Flowable>) -> Self {
        Self { flowables }
    }
}

/// Build the story for `document`.
///
/// Units that did not succeed are skipped without looking at their
/// translation slot. Image units are skipped as well: neither writer has an
/// image form.
///
/// # Errors
/// [`TranslatorError::Render`] when a translated table does not have the
/// original's column count.
pub fn build_story(document: &Document) -> Result<Story, TranslatorError> {
    let mut story = Story::default();
    let last = document.page_count().saturating_sub(1);

    for (page_idx, page) in document.pages().iter().enumerate() {
        for (index, content) in page.contents().iter().enumerate() {
            if !content.succeeded() {
                continue;
            }
            match content.kind() {
                ContentType::Text => {
                    if let Some(text) = content.translated_text() {
                        for line in text.split('\n') {
                            story.push(Flowable::Paragraph(line.to_string()));
                        }
                    }
                }
                ContentType::Table => {
                    if let Some(grid) = content.translated_table() {
                        let expected = original_columns(content.original());
                        if grid.column_count() != expected {
                            return Err(TranslatorError::Render {
                                path: document.source_path().to_path_buf(),
                                detail: format!(
                                    "page {}, unit {}: translated table has {} columns, original has {}",
                                    page_idx + 1,
                                    index,
                                    grid.column_count(),
                                    expected
                                ),
                            });
                        }
                        story.push(Flowable::Table(grid.clone()));
                    }
                }
                ContentType::Image => {
                    debug!("Page {}, unit {}: image skipped", page_idx + 1, index);
                }
            }
        }
        if page_idx < last {
            story.push(Flowable::PageBreak);
        }
    }

    Ok(story)
}

fn original_columns(original: &ContentValue) -> usize {
    match original {
        ContentValue::Table(grid) => grid.column_count(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Content, Page};

    fn translated_text(original: &str, translation: &str) -> Content {
        let mut c = Content::text(original);
        c.set_translation(ContentValue::Text(translation.into()), true)
            .unwrap();
        c
    }

    fn grid(columns: &[&str], rows: &[&[&str]]) -> TableGrid {
        TableGrid::new(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn page(contents: Vec<Content>) -> Page {
        let mut p = Page::new();
        for c in contents {
            p.add_content(c);
        }
        p
    }

    #[test]
    fn page_breaks_only_between_pages() {
        let mut doc = Document::new("book.pdf");
        doc.add_page(page(vec![translated_text("a", "A")]));
        doc.add_page(page(vec![translated_text("b", "B")]));
        doc.add_page(page(vec![translated_text("c", "C")]));

        let story = build_story(&doc).unwrap();
        assert_eq!(
            story.flowables(),
            &[
                Flowable::Paragraph("A".into()),
                Flowable::PageBreak,
                Flowable::Paragraph("B".into()),
                Flowable::PageBreak,
                Flowable::Paragraph("C".into()),
            ]
        );
    }

    #[test]
    fn failed_units_are_omitted() {
        let mut table = Content::table(grid(&["a"], &[&["1"]]));
        table
            .set_translation(ContentValue::Text("not json".into()), true)
            .unwrap();
        assert!(!table.succeeded());

        let mut doc = Document::new("book.pdf");
        doc.add_page(page(vec![translated_text("x", "Hello\nWorld"), table]));

        let story = build_story(&doc).unwrap();
        assert_eq!(
            story.flowables(),
            &[
                Flowable::Paragraph("Hello".into()),
                Flowable::Paragraph("World".into()),
            ]
        );
    }

    #[test]
    fn single_page_has_no_break() {
        let mut doc = Document::new("book.pdf");
        doc.add_page(page(vec![]));
        assert!(build_story(&doc).unwrap().is_empty());
    }

    #[test]
    fn translated_table_is_kept() {
        let mut table = Content::table(grid(&["name", "age"], &[&["Ann", "3"]]));
        table
            .set_translation(
                ContentValue::Text(r#"[{"name":"Anne","age":"3 ans"}]"#.into()),
                true,
            )
            .unwrap();

        let mut doc = Document::new("book.pdf");
        doc.add_page(page(vec![table]));

        let story = build_story(&doc).unwrap();
        assert_eq!(
            story.flowables(),
            &[Flowable::Table(grid(&["name", "age"], &[&["Anne", "3 ans"]]))]
        );
    }
}
