//! Offline pipeline tests: extract → translate → write through the public API.
//!
//! Pages come from an in-memory `PageSource` and translations from a
//! scripted backend, so neither pdfium nor an API key is needed.

use edgequake_pdf_translate::{
    extract_document, write_document, BackendError, ContentType, OutputFormat, PageSource,
    RawPage, TranslationBackend, TranslationConfig, Translator, TranslatorError,
};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

// ── Test helpers ─────────────────────────────────────────────────────────────

struct MemorySource(Vec<RawPage>);

impl PageSource for MemorySource {
    fn page_count(&self) -> usize {
        self.0.len()
    }

    fn raw_page(&self, index: usize) -> Result<RawPage, TranslatorError> {
        Ok(self.0[index].clone())
    }
}

/// "Translates" by upper-casing the fenced payload of each prompt.
///
/// Table payloads keep their keys; only the cell values are upper-cased.
struct ShoutingBackend {
    calls: AtomicUsize,
}

impl ShoutingBackend {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

fn payload(prompt: &str) -> &str {
    let body = prompt.strip_suffix("```").expect("prompt ends with a fence");
    let start = body.rfind("```").expect("prompt has an opening fence");
    &body[start + 3..]
}

fn shout(payload: &str) -> String {
    match serde_json::from_str::<Vec<Map<String, Value>>>(payload) {
        Ok(records) => Value::Array(
            records
                .into_iter()
                .map(|record| {
                    Value::Object(
                        record
                            .into_iter()
                            .map(|(key, value)| match value {
                                Value::String(s) => (key, Value::String(s.to_uppercase())),
                                other => (key, other),
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
        .to_string(),
        Err(_) => payload.to_uppercase(),
    }
}

impl TranslationBackend for ShoutingBackend {
    fn name(&self) -> &str {
        "shouting"
    }

    async fn translate(&self, prompt: &str, _model: &str) -> Result<(String, bool), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((shout(payload(prompt)), true))
    }
}

struct DownBackend;

impl TranslationBackend for DownBackend {
    fn name(&self) -> &str {
        "down"
    }

    async fn translate(&self, _prompt: &str, _model: &str) -> Result<(String, bool), BackendError> {
        Err(BackendError::new("down", "connection refused"))
    }
}

fn cell_row(cells: &[&str]) -> Vec<Option<String>> {
    cells.iter().map(|c| Some(c.to_string())).collect()
}

fn fruit_book() -> MemorySource {
    MemorySource(vec![
        RawPage {
            text: "Fruit prices\nName Price\nApple 3\nSee table above".into(),
            tables: vec![vec![cell_row(&["Name", "Price"]), cell_row(&["Apple", "3"])]],
        },
        RawPage {
            text: "The end".into(),
            tables: vec![],
        },
    ])
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn extraction_separates_prose_from_tables() {
    let doc = extract_document(&fruit_book(), "fruit.pdf", None).unwrap();
    assert_eq!(doc.page_count(), 2);

    let page = &doc.pages()[0];
    assert_eq!(page.count(ContentType::Text), 1);
    assert_eq!(page.count(ContentType::Table), 1);
    assert_eq!(
        page.contents()[0].to_display_string(),
        "Fruit prices\nSee table above"
    );
    assert_eq!(
        page.contents()[1].to_display_string(),
        r#"[{"Name":"Apple","Price":"3"}]"#
    );
}

#[test]
fn page_range_error_carries_both_counts() {
    let source = MemorySource(vec![RawPage::default(); 3]);
    match extract_document(&source, "short.pdf", Some(5)) {
        Err(TranslatorError::PageOutOfRange {
            available,
            requested,
        }) => assert_eq!((available, requested), (3, 5)),
        other => panic!("expected PageOutOfRange, got {:?}", other.map(|d| d.page_count())),
    }
}

#[tokio::test]
async fn full_run_writes_exact_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("fruit_zh.md");
    let config = TranslationConfig::default();

    let doc = extract_document(&fruit_book(), dir.path().join("fruit.pdf"), None).unwrap();
    let translator = Translator::new(ShoutingBackend::new(), config.clone());
    let (doc, stats) = translator.translate(doc).await.unwrap();

    assert_eq!(translator.backend().calls.load(Ordering::SeqCst), 3);
    assert_eq!(stats.total_units, 3);
    assert_eq!(stats.translated_units, 3);
    assert_eq!(stats.failed_units, 0);

    let (path, format) = write_document(doc, Some(&out), &config).await.unwrap();
    assert_eq!(path, out);
    assert_eq!(format, OutputFormat::Markdown);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "FRUIT PRICES\n\n\
         SEE TABLE ABOVE\n\n\
         | Name | Price |\n| --- | --- |\n| APPLE | 3 |\n\n\
         ---\n\n\
         THE END\n\n"
    );
}

#[tokio::test]
async fn backend_outage_leaves_units_out_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("fruit.md");
    let config = TranslationConfig::default();

    let doc = extract_document(&fruit_book(), "fruit.pdf", None).unwrap();
    let (doc, stats) = Translator::new(DownBackend, config.clone())
        .translate(doc)
        .await
        .unwrap();
    assert_eq!(stats.failed_units, 3);

    write_document(doc, Some(&out), &config).await.unwrap();
    // Only the page divider survives.
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "---\n\n");
}

#[tokio::test]
async fn backend_outage_aborts_under_fail_fast() {
    let config = TranslationConfig::builder().fail_fast(true).build().unwrap();
    let doc = extract_document(&fruit_book(), "fruit.pdf", None).unwrap();

    let err = Translator::new(DownBackend, config)
        .translate(doc)
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        TranslatorError::Backend { page: 1, index: 0, .. }
    ));
}

#[tokio::test]
async fn default_output_sits_next_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("fruit.pdf");
    let config = TranslationConfig::default();

    let doc = extract_document(&fruit_book(), &source, None).unwrap();
    assert_eq!(
        doc.default_output_path(OutputFormat::Pdf),
        dir.path().join("fruit_translated.pdf")
    );
    let (doc, _) = Translator::new(ShoutingBackend::new(), config.clone())
        .translate(doc)
        .await
        .unwrap();

    let out = dir.path().join("chosen.markdown");
    let (path, _) = write_document(doc, Some(&out), &config).await.unwrap();
    assert_eq!(path, out);
}
