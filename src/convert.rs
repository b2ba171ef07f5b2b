//! Whole-run entry points: resolve, extract, translate, write.
//!
//! [`translate_pdf`] is the one-call API. The stages it chains are public
//! too ([`crate::pipeline::extract::parse_pdf`], [`crate::Translator`],
//! [`crate::writer::write_document`]) for callers that want to inspect or
//! edit the document between steps.

use crate::config::{OutputFormat, TranslationConfig, DEFAULT_MODEL};
use crate::document::translated_path;
use crate::error::TranslatorError;
use crate::output::{DocumentMetadata, TranslationSummary};
use crate::pipeline::extract;
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::llm::{create_provider, LlmBackend, TranslationBackend};
use crate::pipeline::translate::Translator;
use crate::writer;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Translate a PDF file or URL and write the result.
///
/// The output format follows the extension of `output` (`.pdf`, `.md`,
/// `.markdown`); with no `output` a PDF is written next to the source as
/// `<stem>_translated.pdf` (in the working directory for URL inputs).
///
/// # Errors
/// Fatal errors only: unsupported output extension (checked first, before
/// any work), unreadable input, no configured provider, a page limit beyond
/// the document, and under `fail_fast` the first failed unit. Units that
/// fail otherwise are left out of the output and counted in the summary.
pub async fn translate_pdf(
    input_str: impl AsRef<str>,
    output: Option<&Path>,
    config: &TranslationConfig,
) -> Result<TranslationSummary, TranslatorError> {
    check_output(output, config)?;
    let backend = resolve_backend(config)?;
    let mut run_config = config.clone();
    run_config.model = Some(backend.model().to_string());
    translate_pdf_with(input_str, output, backend, &run_config).await
}

/// Like [`translate_pdf`] but with a caller-supplied backend.
pub async fn translate_pdf_with<B: TranslationBackend>(
    input_str: impl AsRef<str>,
    output: Option<&Path>,
    backend: B,
    config: &TranslationConfig,
) -> Result<TranslationSummary, TranslatorError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting translation: {}", input_str);

    // ── Step 1: Output format and path ───────────────────────────────────
    let format = check_output(output, config)?;

    // ── Step 2: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(&resolved, format));

    // ── Step 3: Extract ──────────────────────────────────────────────────
    let document =
        extract::parse_pdf_with(resolved.path(), config.page_limit, config.table_strategy).await?;
    let pages = document.page_count();
    info!("Extracted {} units from {} pages", document.unit_count(), pages);

    // ── Step 4: Translate ────────────────────────────────────────────────
    let translator = Translator::new(backend, config.clone());
    let (document, stats) = translator.translate(document).await?;

    // ── Step 5: Write ────────────────────────────────────────────────────
    let (output_path, format) =
        writer::write_document(document, Some(&output_path), config).await?;

    let summary = TranslationSummary {
        output_path,
        format,
        pages,
        stats,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Translation complete: {}/{} units, {}ms total",
        summary.stats.translated_units, summary.stats.total_units, summary.total_duration_ms
    );
    Ok(summary)
}

/// Synchronous wrapper around [`translate_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn translate_pdf_sync(
    input_str: impl AsRef<str>,
    output: Option<&Path>,
    config: &TranslationConfig,
) -> Result<TranslationSummary, TranslatorError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TranslatorError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(translate_pdf(input_str, output, config))
}

/// Read PDF metadata without translating anything.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, TranslatorError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    extract::extract_metadata(resolved.path()).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn default_output(resolved: &ResolvedInput, format: OutputFormat) -> PathBuf {
    translated_path(&resolved.output_anchor(), format)
}

/// Build the translation backend, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, both set.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set, so a machine with several keys
///    defaults to it.
/// 5. **Full auto-detection** through [`ProviderFactory::from_env`].
pub fn resolve_backend(config: &TranslationConfig) -> Result<LlmBackend, TranslatorError> {
    let backend = |provider: Arc<dyn LLMProvider>, name: &str, model: &str| {
        LlmBackend::new(provider, name, model).with_options(config.temperature, config.max_tokens)
    };

    if let Some(ref provider) = config.provider {
        let name = config.provider_name.as_deref().unwrap_or("custom");
        return Ok(backend(Arc::clone(provider), name, config.model_id()));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model_id();
        return Ok(backend(create_provider(name, model)?, name, model));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            let model = config.model.as_deref().unwrap_or(&model);
            return Ok(backend(create_provider(&prov, model)?, &prov, model));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return Ok(backend(create_provider("openai", model)?, "openai", model));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| TranslatorError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;
    Ok(backend(llm_provider, "auto", config.model_id()))
}

/// Settle the output format and reject outputs the writer cannot produce.
fn check_output(
    output: Option<&Path>,
    config: &TranslationConfig,
) -> Result<OutputFormat, TranslatorError> {
    let format = OutputFormat::from_path(output)?;
    if format == OutputFormat::Pdf {
        writer::pdf::check_font(&config.target_language, config.font_path.as_deref())?;
    }
    Ok(format)
}
