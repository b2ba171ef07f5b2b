//! Configuration types for PDF translation.
//!
//! All translation behaviour is controlled through [`TranslationConfig`],
//! built via its [`TranslationConfigBuilder`]. The builder lets callers set
//! only the languages and model they care about and rely on the defaults for
//! the rest; [`TranslationConfigBuilder::build`] rejects combinations that
//! cannot produce a useful run.

use crate::error::TranslatorError;
use crate::pipeline::tables::TableStrategy;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Configuration for one PDF translation run.
///
/// # Example
/// ```rust
/// use edgequake_pdf_translate::TranslationConfig;
///
/// let config = TranslationConfig::builder()
///     .source_language("English")
///     .target_language("French")
///     .page_limit(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.page_limit, Some(3));
/// ```
#[derive(Clone)]
pub struct TranslationConfig {
    /// Language the document is written in. Default: "English".
    pub source_language: String,

    /// Language to translate into. Default: "Chinese".
    pub target_language: String,

    /// LLM model identifier sent with every request, e.g. "gpt-4.1-mini".
    /// If None, [`DEFAULT_MODEL`] is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Translate only the first N pages. Default: all pages.
    ///
    /// Asking for more pages than the document has is an error, not a clamp.
    pub page_limit: Option<usize>,

    /// Sampling temperature for each translation call. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per content unit. Default: 4096.
    pub max_tokens: usize,

    /// How tables are found on each page. Default: ruling lines.
    pub table_strategy: TableStrategy,

    /// Abort the whole run on the first unit that cannot be translated. Default: false.
    ///
    /// When false a failed unit is logged, reported to the progress callback
    /// and left out of the output while the rest of the document is still
    /// translated.
    pub fail_fast: bool,

    /// TrueType font used by the PDF writer. Default: built-in Helvetica.
    ///
    /// Helvetica only covers Latin-1; CJK targets need a font such as
    /// SimSun or Noto Sans CJK here, and PDF output in a CJK language is
    /// rejected without one.
    pub font_path: Option<PathBuf>,

    /// Body font size of the PDF writer, in points. Default: 12.
    pub font_size: f32,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-unit progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_language: "English".to_string(),
            target_language: "Chinese".to_string(),
            model: None,
            provider_name: None,
            provider: None,
            page_limit: None,
            temperature: 0.3,
            max_tokens: 4096,
            table_strategy: TableStrategy::default(),
            fail_fast: false,
            font_path: None,
            font_size: 12.0,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("source_language", &self.source_language)
            .field("target_language", &self.target_language)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("page_limit", &self.page_limit)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("table_strategy", &self.table_strategy)
            .field("fail_fast", &self.fail_fast)
            .field("font_path", &self.font_path)
            .field("font_size", &self.font_size)
            .finish()
    }
}

impl TranslationConfig {
    /// Create a new builder for `TranslationConfig`.
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model identifier to send with each request.
    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`TranslationConfig`].
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    pub fn source_language(mut self, lang: impl Into<String>) -> Self {
        self.config.source_language = lang.into();
        self
    }

    pub fn target_language(mut self, lang: impl Into<String>) -> Self {
        self.config.target_language = lang.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn page_limit(mut self, pages: usize) -> Self {
        self.config.page_limit = Some(pages);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn table_strategy(mut self, strategy: TableStrategy) -> Self {
        self.config.table_strategy = strategy;
        self
    }

    pub fn fail_fast(mut self, v: bool) -> Self {
        self.config.fail_fast = v;
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.config.font_size = size.clamp(4.0, 72.0);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslationConfig, TranslatorError> {
        let c = &self.config;
        if c.target_language.trim().is_empty() {
            return Err(TranslatorError::InvalidConfig(
                "Target language must not be empty".into(),
            ));
        }
        if c.source_language.trim() == c.target_language.trim() {
            return Err(TranslatorError::InvalidConfig(format!(
                "Source and target language are both '{}'",
                c.target_language
            )));
        }
        if c.page_limit == Some(0) {
            return Err(TranslatorError::InvalidConfig(
                "Page limit must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Output format ────────────────────────────────────────────────────────

/// The kind of artifact a writer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Paginated PDF (default).
    #[default]
    Pdf,
    /// Flat Markdown text.
    Markdown,
}

impl OutputFormat {
    /// Pick the format implied by an output path's extension.
    ///
    /// No path means the default PDF writer. Any extension other than
    /// `.pdf`, `.md` or `.markdown` (case-insensitive) is rejected.
    pub fn from_path(path: Option<&Path>) -> Result<Self, TranslatorError> {
        let Some(path) = path else {
            return Ok(Self::Pdf);
        };
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "md" | "markdown" => Ok(Self::Markdown),
            _ => Err(TranslatorError::UnsupportedFormat {
                extension: format!(".{ext}"),
            }),
        }
    }

    /// File extension written by default for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "md",
        }
    }
}
