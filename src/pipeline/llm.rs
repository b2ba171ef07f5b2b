//! Translation backends: the one place that talks to a language model.
//!
//! The translator only needs "send this prompt to this model, give me the
//! text back". [`TranslationBackend`] is that seam; [`LlmBackend`] implements
//! it on top of any `edgequake_llm` provider (OpenAI, Anthropic, Gemini,
//! Ollama, Azure, …), and tests plug in scripted backends instead.

use crate::error::{BackendError, TranslatorError};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A request/response translation capability.
pub trait TranslationBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Send `prompt` to `model` and return `(response_text, succeeded)`.
    ///
    /// `Err` means the call itself failed (network, auth, quota).
    fn translate(
        &self,
        prompt: &str,
        model: &str,
    ) -> impl Future<Output = Result<(String, bool), BackendError>> + Send;
}

/// A [`TranslationBackend`] backed by an `edgequake_llm` provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    name: String,
    model: String,
    options: CompletionOptions,
}

impl LlmBackend {
    /// Wrap an already-configured provider bound to `model`.
    pub fn new(provider: Arc<dyn LLMProvider>, name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
            model: model.into(),
            options: CompletionOptions::default(),
        }
    }

    /// Create a provider by name (`openai`, `anthropic`, `gemini`, `ollama`, …).
    ///
    /// The API key is read from the provider's usual environment variable.
    /// An unknown name or a missing key is a configuration error.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, TranslatorError> {
        let provider = create_provider(provider_name, model)?;
        Ok(Self::new(provider, provider_name, model))
    }

    /// Set sampling temperature and output budget for every request.
    pub fn with_options(mut self, temperature: f32, max_tokens: usize) -> Self {
        self.options = CompletionOptions {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
            ..Default::default()
        };
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The provider to use for `model`: the bound one, or a fresh one by name.
    fn provider_for(&self, model: &str) -> Result<Arc<dyn LLMProvider>, BackendError> {
        if model == self.model {
            return Ok(Arc::clone(&self.provider));
        }
        create_provider(&self.name, model).map_err(|e| BackendError::new(&self.name, e.to_string()))
    }
}

impl TranslationBackend for LlmBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, prompt: &str, model: &str) -> Result<(String, bool), BackendError> {
        let start = Instant::now();
        let provider = self.provider_for(model)?;
        let messages = vec![ChatMessage::user(prompt)];

        let response = provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| BackendError::new(&self.name, e.to_string()))?;

        debug!(
            "{} ({}): {} input tokens, {} output tokens, {:?}",
            self.name,
            model,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        let succeeded = !response.content.trim().is_empty();
        Ok((response.content, succeeded))
    }
}

/// Create a named provider bound to `model`; the API key comes from the environment.
pub(crate) fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, TranslatorError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        TranslatorError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
