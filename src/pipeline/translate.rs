//! Translation dispatch: walk a document unit by unit and fill in translations.
//!
//! Units are translated strictly one after another in reading order (page
//! order, then position on the page). Each backend response is attached to
//! its unit before the next request goes out, so a run that stops early
//! leaves every earlier unit fully translated.
//!
//! ## Failure policy
//!
//! A unit can fail in three ways: the backend call errors, the unit is an
//! image (no prompt form exists), or the response cannot be rebuilt into the
//! unit's shape. By default every failure stays local to its unit: it is
//! logged, reported to the progress callback and counted in
//! [`TranslationStats`], and the unit is simply left out of the output.
//! With `fail_fast` the first backend or unsupported-content failure aborts
//! the run instead. Unparsable table responses never abort.

use crate::config::TranslationConfig;
use crate::document::{Content, ContentValue, Document};
use crate::error::{BackendError, ContentError, TranslatorError};
use crate::output::TranslationStats;
use crate::pipeline::llm::TranslationBackend;
use crate::progress::UnitProgress;
use crate::prompts;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives a [`TranslationBackend`] over every unit of a [`Document`].
pub struct Translator<B> {
    backend: B,
    config: TranslationConfig,
}

enum UnitError {
    Backend(BackendError),
    Content(ContentError),
}

impl From<BackendError> for UnitError {
    fn from(e: BackendError) -> Self {
        UnitError::Backend(e)
    }
}

impl From<ContentError> for UnitError {
    fn from(e: ContentError) -> Self {
        UnitError::Content(e)
    }
}

impl<B: TranslationBackend> Translator<B> {
    pub fn new(backend: B, config: TranslationConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Translate every unit of `document` and hand it back.
    ///
    /// # Errors
    /// Only when `fail_fast` is set: the first backend failure
    /// ([`TranslatorError::Backend`]) or image unit
    /// ([`TranslatorError::Content`]) aborts the run and the document is
    /// dropped.
    pub async fn translate(
        &self,
        mut document: Document,
    ) -> Result<(Document, TranslationStats), TranslatorError> {
        let start = Instant::now();
        let total = document.unit_count();
        let callback = self.config.progress_callback.as_ref();
        info!(
            "Translating {} units on {} pages ({} → {}, model {})",
            total,
            document.page_count(),
            self.config.source_language,
            self.config.target_language,
            self.config.model_id()
        );

        if let Some(cb) = callback {
            cb.on_translation_start(total);
        }

        let mut stats = TranslationStats {
            total_units: total,
            ..Default::default()
        };
        let mut position = 0;

        for (page_idx, page) in document.pages_mut().iter_mut().enumerate() {
            for (index, content) in page.contents_mut().iter_mut().enumerate() {
                position += 1;
                let unit = UnitProgress {
                    page: page_idx + 1,
                    index,
                    kind: content.kind(),
                    position,
                    total,
                };
                if let Some(cb) = callback {
                    cb.on_unit_start(&unit);
                }

                let failure = match self.translate_unit(content).await {
                    Ok(()) if content.succeeded() => None,
                    Ok(()) => Some(
                        content
                            .error()
                            .map(|e| e.to_string())
                            .unwrap_or_else(|| "backend reported an unsuccessful translation".into()),
                    ),
                    Err(UnitError::Backend(e)) => {
                        content.mark_failed(ContentError::Backend(e.to_string()));
                        if self.config.fail_fast {
                            return Err(TranslatorError::Backend {
                                page: unit.page,
                                index,
                                source: e,
                            });
                        }
                        Some(e.to_string())
                    }
                    Err(UnitError::Content(e)) => {
                        content.mark_failed(e.clone());
                        if self.config.fail_fast {
                            return Err(TranslatorError::Content {
                                page: unit.page,
                                index,
                                source: e,
                            });
                        }
                        Some(e.to_string())
                    }
                };

                match failure {
                    None => {
                        stats.translated_units += 1;
                        if let Some(cb) = callback {
                            cb.on_unit_complete(&unit);
                        }
                    }
                    Some(msg) => {
                        stats.failed_units += 1;
                        warn!(
                            "Page {}, {} unit {}: left untranslated: {}",
                            unit.page, unit.kind, index, msg
                        );
                        if let Some(cb) = callback {
                            cb.on_unit_error(&unit, &msg);
                        }
                    }
                }
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Translation complete: {}/{} units in {}ms",
            stats.translated_units, stats.total_units, stats.duration_ms
        );
        if let Some(cb) = callback {
            cb.on_translation_complete(total, stats.translated_units);
        }

        Ok((document, stats))
    }

    async fn translate_unit(&self, content: &mut Content) -> Result<(), UnitError> {
        let prompt = prompts::translate_prompt(
            content,
            &self.config.source_language,
            &self.config.target_language,
        )?;
        debug!("[{} prompt]\n{}", content.kind(), prompt);

        let (response, succeeded) = self
            .backend
            .translate(&prompt, self.config.model_id())
            .await?;
        debug!("[{} response]\n{}", content.kind(), response);

        content.set_translation(ContentValue::Text(response), succeeded)?;
        Ok(())
    }
}
