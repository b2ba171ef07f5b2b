//! Progress-callback trait for per-unit translation events.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::TranslationConfigBuilder::progress_callback`] to receive
//! an event before and after every content unit is sent to the backend.
//! Units are translated one at a time, so events arrive in reading order.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf_translate::{TranslationConfig, TranslationProgressCallback, UnitProgress};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl TranslationProgressCallback for CountingCallback {
//!     fn on_unit_complete(&self, unit: &UnitProgress) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} ({} on page {})", unit.position, unit.total, unit.kind, unit.page);
//!     }
//! }
//!
//! let config = TranslationConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::document::ContentType;
use std::sync::Arc;

/// Where a unit sits in the document and in the overall run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitProgress {
    /// 1-indexed page number.
    pub page: usize,
    /// 0-indexed position of the unit on its page.
    pub index: usize,
    pub kind: ContentType,
    /// 1-indexed position of the unit across the whole document.
    pub position: usize,
    /// Total number of units in the document.
    pub total: usize,
}

/// Called by the translator as it processes each content unit.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once before the first unit is translated.
    fn on_translation_start(&self, total_units: usize) {
        let _ = total_units;
    }

    /// Called just before the backend request for a unit is sent.
    fn on_unit_start(&self, unit: &UnitProgress) {
        let _ = unit;
    }

    /// Called when a unit's translation was accepted.
    fn on_unit_complete(&self, unit: &UnitProgress) {
        let _ = unit;
    }

    /// Called when a unit ends without an accepted translation.
    ///
    /// `error` is a human-readable description (backend failure, unparsable
    /// table, unsupported content).
    fn on_unit_error(&self, unit: &UnitProgress, error: &str) {
        let _ = (unit, error);
    }

    /// Called once after every unit has been attempted.
    fn on_translation_complete(&self, total_units: usize, translated: usize) {
        let _ = (total_units, translated);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TranslationConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;
