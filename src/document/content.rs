//! Content units: the smallest piece of a page that is translated on its own.

use super::table::TableGrid;
use crate::error::ContentError;
use image::DynamicImage;
use std::fmt;
use tracing::{debug, error};

/// The kind of material a [`Content`] unit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Text,
    Table,
    Image,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentType::Text => "text",
            ContentType::Table => "table",
            ContentType::Image => "image",
        })
    }
}

/// A value in the representation family of one [`ContentType`].
#[derive(Debug, Clone)]
pub enum ContentValue {
    Text(String),
    Table(TableGrid),
    Image(DynamicImage),
}

impl ContentValue {
    pub fn kind(&self) -> ContentType {
        match self {
            ContentValue::Text(_) => ContentType::Text,
            ContentValue::Table(_) => ContentType::Table,
            ContentValue::Image(_) => ContentType::Image,
        }
    }
}

impl fmt::Display for ContentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentValue::Text(text) => f.write_str(text),
            ContentValue::Table(grid) => f.write_str(&grid.to_records_json()),
            ContentValue::Image(img) => write!(f, "<image {}x{}>", img.width(), img.height()),
        }
    }
}

/// One translatable unit: original value, optional translation and a success flag.
///
/// The translation is only meaningful when [`Content::succeeded`] is true;
/// writers never look at it otherwise.
#[derive(Debug, Clone)]
pub struct Content {
    kind: ContentType,
    original: ContentValue,
    translation: Option<ContentValue>,
    succeeded: bool,
    error: Option<ContentError>,
}

impl Content {
    /// Wrap an original value; the unit starts untranslated.
    pub fn new(original: ContentValue) -> Self {
        Self {
            kind: original.kind(),
            original,
            translation: None,
            succeeded: false,
            error: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ContentValue::Text(text.into()))
    }

    pub fn table(grid: TableGrid) -> Self {
        Self::new(ContentValue::Table(grid))
    }

    pub fn image(img: DynamicImage) -> Self {
        Self::new(ContentValue::Image(img))
    }

    pub fn kind(&self) -> ContentType {
        self.kind
    }

    pub fn original(&self) -> &ContentValue {
        &self.original
    }

    /// The accepted translation, if any.
    pub fn translation(&self) -> Option<&ContentValue> {
        self.translation.as_ref()
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Why the last translation attempt was rejected, if it was.
    pub fn error(&self) -> Option<&ContentError> {
        self.error.as_ref()
    }

    /// Canonical string of the original value, used for logs and prompts.
    pub fn to_display_string(&self) -> String {
        self.original.to_string()
    }

    /// Translated text, when this is a text unit with an accepted translation.
    pub fn translated_text(&self) -> Option<&str> {
        match (&self.translation, self.succeeded) {
            (Some(ContentValue::Text(text)), true) => Some(text),
            _ => None,
        }
    }

    /// Translated grid, when this is a table unit with an accepted translation.
    pub fn translated_table(&self) -> Option<&TableGrid> {
        match (&self.translation, self.succeeded) {
            (Some(ContentValue::Table(grid)), true) => Some(grid),
            _ => None,
        }
    }

    /// Attach a translation, validating it against this unit's kind.
    ///
    /// Text and image units accept only a value of their own kind and return
    /// [`ContentError::TypeMismatch`] otherwise. Table units accept either a
    /// grid or the raw model response (a JSON array of row objects, possibly
    /// fenced); a response that renames the original's keys, or cannot be
    /// rebuilt into a grid of the original's width, is logged and leaves the
    /// unit untranslated.
    /// Table units never return an error.
    ///
    /// `succeeded` is the backend's own verdict; a translation it did not
    /// vouch for is not kept.
    pub fn set_translation(
        &mut self,
        value: ContentValue,
        succeeded: bool,
    ) -> Result<(), ContentError> {
        self.translation = None;
        self.succeeded = false;
        self.error = None;

        let accepted = match (self.kind, value) {
            (ContentType::Table, value) => match self.parse_table(value) {
                Ok(grid) => ContentValue::Table(grid),
                Err(e) => {
                    error!("An error occurred during table translation: {}", e);
                    self.error = Some(e);
                    return Ok(());
                }
            },
            (kind, value) if value.kind() == kind => value,
            (kind, value) => {
                return Err(ContentError::TypeMismatch {
                    expected: kind,
                    found: value.kind(),
                })
            }
        };

        if succeeded {
            self.translation = Some(accepted);
            self.succeeded = true;
        } else {
            debug!("Backend reported an unsuccessful {} translation", self.kind);
        }
        Ok(())
    }

    /// Record a failure that happened before any translation was produced.
    pub(crate) fn mark_failed(&mut self, error: ContentError) {
        self.translation = None;
        self.succeeded = false;
        self.error = Some(error);
    }

    fn parse_table(&self, value: ContentValue) -> Result<TableGrid, ContentError> {
        let ContentValue::Table(original) = &self.original else {
            return Err(ContentError::TypeMismatch {
                expected: ContentType::Table,
                found: self.kind,
            });
        };
        let grid = match value {
            ContentValue::Text(response) => original.translated_from_records(&response)?,
            ContentValue::Table(grid) => grid,
            other => {
                return Err(ContentError::TypeMismatch {
                    expected: ContentType::Table,
                    found: other.kind(),
                })
            }
        };
        debug!("Translated table: {}", grid.to_records_json());

        if grid.column_count() != original.column_count() {
            return Err(ContentError::InvalidTable(format!(
                "expected {} columns, got {}",
                original.column_count(),
                grid.column_count()
            )));
        }
        Ok(grid)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.original.fmt(f)
    }
}
