//! Translation prompts, one per translatable content kind.
//!
//! Keeping every prompt here means changing the wording touches exactly one
//! file, and unit tests can inspect the prompts without a live backend.
//! Both prompts fence the payload with ```` ``` ```` and ask for an
//! unfenced answer; models still add fences now and then, which the table
//! parser strips.

use crate::document::{Content, ContentType};
use crate::error::ContentError;

/// Prompt asking for a plain-text translation of `text`.
pub fn text_prompt(text: &str, source_language: &str, target_language: &str) -> String {
    format!(
        "Translate the following {source_language} text into {target_language}. \
The text to translate is wrapped in ```. Reply with the translation only, \
without wrapping it in ``` and without any commentary. Keep the line breaks.\n\n\
```{text}```"
    )
}

/// Prompt asking for a translation of a table serialised as JSON row objects.
pub fn table_prompt(table_json: &str, source_language: &str, target_language: &str) -> String {
    format!(
        "Translate the following {source_language} table into {target_language}. \
The table is wrapped in ``` and given as a JSON array of row objects. \
Keep every key exactly as given and translate only the values. \
Reply with a plain JSON array only, with one object per row and the same keys \
as the input, without wrapping it in ``` and without any commentary, \
for example [{{\"key1\": \"value1\", ...}}]\n\n\
```{table_json}```"
    )
}

/// Build the prompt for a content unit according to its kind.
///
/// Image units have no prompt form and yield [`ContentError::Unsupported`].
pub fn translate_prompt(
    content: &Content,
    source_language: &str,
    target_language: &str,
) -> Result<String, ContentError> {
    match content.kind() {
        ContentType::Text => Ok(text_prompt(
            &content.to_display_string(),
            source_language,
            target_language,
        )),
        ContentType::Table => Ok(table_prompt(
            &content.to_display_string(),
            source_language,
            target_language,
        )),
        ContentType::Image => Err(ContentError::Unsupported(ContentType::Image)),
    }
}
