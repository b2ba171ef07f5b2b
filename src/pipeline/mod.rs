//! Pipeline stages for PDF translation.
//!
//! Each submodule implements exactly one step, so each can be tested alone
//! and the PDF or LLM backend swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ translate ──▶ (writer)
//! (URL/path)  (pdfium +    (llm backend,
//!              tables)      one unit at a time)
//! ```
//!
//! 1. [`input`]     canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]   read page text and detected tables through pdfium and
//!    build the [`crate::document::Document`]; runs in `spawn_blocking`
//! 3. [`tables`]    recover table grids from positioned text segments
//! 4. [`translate`] send every content unit to the backend in reading order
//! 5. [`llm`]       the translation backend seam and its `edgequake_llm`
//!    implementation; the only stage with network I/O

pub mod extract;
pub mod input;
pub mod llm;
pub mod tables;
pub mod translate;
