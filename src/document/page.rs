//! A single page: content units in reading order.

use super::content::{Content, ContentType};

/// Ordered content units of one physical page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    contents: Vec<Content>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit after everything already on the page.
    pub fn add_content(&mut self, content: Content) {
        self.contents.push(content);
    }

    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    pub fn contents_mut(&mut self) -> &mut [Content] {
        &mut self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Number of units of the given kind.
    pub fn count(&self, kind: ContentType) -> usize {
        self.contents.iter().filter(|c| c.kind() == kind).count()
    }
}
