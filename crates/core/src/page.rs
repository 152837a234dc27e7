//! Read-only view over a live document.
//!
//! Both the artifact cache (for fingerprinting) and the change monitor (for
//! structural snapshots) read the document through this trait, so neither is
//! tied to a particular DOM or HTML backend. Hosts wrap their document handle
//! in a `PageView` implementation; tests use [`StaticPage`].

use serde::{Deserialize, Serialize};

/// Read-only access to the parts of a document that drive caching and
/// change detection.
pub trait PageView {
    /// Document title.
    fn title(&self) -> &str;

    /// Meta description, empty string if absent.
    fn description(&self) -> &str;

    /// Text of all headings, in document order.
    fn heading_texts(&self) -> Vec<String>;

    /// Visible body text.
    fn body_text(&self) -> &str;

    /// Length of the raw markup in bytes.
    fn markup_length(&self) -> usize;

    /// Number of images in the document.
    fn image_count(&self) -> usize;

    /// Number of links in the document.
    fn link_count(&self) -> usize;
}

/// An in-memory `PageView` backed by plain fields.
///
/// Used in tests and by hosts that already hold extracted content rather
/// than a live document handle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticPage {
    pub title: String,
    pub description: String,
    pub headings: Vec<String>,
    pub body: String,
    pub markup_length: usize,
    pub image_count: usize,
    pub link_count: usize,
}

impl PageView for StaticPage {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn heading_texts(&self) -> Vec<String> {
        self.headings.clone()
    }

    fn body_text(&self) -> &str {
        &self.body
    }

    fn markup_length(&self) -> usize {
        self.markup_length
    }

    fn image_count(&self) -> usize {
        self.image_count
    }

    fn link_count(&self) -> usize {
        self.link_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_page_view() {
        let page = StaticPage {
            title: "Home".into(),
            description: "Landing page".into(),
            headings: vec!["Welcome".into(), "Features".into()],
            body: "hello world".into(),
            markup_length: 512,
            image_count: 3,
            link_count: 7,
        };

        let view: &dyn PageView = &page;
        assert_eq!(view.title(), "Home");
        assert_eq!(view.heading_texts().len(), 2);
        assert_eq!(view.body_text(), "hello world");
        assert_eq!(view.link_count(), 7);
    }
}
