//! Structural page snapshots.
//!
//! A [`PageSnapshot`] is a small, cheap-to-compute fingerprint of a
//! document's structure. The change monitor compares consecutive snapshots
//! to score how much a page changed; snapshots are never stored in the
//! artifact cache.

use crate::page::PageView;
use serde::{Deserialize, Serialize};

/// Structural fingerprint of a live document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub title: String,
    pub description: String,
    pub heading_count: usize,
    pub image_count: usize,
    pub link_count: usize,
    /// Visible text length in bytes.
    pub text_length: usize,
    /// Raw markup length in bytes.
    pub markup_length: usize,
}

impl PageSnapshot {
    /// Capture a snapshot from a live document view.
    pub fn capture(view: &dyn PageView) -> Self {
        Self {
            title: view.title().to_string(),
            description: view.description().to_string(),
            heading_count: view.heading_texts().len(),
            image_count: view.image_count(),
            link_count: view.link_count(),
            text_length: view.body_text().len(),
            markup_length: view.markup_length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::StaticPage;

    #[test]
    fn test_capture_from_static_page() {
        let page = StaticPage {
            title: "Docs".into(),
            description: "API reference".into(),
            headings: vec!["Intro".into(), "Usage".into(), "FAQ".into()],
            body: "abcdef".into(),
            markup_length: 2048,
            image_count: 1,
            link_count: 12,
        };

        let snapshot = PageSnapshot::capture(&page);
        assert_eq!(snapshot.title, "Docs");
        assert_eq!(snapshot.heading_count, 3);
        assert_eq!(snapshot.text_length, 6);
        assert_eq!(snapshot.markup_length, 2048);
        assert_eq!(snapshot.link_count, 12);
    }
}
