//! Canonical content fingerprinting for cache invalidation.
//!
//! The fingerprint digests the parts of a document that matter for analysis
//! results: title, description, heading text, and a truncated body sample.
//! A cached artifact is stale exactly when the live document's fingerprint
//! no longer matches the one recorded at insertion time.

use crate::page::PageView;
use sha2::{Digest, Sha256};

/// Only the leading portion of the body contributes to the fingerprint;
/// edits past this point rarely change an analysis outcome and hashing
/// whole documents on every lookup would be wasteful.
const BODY_SAMPLE_BYTES: usize = 5000;

/// Compute the canonical content fingerprint of a live document.
///
/// Returns a lowercase hex sha-256 digest. The same document content always
/// produces the same fingerprint, independent of how the `PageView` is
/// implemented.
pub fn content_fingerprint(view: &dyn PageView) -> String {
    let mut hasher = Sha256::new();
    hasher.update(view.title().as_bytes());
    hasher.update(b"\n");
    hasher.update(view.description().as_bytes());
    hasher.update(b"\n");
    for heading in view.heading_texts() {
        hasher.update(heading.as_bytes());
        hasher.update(b"\x1f");
    }
    hasher.update(b"\n");
    hasher.update(body_sample(view.body_text()).as_bytes());
    hex::encode(hasher.finalize())
}

/// Truncate the body to `BODY_SAMPLE_BYTES`, respecting char boundaries.
fn body_sample(body: &str) -> &str {
    if body.len() <= BODY_SAMPLE_BYTES {
        return body;
    }
    let mut end = BODY_SAMPLE_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
