//! Change-significance scoring between page snapshots.

use pagelens_core::PageSnapshot;

/// Number of weighted components in the score; each contributes in [0, 1].
const COMPONENTS: f64 = 8.0;

/// Normalized change magnitude in [0, 1] between two snapshots.
///
/// Title and description changes contribute 1 each when different; heading,
/// image, and link counts plus text and markup lengths each contribute
/// `min(|old - new| / max(old, 1), 1)`. The total is divided by the 8
/// component denominators.
pub fn significance(old: &PageSnapshot, new: &PageSnapshot) -> f64 {
    let mut total = 0.0;

    if old.title != new.title {
        total += 1.0;
    }
    if old.description != new.description {
        total += 1.0;
    }

    total += shift_ratio(old.heading_count, new.heading_count);
    total += shift_ratio(old.image_count, new.image_count);
    total += shift_ratio(old.link_count, new.link_count);
    total += shift_ratio(old.text_length, new.text_length);
    total += shift_ratio(old.markup_length, new.markup_length);

    total / COMPONENTS
}

fn shift_ratio(old: usize, new: usize) -> f64 {
    (old.abs_diff(new) as f64 / old.max(1) as f64).min(1.0)
}
