//! Page analysis artifact.
//!
//! The cache treats artifacts as opaque, but hosts need a concrete payload
//! to store; this is the shape produced by the rule-based analyzer. The
//! keyword-density table dominates the artifact's serialized size, so
//! compaction trims it when cache compression is enabled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keyword densities at or above this fraction survive compaction.
pub const DENSITY_FLOOR: f64 = 0.01;

/// Maximum keyword-density entries retained by compaction.
pub const DENSITY_CAP: usize = 20;

/// Result of analyzing one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    /// Overall score in [0, 100], produced by the external rule scorer.
    pub score: f64,
    pub word_count: usize,
    /// Keyword -> density (fraction of total words).
    pub keyword_density: BTreeMap<String, f64>,
    /// Human-readable findings.
    pub issues: Vec<String>,
}

impl PageAnalysis {
    /// Drop low-signal keyword-density entries to shrink the stored payload.
    ///
    /// Retains only densities at or above [`DENSITY_FLOOR`], capped at the
    /// [`DENSITY_CAP`] highest. Lossy and one-directional: a compacted
    /// artifact cannot be restored to its original fullness.
    pub fn compact(&mut self) {
        self.keyword_density.retain(|_, density| *density >= DENSITY_FLOOR);
        if self.keyword_density.len() <= DENSITY_CAP {
            return;
        }

        let mut ranked: Vec<(String, f64)> = std::mem::take(&mut self.keyword_density).into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(DENSITY_CAP);
        self.keyword_density = ranked.into_iter().collect();
    }
}
