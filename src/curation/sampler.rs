//! CurationSampler: probabilistic bulk selection
//!
//! Each entry is kept with probability `p`, one independent draw per entry.
//! The result is not a fixed-size sample. `p = 0` and `p = 1` are exact.

use super::entropy::{Entropy, SystemEntropy};
use super::selection::{SelectionError, SelectionStore};

pub struct CurationSampler {
    entropy: Box<dyn Entropy>,
}

impl Default for CurationSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl CurationSampler {
    pub fn new() -> Self {
        Self::with_entropy(Box::new(SystemEntropy::new()))
    }

    pub fn with_entropy(entropy: Box<dyn Entropy>) -> Self {
        Self { entropy }
    }

    pub fn entropy_degraded(&self) -> bool {
        self.entropy.is_degraded()
    }

    /// Include each entry with probability `p`; returns the included count.
    ///
    /// Rejects `p` outside `[0, 1]` (including NaN) before touching the store.
    pub fn sample_with_probability(
        &mut self,
        store: &mut SelectionStore,
        p: f64,
    ) -> Result<usize, SelectionError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(SelectionError::InvalidProbability(p));
        }

        if p == 0.0 {
            store.set_all_included(false);
        } else if p == 1.0 {
            store.set_all_included(true);
        } else {
            let entropy = &mut self.entropy;
            store.update_each(|_| entropy.next_f64() < p);
        }

        Ok(store.included_count())
    }
}

/// Two-decimal label shown next to the sampling slider
pub fn probability_label(p: f64) -> String {
    format!("{:.2}", p)
}
