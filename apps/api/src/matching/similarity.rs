//! Skill-set similarity.
//!
//! Two skill sets are "similar enough" when their Jaccard index
//! (|A ∩ B| / |A ∪ B|) reaches the threshold. The threshold is derived from a
//! laxity percentage: `threshold = 1 - round(p / 100, 2)`, so a larger laxity
//! accepts a smaller overlap.

use std::collections::HashSet;
use std::hash::Hash;

use crate::errors::AppError;

/// Caller-supplied tolerance, 0–100 percent. Widens the salary band and lowers
/// the required skill overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laxity {
    percent: f64,
}

impl Laxity {
    pub fn from_percent(percent: f64) -> Result<Self, AppError> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(AppError::Validation(format!(
                "laxity must be between 0 and 100, got {percent}"
            )));
        }
        Ok(Self { percent })
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// `round(p / 100, 2)`.
    pub fn fraction(&self) -> f64 {
        (self.percent / 100.0 * 100.0).round() / 100.0
    }

    /// Minimum Jaccard index a candidate must reach.
    pub fn threshold(&self) -> f64 {
        1.0 - self.fraction()
    }
}

/// Jaccard index of two sets. `None` when both sets are empty.
pub fn jaccard_index<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> Option<f64> {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return None;
    }
    Some(intersection as f64 / union as f64)
}

/// True when the Jaccard index of `a` and `b` is at least `threshold`.
/// An empty union never matches, whatever the threshold.
pub fn calculate_similarity<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>, threshold: f64) -> bool {
    match jaccard_index(a, b) {
        Some(index) => index >= threshold,
        None => false,
    }
}
