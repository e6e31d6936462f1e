//! Precision, recall and F1 over confusion counts.

use serde::{Deserialize, Serialize};

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn precision(tp: usize, fp: usize) -> f64 {
    if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn recall(tp: usize, fn_: usize) -> f64 {
    if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    }
}

/// Harmonic mean of precision and recall, `0.0` when both are zero.
#[must_use]
pub fn f1(tp: usize, fp: usize, fn_: usize) -> f64 {
    harmonic_mean(precision(tp, fp), recall(tp, fn_))
}

#[must_use]
pub fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Aggregates confusion counts into a [`MetricRecord`].
#[must_use]
pub fn calculate_metrics(tp: usize, fp: usize, fn_: usize, tn: usize) -> MetricRecord {
    MetricRecord {
        tp,
        fp,
        fn_,
        tn,
        precision: precision(tp, fp),
        recall: recall(tp, fn_),
        f1: f1(tp, fp, fn_),
    }
}

/// Uniform comparison outcome.
///
/// For set and multiset comparisons `tp + fp` is the candidate size and
/// `tp + fn` the reference size. `tn` stays `0`: open-world triple comparison
/// has no true negatives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tn: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl MetricRecord {
    /// Derives `fp` and `fn` from the compared sizes.
    #[must_use]
    pub fn from_counts(candidate: usize, reference: usize, tp: usize) -> Self {
        calculate_metrics(
            tp,
            candidate.saturating_sub(tp),
            reference.saturating_sub(tp),
            0,
        )
    }

    /// `true` when precision, recall and F1 are all `1.0`.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.fp == 0 && self.fn_ == 0 && self.tp > 0
    }
}

/// A [`MetricRecord`] together with the values that were compared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListComparison {
    #[serde(flatten)]
    pub record: MetricRecord,
    pub candidate: Vec<String>,
    pub reference: Vec<String>,
}
