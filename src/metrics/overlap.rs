//! Set and multiset comparison of extracted values.

use std::{cmp::Ordering, collections::BTreeSet};

use super::scores::{ListComparison, MetricRecord};

/// Multiset intersection of `a` and `b`.
///
/// Both sides are sorted and merged with two pointers, emitting one element
/// per matched pair: a value present twice in `a` and three times in `b`
/// appears twice in the result.
#[must_use]
pub fn overlapping_lists<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut left: Vec<&T> = a.iter().collect();
    let mut right: Vec<&T> = b.iter().collect();
    left.sort_unstable();
    right.sort_unstable();

    let mut overlap = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(right[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                overlap.push(left[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    overlap
}

/// Counts every occurrence: the candidate/reference sizes are list lengths.
#[must_use]
pub fn compare_multiset<T: Ord + Clone>(candidate: &[T], reference: &[T]) -> MetricRecord {
    let tp = overlapping_lists(candidate, reference).len();
    MetricRecord::from_counts(candidate.len(), reference.len(), tp)
}

/// Collapses duplicates before comparing.
#[must_use]
pub fn compare_sets<T: Ord>(candidate: &BTreeSet<T>, reference: &BTreeSet<T>) -> MetricRecord {
    let tp = candidate.intersection(reference).count();
    MetricRecord::from_counts(candidate.len(), reference.len(), tp)
}

/// Multiset comparison that keeps both sorted lists.
#[must_use]
pub fn multiset_comparison(mut candidate: Vec<String>, mut reference: Vec<String>) -> ListComparison {
    let record = compare_multiset(&candidate, &reference);
    candidate.sort_unstable();
    reference.sort_unstable();
    ListComparison {
        record,
        candidate,
        reference,
    }
}

/// Set comparison that keeps both distinct value lists.
#[must_use]
pub fn set_comparison(candidate: BTreeSet<String>, reference: BTreeSet<String>) -> ListComparison {
    ListComparison {
        record: compare_sets(&candidate, &reference),
        candidate: candidate.into_iter().collect(),
        reference: reference.into_iter().collect(),
    }
}
