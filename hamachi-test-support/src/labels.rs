//! Proptest strategies producing label sequences.

use proptest::prelude::*;
use proptest::sample::subsequence;

/// Non-empty label sequence of at most `max_len` samples drawn from
/// `0..max_label`.
pub fn label_sequence(max_len: usize, max_label: u32) -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(0..max_label.max(1), 1..=max_len.max(1))
}

/// Pair of equally long label sequences: ground truth and prediction.
pub fn label_pair(max_len: usize, max_label: u32) -> impl Strategy<Value = (Vec<u32>, Vec<u32>)> {
    label_sequence(max_len, max_label).prop_flat_map(move |truth| {
        let len = truth.len();
        (
            Just(truth),
            proptest::collection::vec(0..max_label.max(1), len),
        )
    })
}

/// A bijection over `0..max_label`, given as the image of each label.
pub fn label_permutation(max_label: u32) -> impl Strategy<Value = Vec<u32>> {
    let labels: Vec<u32> = (0..max_label.max(1)).collect();
    let len = labels.len();
    subsequence(labels, len).prop_shuffle()
}

/// Applies `permutation` to every label of `labels`.
///
/// Labels outside the permutation's domain are left unchanged.
#[must_use]
pub fn permute(labels: &[u32], permutation: &[u32]) -> Vec<u32> {
    labels
        .iter()
        .map(|&label| {
            usize::try_from(label)
                .ok()
                .and_then(|index| permutation.get(index))
                .copied()
                .unwrap_or(label)
        })
        .collect()
}
