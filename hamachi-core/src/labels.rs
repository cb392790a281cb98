//! Label canonicalisation.
//!
//! Arbitrary categorical labels are mapped to dense indices `0..k` before any
//! contingency counting. The mapping orders labels by their natural `Ord`
//! ordering so the same label set always produces the same indices.

use crate::error::{EvaluationError, Result};

/// Sorted set of distinct labels with dense index lookup.
///
/// # Examples
/// ```
/// use hamachi_core::LabelEncoder;
///
/// let encoder = LabelEncoder::fit(&[7_u32, 3, 7, 9]);
/// assert_eq!(encoder.len(), 3);
/// assert_eq!(encoder.index_of(&7), Some(1));
/// assert_eq!(encoder.label(2), Some(&9));
/// assert_eq!(encoder.encode(&[9, 3])?, vec![2, 0]);
/// # Ok::<(), hamachi_core::EvaluationError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelEncoder<L> {
    classes: Vec<L>,
}

impl<L: Ord + Clone> LabelEncoder<L> {
    /// Collects the distinct labels of `labels` in ascending order.
    #[must_use]
    pub fn fit(labels: &[L]) -> Self {
        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        Self { classes }
    }

    /// Returns the dense index assigned to `label`, if it was seen while fitting.
    #[must_use]
    pub fn index_of(&self, label: &L) -> Option<usize> {
        self.classes.binary_search(label).ok()
    }

    /// Returns the label stored at dense index `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<&L> {
        self.classes.get(index)
    }

    /// Distinct labels in index order.
    #[must_use]
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` when the encoder was fitted on an empty sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Maps every label of `labels` to its dense index.
    ///
    /// # Errors
    /// Returns [`EvaluationError::UnknownLabel`] for the first label that was
    /// not part of the fitted set.
    pub fn encode(&self, labels: &[L]) -> Result<Vec<usize>> {
        labels
            .iter()
            .enumerate()
            .map(|(position, label)| {
                self.index_of(label)
                    .ok_or(EvaluationError::UnknownLabel { position })
            })
            .collect()
    }
}
