//! Plain label accuracy.

use std::fmt;

use tracing::instrument;

use crate::error::{Result, validate_label_lengths};

/// Matched-sample count paired with the total number of samples.
///
/// # Examples
/// ```
/// use hamachi_core::LabelCount;
///
/// let count = LabelCount::new(3, 4);
/// assert_eq!(count.to_string(), "3/4");
/// assert_eq!(count.ratio(), 0.75);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LabelCount {
    matched: usize,
    total: usize,
}

impl LabelCount {
    /// Creates a count of `matched` samples out of `total`.
    #[must_use]
    pub const fn new(matched: usize, total: usize) -> Self {
        Self { matched, total }
    }

    /// Number of samples counted as correct.
    #[must_use]
    pub const fn matched(&self) -> usize {
        self.matched
    }

    /// Number of samples evaluated.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Fraction of matched samples, `0.0` when `total` is zero.
    #[expect(
        clippy::cast_precision_loss,
        clippy::float_arithmetic,
        reason = "accuracy ratios require floating-point division."
    )]
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.matched as f64 / self.total as f64
    }
}

impl fmt::Display for LabelCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.matched, self.total)
    }
}

/// Counts the positions at which `y_pred` equals `y_true`.
///
/// # Errors
/// Returns [`crate::EvaluationError::LabelLengthMismatch`] when the sequences
/// differ in length and [`crate::EvaluationError::EmptyLabels`] when they are
/// empty.
#[instrument(name = "core.label_agreement", level = "debug", err, skip_all)]
pub fn label_agreement<L: PartialEq>(y_pred: &[L], y_true: &[L]) -> Result<LabelCount> {
    let total = validate_label_lengths(y_true.len(), y_pred.len())?;
    let matched = y_pred
        .iter()
        .zip(y_true)
        .filter(|(predicted, truth)| predicted == truth)
        .count();
    Ok(LabelCount::new(matched, total))
}

/// Fraction of positions at which the prediction equals the ground truth.
///
/// This is `1 - mismatches / N`, with no relabelling of the predictions.
///
/// # Errors
/// Returns [`crate::EvaluationError::LabelLengthMismatch`] when the sequences
/// differ in length and [`crate::EvaluationError::EmptyLabels`] when they are
/// empty.
///
/// # Examples
/// ```
/// use hamachi_core::compute_accuracy;
///
/// assert_eq!(compute_accuracy(&[1, 2, 3, 0], &[1, 2, 0, 0])?, 0.75);
/// # Ok::<(), hamachi_core::EvaluationError>(())
/// ```
pub fn compute_accuracy<L: PartialEq>(y_pred: &[L], y_true: &[L]) -> Result<f64> {
    label_agreement(y_pred, y_true).map(|count| count.ratio())
}
