//! Dense contingency matrix between two label sequences.
//!
//! Rows index ground-truth classes and columns index predicted clusters, both
//! through a [`LabelEncoder`]. The matrix lives for a single evaluation.

use tracing::{debug, instrument};

use crate::{
    assignment::WeightMatrix,
    error::{EvaluationError, Result, validate_label_lengths},
    labels::LabelEncoder,
};

/// Cross-tabulation of ground-truth labels against predicted labels.
///
/// # Examples
/// ```
/// use hamachi_core::ContingencyMatrix;
///
/// let matrix = ContingencyMatrix::from_labels(&[0, 0, 1, 1], &[5, 5, 5, 8])?;
/// assert_eq!((matrix.rows(), matrix.cols()), (2, 2));
/// assert_eq!(matrix.count(0, 0), Some(2));
/// assert_eq!(matrix.count(1, 1), Some(1));
/// assert_eq!(matrix.total(), 4);
/// # Ok::<(), hamachi_core::EvaluationError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContingencyMatrix<T, P> {
    truth: LabelEncoder<T>,
    predicted: LabelEncoder<P>,
    counts: Vec<usize>,
    total: usize,
}

impl<T: Ord + Clone, P: Ord + Clone> ContingencyMatrix<T, P> {
    /// Counts co-occurrences of ground-truth and predicted labels.
    ///
    /// # Errors
    /// Returns [`EvaluationError::LabelLengthMismatch`] when the sequences have
    /// different lengths and [`EvaluationError::EmptyLabels`] when they are
    /// empty.
    #[instrument(
        name = "core.contingency",
        level = "debug",
        err,
        skip_all,
        fields(samples = ground_truth.len()),
    )]
    pub fn from_labels(ground_truth: &[T], predicted: &[P]) -> Result<Self> {
        let total = validate_label_lengths(ground_truth.len(), predicted.len())?;
        let truth = LabelEncoder::fit(ground_truth);
        let clusters = LabelEncoder::fit(predicted);
        let rows = truth.encode(ground_truth)?;
        let cols = clusters.encode(predicted)?;

        let width = clusters.len();
        let mut counts = vec![0_usize; truth.len() * width];
        for (&row, &col) in rows.iter().zip(&cols) {
            let cell = counts
                .get_mut(row * width + col)
                .ok_or(EvaluationError::InvariantViolation {
                    context: "incrementing a contingency cell",
                })?;
            *cell += 1;
        }

        debug!(
            classes = truth.len(),
            clusters = width,
            "contingency matrix built"
        );
        Ok(Self {
            truth,
            predicted: clusters,
            counts,
            total,
        })
    }

    /// Number of distinct ground-truth classes.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.truth.len()
    }

    /// Number of distinct predicted clusters.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.predicted.len()
    }

    /// Number of samples with true class `row` and predicted cluster `col`.
    #[must_use]
    pub fn count(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        self.counts.get(row * self.cols() + col).copied()
    }

    /// Number of samples tabulated.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Encoder for the ground-truth labels (row indices).
    #[must_use]
    pub fn truth_encoder(&self) -> &LabelEncoder<T> {
        &self.truth
    }

    /// Encoder for the predicted labels (column indices).
    #[must_use]
    pub fn predicted_encoder(&self) -> &LabelEncoder<P> {
        &self.predicted
    }

    /// Converts the counts into an assignment weight matrix.
    ///
    /// # Errors
    /// Returns [`EvaluationError::InvariantViolation`] if a count does not fit
    /// in an `i64`.
    pub fn to_weight_matrix(&self) -> Result<WeightMatrix> {
        let weights = self
            .counts
            .iter()
            .map(|&count| {
                i64::try_from(count).map_err(|_| EvaluationError::InvariantViolation {
                    context: "converting a contingency count to a weight",
                })
            })
            .collect::<Result<Vec<_>>>()?;
        WeightMatrix::new(self.rows(), self.cols(), weights)
    }
}
