//! Clustering accuracy under optimal relabelling.
//!
//! Predicted cluster ids carry no meaning of their own, so predictions are
//! scored against the ground truth after the one-to-one relabelling of
//! clusters to classes that agrees with the most samples. The relabelling is
//! the maximum-weight matching of the contingency matrix.

use tracing::{Span, debug, field, instrument};

use crate::{
    accuracy::LabelCount,
    assignment::Assignment,
    contingency::ContingencyMatrix,
    error::{EvaluationError, Result},
};

/// Optimal mapping of predicted clusters onto ground-truth classes.
///
/// # Examples
/// ```
/// use hamachi_core::clustering_assignment;
///
/// let alignment = clustering_assignment(&[0, 0, 1, 1, 1], &['x', 'x', 'y', 'y', 'x'])?;
/// assert_eq!(alignment.class_for(&'x'), Some(&0));
/// assert_eq!(alignment.class_for(&'y'), Some(&1));
/// assert_eq!(alignment.count().matched(), 4);
/// assert_eq!(alignment.accuracy(), 0.8);
/// # Ok::<(), hamachi_core::EvaluationError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterAlignment<T, P> {
    mapping: Vec<(P, T)>,
    count: LabelCount,
}

impl<T, P: Ord> ClusterAlignment<T, P> {
    /// Matched `(predicted, true)` label pairs ordered by predicted label.
    #[must_use]
    pub fn mapping(&self) -> &[(P, T)] {
        &self.mapping
    }

    /// Samples agreeing with the ground truth after relabelling.
    #[must_use]
    pub const fn count(&self) -> LabelCount {
        self.count
    }

    /// Fraction of samples agreeing with the ground truth after relabelling.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.count.ratio()
    }

    /// Ground-truth class assigned to predicted cluster `cluster`.
    ///
    /// Returns `None` for clusters left unmatched because there were more
    /// clusters than classes, and for clusters never seen.
    #[must_use]
    pub fn class_for(&self, cluster: &P) -> Option<&T> {
        self.mapping
            .binary_search_by(|(predicted, _)| predicted.cmp(cluster))
            .ok()
            .and_then(|index| self.mapping.get(index))
            .map(|(_, class)| class)
    }

    /// Translates predicted clusters into their assigned ground-truth classes.
    #[must_use]
    pub fn relabel(&self, predicted: &[P]) -> Vec<Option<T>>
    where
        T: Clone,
    {
        predicted
            .iter()
            .map(|cluster| self.class_for(cluster).cloned())
            .collect()
    }
}

/// Computes the optimal cluster-to-class alignment for two labellings.
///
/// # Errors
/// Returns [`EvaluationError::LabelLengthMismatch`] when the sequences differ
/// in length and [`EvaluationError::EmptyLabels`] when they are empty.
#[instrument(
    name = "core.clustering_assignment",
    level = "debug",
    err,
    skip_all,
    fields(samples = labels_true.len(), classes = field::Empty, clusters = field::Empty),
)]
pub fn clustering_assignment<T, P>(
    labels_true: &[T],
    labels_pred: &[P],
) -> Result<ClusterAlignment<T, P>>
where
    T: Ord + Clone,
    P: Ord + Clone,
{
    let contingency = ContingencyMatrix::from_labels(labels_true, labels_pred)?;
    let span = Span::current();
    span.record("classes", contingency.rows());
    span.record("clusters", contingency.cols());

    let best = Assignment::maximise(&contingency.to_weight_matrix()?);
    let matched = usize::try_from(best.total()).map_err(|_| {
        EvaluationError::InvariantViolation {
            context: "converting the matched weight to a sample count",
        }
    })?;

    let mut mapping = Vec::with_capacity(best.len());
    for &(row, col) in best.pairs() {
        let class = contingency.truth_encoder().label(row).ok_or(
            EvaluationError::InvariantViolation {
                context: "resolving a matched ground-truth class",
            },
        )?;
        let cluster = contingency.predicted_encoder().label(col).ok_or(
            EvaluationError::InvariantViolation {
                context: "resolving a matched predicted cluster",
            },
        )?;
        mapping.push((cluster.clone(), class.clone()));
    }
    mapping.sort_by(|(left, _), (right, _)| left.cmp(right));

    let count = LabelCount::new(matched, contingency.total());
    debug!(matched, total = count.total(), "clusters aligned");
    Ok(ClusterAlignment { mapping, count })
}

/// Computes clustering accuracy: the best achievable agreement between the
/// predicted clustering and the ground truth under one-to-one relabelling.
///
/// The result lies in `[0.0, 1.0]`. Label values are categorical, so any
/// permutation of the predicted cluster ids yields the same score.
///
/// # Errors
/// Returns [`EvaluationError::LabelLengthMismatch`] when label vectors have
/// different lengths and [`EvaluationError::EmptyLabels`] when they are empty.
///
/// # Examples
/// ```
/// use hamachi_core::clustering_accuracy;
///
/// assert_eq!(clustering_accuracy(&[0, 0, 1, 1], &[1, 1, 0, 0])?, 1.0);
/// assert_eq!(clustering_accuracy(&[0, 0, 1, 1], &[0, 1, 0, 1])?, 0.5);
/// # Ok::<(), hamachi_core::EvaluationError>(())
/// ```
pub fn clustering_accuracy<T, P>(labels_true: &[T], labels_pred: &[P]) -> Result<f64>
where
    T: Ord + Clone,
    P: Ord + Clone,
{
    clustering_assignment(labels_true, labels_pred).map(|alignment| alignment.accuracy())
}
