//! Dataset partitioning by class label.
//!
//! Training loops that sample per class need the dataset regrouped so every
//! class occupies its own bucket. Samples keep their original relative order
//! inside each bucket.

use tracing::{debug, instrument};

use crate::error::DatasetError;

/// Samples grouped by class, with a parallel bucket of repeated labels.
///
/// # Examples
/// ```
/// use hamachi_core::ClassGroups;
///
/// let groups = ClassGroups::from_labelled(vec!["a", "b", "c"], &[1, 0, 1], 2)?;
/// assert_eq!(groups.class(0), Some(&["b"][..]));
/// assert_eq!(groups.labels(1), Some(&[1, 1][..]));
/// # Ok::<(), hamachi_core::DatasetError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassGroups<T> {
    samples: Vec<Vec<T>>,
    labels: Vec<Vec<usize>>,
}

/// Samples and labels concatenated in class order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackedDataset<T> {
    /// Samples of class 0 first, then class 1, and so on.
    pub data: Vec<T>,
    /// Label of each entry of `data`.
    pub labels: Vec<usize>,
}

/// Output of [`sort_dataset`], grouped or stacked on request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortedDataset<T> {
    /// One bucket per class.
    Grouped(ClassGroups<T>),
    /// Flat sequences in class order.
    Stacked(StackedDataset<T>),
}

impl<T> ClassGroups<T> {
    /// Groups `data` by `labels` into `num_classes` buckets.
    ///
    /// Every class must receive at least one sample.
    ///
    /// # Errors
    /// Returns [`DatasetError::LengthMismatch`], [`DatasetError::LabelOutOfRange`],
    /// or [`DatasetError::EmptyClass`] when the inputs cannot be grouped.
    pub fn from_labelled(
        data: Vec<T>,
        labels: &[usize],
        num_classes: usize,
    ) -> Result<Self, DatasetError> {
        let samples = dataset_per_class(data, labels, num_classes)?;
        if let Some(class) = samples.iter().position(Vec::is_empty) {
            return Err(DatasetError::EmptyClass { class });
        }
        let labels = samples
            .iter()
            .enumerate()
            .map(|(class, bucket)| vec![class; bucket.len()])
            .collect();
        Ok(Self { samples, labels })
    }

    /// Number of classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.samples.len()
    }

    /// Samples belonging to `class`.
    #[must_use]
    pub fn class(&self, class: usize) -> Option<&[T]> {
        self.samples.get(class).map(Vec::as_slice)
    }

    /// Labels of the samples belonging to `class` (all equal to `class`).
    #[must_use]
    pub fn labels(&self, class: usize) -> Option<&[usize]> {
        self.labels.get(class).map(Vec::as_slice)
    }

    /// Splits the groups into per-class samples and per-class labels.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Vec<T>>, Vec<Vec<usize>>) {
        (self.samples, self.labels)
    }

    /// Concatenates all buckets in class order.
    #[must_use]
    pub fn stack(self) -> StackedDataset<T> {
        StackedDataset {
            data: self.samples.into_iter().flatten().collect(),
            labels: self.labels.into_iter().flatten().collect(),
        }
    }
}

/// Groups samples into `num_classes` buckets without label buckets.
///
/// Classes that receive no samples yield empty buckets.
///
/// # Errors
/// Returns [`DatasetError::LengthMismatch`] when `data` and `labels` differ in
/// length and [`DatasetError::LabelOutOfRange`] for labels `>= num_classes`.
///
/// # Examples
/// ```
/// use hamachi_core::dataset_per_class;
///
/// let buckets = dataset_per_class(vec![10, 11, 12], &[2, 0, 2], 3)?;
/// assert_eq!(buckets, vec![vec![11], vec![], vec![10, 12]]);
/// # Ok::<(), hamachi_core::DatasetError>(())
/// ```
pub fn dataset_per_class<T>(
    data: Vec<T>,
    labels: &[usize],
    num_classes: usize,
) -> Result<Vec<Vec<T>>, DatasetError> {
    if data.len() != labels.len() {
        return Err(DatasetError::LengthMismatch {
            samples: data.len(),
            labels: labels.len(),
        });
    }

    let mut buckets: Vec<Vec<T>> = (0..num_classes).map(|_| Vec::new()).collect();
    for (position, (sample, &label)) in data.into_iter().zip(labels).enumerate() {
        let bucket = buckets
            .get_mut(label)
            .ok_or(DatasetError::LabelOutOfRange {
                position,
                label,
                num_classes,
            })?;
        bucket.push(sample);
    }
    Ok(buckets)
}

/// Regroups a labelled dataset by class.
///
/// With `stack` unset the result holds one bucket of samples and one bucket of
/// repeated labels per class; with `stack` set both are concatenated in class
/// order.
///
/// # Errors
/// Returns [`DatasetError`] when lengths differ, a label is outside
/// `0..num_classes`, or a class has no samples.
///
/// # Examples
/// ```
/// use hamachi_core::{SortedDataset, sort_dataset};
///
/// let sorted = sort_dataset(vec!['p', 'q', 'r', 's'], &[1, 0, 1, 0], 2, true)?;
/// let SortedDataset::Stacked(stacked) = sorted else {
///     panic!("stacking was requested");
/// };
/// assert_eq!(stacked.data, vec!['q', 's', 'p', 'r']);
/// assert_eq!(stacked.labels, vec![0, 0, 1, 1]);
/// # Ok::<(), hamachi_core::DatasetError>(())
/// ```
#[instrument(
    name = "core.sort_dataset",
    level = "debug",
    err,
    skip(data, labels),
    fields(samples = labels.len()),
)]
pub fn sort_dataset<T>(
    data: Vec<T>,
    labels: &[usize],
    num_classes: usize,
    stack: bool,
) -> Result<SortedDataset<T>, DatasetError> {
    let groups = ClassGroups::from_labelled(data, labels, num_classes)?;
    debug!(classes = groups.num_classes(), "dataset grouped by class");
    if stack {
        Ok(SortedDataset::Stacked(groups.stack()))
    } else {
        Ok(SortedDataset::Grouped(groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::{fixture, rstest};

    #[fixture]
    fn labelled() -> (Vec<&'static str>, Vec<usize>) {
        (
            vec!["s0", "s1", "s2", "s3", "s4", "s5"],
            vec![2, 0, 1, 2, 0, 1],
        )
    }

    #[rstest]
    fn grouped_output_preserves_order_within_class(labelled: (Vec<&'static str>, Vec<usize>)) {
        let (data, labels) = labelled;
        let sorted = sort_dataset(data, &labels, 3, false).expect("labels are in range");
        let SortedDataset::Grouped(groups) = sorted else {
            panic!("grouped output expected");
        };
        assert_eq!(groups.num_classes(), 3);
        assert_eq!(groups.class(0), Some(&["s1", "s4"][..]));
        assert_eq!(groups.class(1), Some(&["s2", "s5"][..]));
        assert_eq!(groups.class(2), Some(&["s0", "s3"][..]));
        assert_eq!(groups.labels(2), Some(&[2, 2][..]));
    }

    #[rstest]
    fn stacked_output_is_class_ordered(labelled: (Vec<&'static str>, Vec<usize>)) {
        let (data, labels) = labelled;
        let sorted = sort_dataset(data, &labels, 3, true).expect("labels are in range");
        assert_eq!(
            sorted,
            SortedDataset::Stacked(StackedDataset {
                data: vec!["s1", "s4", "s2", "s5", "s0", "s3"],
                labels: vec![0, 0, 1, 1, 2, 2],
            })
        );
    }

    #[rstest]
    #[case::length_mismatch(vec![0, 1], 2, DatasetError::LengthMismatch { samples: 3, labels: 2 })]
    #[case::out_of_range(vec![0, 1, 4], 2, DatasetError::LabelOutOfRange { position: 2, label: 4, num_classes: 2 })]
    #[case::empty_class(vec![0, 0, 2], 3, DatasetError::EmptyClass { class: 1 })]
    fn sort_dataset_rejects_invalid_inputs(
        #[case] labels: Vec<usize>,
        #[case] num_classes: usize,
        #[case] expected: DatasetError,
    ) {
        let err = sort_dataset(vec!['a', 'b', 'c'], &labels, num_classes, false)
            .expect_err("inputs are invalid");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn dataset_per_class_allows_empty_buckets() {
        let buckets = dataset_per_class(vec![1.5_f32, 2.5], &[3, 3], 4).expect("labels in range");
        assert_eq!(buckets.len(), 4);
        assert!(buckets.iter().take(3).all(Vec::is_empty));
        assert_eq!(buckets.get(3), Some(&vec![1.5, 2.5]));
    }
}
