//! Hamachi core library.
//!
//! Evaluation metrics and dataset helpers for experiment pipelines:
//!
//! - [`clustering_accuracy`] scores a clustering against ground truth under the
//!   optimal one-to-one relabelling of clusters to classes;
//! - [`compute_accuracy`] scores predictions position by position;
//! - [`sort_dataset`] regroups a labelled dataset by class.
//!
//! Every function is a pure computation over its inputs.

mod accuracy;
mod assignment;
mod clustering_accuracy;
mod contingency;
mod dataset;
mod error;
mod labels;

pub use crate::{
    accuracy::{LabelCount, compute_accuracy, label_agreement},
    assignment::{Assignment, WeightMatrix},
    clustering_accuracy::{ClusterAlignment, clustering_accuracy, clustering_assignment},
    contingency::ContingencyMatrix,
    dataset::{ClassGroups, SortedDataset, StackedDataset, dataset_per_class, sort_dataset},
    error::{DatasetError, DatasetErrorCode, EvaluationError, EvaluationErrorCode, Result},
    labels::LabelEncoder,
};
