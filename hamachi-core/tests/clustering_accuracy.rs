//! Behavioural tests for clustering accuracy.
//!
//! Covers relabelling invariance, bounds, agreement with plain accuracy, and
//! the diagnostics emitted while aligning clusters.

use hamachi_core::{
    EvaluationError, clustering_accuracy, clustering_assignment, compute_accuracy,
};
use hamachi_test_support::{
    ci::suite_proptest_config,
    labels::{label_pair, label_permutation, label_sequence, permute},
    tracing::RecordingLayer,
};
use proptest::prelude::*;
use rstest::rstest;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

const MAX_LABEL: u32 = 6;

proptest! {
    #![proptest_config(suite_proptest_config(128))]

    #[test]
    fn accuracy_is_invariant_under_cluster_relabelling(
        (truth, predicted) in label_pair(40, MAX_LABEL),
        permutation in label_permutation(MAX_LABEL),
    ) {
        let baseline = clustering_accuracy(&truth, &predicted)?;
        let relabelled = clustering_accuracy(&truth, &permute(&predicted, &permutation))?;
        prop_assert_eq!(baseline, relabelled);
    }

    #[test]
    fn labelling_agrees_perfectly_with_itself(labels in label_sequence(40, MAX_LABEL)) {
        prop_assert_eq!(clustering_accuracy(&labels, &labels)?, 1.0);
    }

    #[test]
    fn accuracy_is_bounded_and_dominates_plain_accuracy(
        (truth, predicted) in label_pair(40, MAX_LABEL),
    ) {
        let relabelled = clustering_accuracy(&truth, &predicted)?;
        let plain = compute_accuracy(&predicted, &truth)?;
        prop_assert!((0.0..=1.0).contains(&relabelled));
        prop_assert!(relabelled >= plain);
    }

    #[test]
    fn relabelled_predictions_reach_reported_accuracy(
        (truth, predicted) in label_pair(40, MAX_LABEL),
    ) {
        let alignment = clustering_assignment(&truth, &predicted)?;
        let relabelled = alignment.relabel(&predicted);
        let agreeing = relabelled
            .iter()
            .zip(&truth)
            .filter(|(class, expected)| class.as_ref() == Some(*expected))
            .count();
        prop_assert_eq!(agreeing, alignment.count().matched());
    }
}

#[rstest]
#[case::perfect_up_to_relabelling(&[0, 0, 1, 1], &[1, 1, 0, 0], 1.0)]
#[case::best_matching_is_half(&[0, 0, 1, 1], &[0, 1, 0, 1], 0.5)]
fn documented_examples(#[case] truth: &[u8], #[case] predicted: &[u8], #[case] expected: f64) {
    let accuracy = clustering_accuracy(truth, predicted).expect("labels are valid");
    assert_eq!(accuracy, expected);
}

#[rstest]
fn mismatched_lengths_are_rejected() {
    let err = clustering_accuracy(&[0, 1, 2], &[0, 1, 2, 3]).expect_err("lengths differ");
    assert!(matches!(
        err,
        EvaluationError::LabelLengthMismatch {
            ground_truth_len: 3,
            predicted_len: 4,
        }
    ));
}

#[rstest]
fn string_and_integer_labels_can_be_compared() {
    let truth = ["cat", "cat", "dog", "dog", "dog"];
    let predicted = [10_u64, 10, 20, 20, 10];
    let alignment = clustering_assignment(&truth, &predicted).expect("labels are valid");
    assert_eq!(alignment.class_for(&10), Some(&"cat"));
    assert_eq!(alignment.class_for(&20), Some(&"dog"));
    assert_eq!(alignment.accuracy(), 0.8);
}

#[rstest]
fn alignment_records_core_tracing() {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    let accuracy = tracing::subscriber::with_default(subscriber, || {
        clustering_accuracy(&[0, 0, 1, 1, 2], &[4, 4, 5, 5, 5])
    })
    .expect("labels are valid");
    assert_eq!(accuracy, 0.8);

    let span = layer
        .span_named("core.clustering_assignment")
        .expect("core.clustering_assignment span must exist");
    assert_eq!(span.field("samples"), Some("5"));
    assert_eq!(span.field("classes"), Some("3"));
    assert_eq!(span.field("clusters"), Some("2"));

    let assignment = layer
        .span_named("core.assignment")
        .expect("core.assignment span must exist");
    assert_eq!(assignment.field("objective"), Some("max"));
    assert!(layer.has_event(Level::DEBUG, "clusters aligned"));
}

#[rstest]
fn invalid_input_closes_span_with_error() {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    let result = tracing::subscriber::with_default(subscriber, || {
        clustering_accuracy::<u8, u8>(&[], &[])
    });
    assert_eq!(result, Err(EvaluationError::EmptyLabels));
    assert!(
        layer
            .events()
            .iter()
            .any(|event| event.level == Level::ERROR && event.field("error").is_some())
    );
}
