//! Stable error codes and messages exposed by the core error types.

use hamachi_core::{DatasetError, DatasetErrorCode, EvaluationError, EvaluationErrorCode};
use rstest::rstest;

#[rstest]
#[case(
    EvaluationError::LabelLengthMismatch { ground_truth_len: 3, predicted_len: 4 },
    EvaluationErrorCode::LabelLengthMismatch,
    "EVALUATION_LABEL_LENGTH_MISMATCH",
)]
#[case(EvaluationError::EmptyLabels, EvaluationErrorCode::EmptyLabels, "EVALUATION_EMPTY_LABELS")]
#[case(
    EvaluationError::UnknownLabel { position: 2 },
    EvaluationErrorCode::UnknownLabel,
    "EVALUATION_UNKNOWN_LABEL",
)]
#[case(
    EvaluationError::MatrixShape { rows: 2, cols: 2, values: 3 },
    EvaluationErrorCode::MatrixShape,
    "EVALUATION_MATRIX_SHAPE",
)]
#[case(
    EvaluationError::InvariantViolation { context: "testing" },
    EvaluationErrorCode::InvariantViolation,
    "EVALUATION_INVARIANT_VIOLATION",
)]
fn returns_expected_evaluation_code(
    #[case] error: EvaluationError,
    #[case] expected: EvaluationErrorCode,
    #[case] text: &str,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), text);
    assert_eq!(error.code().to_string(), text);
}

#[rstest]
#[case(
    DatasetError::LengthMismatch { samples: 1, labels: 2 },
    DatasetErrorCode::LengthMismatch,
)]
#[case(
    DatasetError::LabelOutOfRange { position: 0, label: 9, num_classes: 3 },
    DatasetErrorCode::LabelOutOfRange,
)]
#[case(DatasetError::EmptyClass { class: 1 }, DatasetErrorCode::EmptyClass)]
fn returns_expected_dataset_code(#[case] error: DatasetError, #[case] expected: DatasetErrorCode) {
    assert_eq!(error.code(), expected);
    assert!(error.code().as_str().starts_with("DATASET_"));
}

#[rstest]
fn length_mismatch_message_names_both_lengths() {
    let error = EvaluationError::LabelLengthMismatch {
        ground_truth_len: 3,
        predicted_len: 4,
    };
    assert_eq!(
        error.to_string(),
        "label length mismatch: ground_truth=3, predicted=4"
    );
}
