//! Error types for the hamachi core library.
//!
//! Defines the error enums exposed by the evaluation and dataset APIs together
//! with stable machine-readable codes.

use thiserror::Error;

/// Declares a stable error-code enum for an error type.
///
/// The generated code enum is `Copy`, implements `Display` through its
/// string form, and the error type gains a `code()` accessor mapping each
/// variant to its code. Sibling crates reuse the macro so every error surfaced
/// by the CLI carries a code of the same shape.
#[macro_export]
macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl ::core::fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Errors raised while comparing two label sequences.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum EvaluationError {
    /// Ground-truth and predicted labels had different lengths.
    #[error("label length mismatch: ground_truth={ground_truth_len}, predicted={predicted_len}")]
    LabelLengthMismatch {
        /// Number of ground-truth labels.
        ground_truth_len: usize,
        /// Number of predicted labels.
        predicted_len: usize,
    },
    /// Both label sequences were empty.
    #[error("label sequences must contain at least one sample")]
    EmptyLabels,
    /// A label was not part of the encoder's fitted label set.
    #[error("label at position {position} was not seen while fitting the encoder")]
    UnknownLabel {
        /// Index of the offending label in the encoded sequence.
        position: usize,
    },
    /// Weight matrix values did not match the declared shape.
    #[error("weight matrix of shape {rows}x{cols} cannot hold {values} values")]
    MatrixShape {
        /// Declared number of rows.
        rows: usize,
        /// Declared number of columns.
        cols: usize,
        /// Number of values supplied.
        values: usize,
    },
    /// Internal contingency or assignment state violated expected invariants.
    #[error("internal evaluation invariant violated while {context}")]
    InvariantViolation {
        /// Human-readable context describing which lookup failed.
        context: &'static str,
    },
}

define_error_codes! {
    /// Stable codes describing [`EvaluationError`] variants.
    enum EvaluationErrorCode for EvaluationError {
        /// Ground-truth and predicted labels had different lengths.
        LabelLengthMismatch => LabelLengthMismatch { .. } => "EVALUATION_LABEL_LENGTH_MISMATCH",
        /// Both label sequences were empty.
        EmptyLabels => EmptyLabels => "EVALUATION_EMPTY_LABELS",
        /// A label was not part of the encoder's fitted label set.
        UnknownLabel => UnknownLabel { .. } => "EVALUATION_UNKNOWN_LABEL",
        /// Weight matrix values did not match the declared shape.
        MatrixShape => MatrixShape { .. } => "EVALUATION_MATRIX_SHAPE",
        /// Internal invariant violated.
        InvariantViolation => InvariantViolation { .. } => "EVALUATION_INVARIANT_VIOLATION",
    }
}

/// Errors raised while partitioning a dataset by class label.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DatasetError {
    /// Sample and label sequences had different lengths.
    #[error("dataset length mismatch: samples={samples}, labels={labels}")]
    LengthMismatch {
        /// Number of samples supplied.
        samples: usize,
        /// Number of labels supplied.
        labels: usize,
    },
    /// A label fell outside `0..num_classes`.
    #[error("label {label} at position {position} is outside 0..{num_classes}")]
    LabelOutOfRange {
        /// Index of the offending sample.
        position: usize,
        /// Label value found at `position`.
        label: usize,
        /// Number of classes the caller declared.
        num_classes: usize,
    },
    /// A class received no samples and cannot be stacked.
    #[error("class {class} has no samples")]
    EmptyClass {
        /// Class identifier with no samples.
        class: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`DatasetError`] variants.
    enum DatasetErrorCode for DatasetError {
        /// Sample and label sequences had different lengths.
        LengthMismatch => LengthMismatch { .. } => "DATASET_LENGTH_MISMATCH",
        /// A label fell outside `0..num_classes`.
        LabelOutOfRange => LabelOutOfRange { .. } => "DATASET_LABEL_OUT_OF_RANGE",
        /// A class received no samples.
        EmptyClass => EmptyClass { .. } => "DATASET_EMPTY_CLASS",
    }
}

/// Convenient result alias for evaluation operations.
pub type Result<T, E = EvaluationError> = std::result::Result<T, E>;

impl EvaluationError {
    pub(crate) const fn length_mismatch(ground_truth_len: usize, predicted_len: usize) -> Self {
        Self::LabelLengthMismatch {
            ground_truth_len,
            predicted_len,
        }
    }
}

/// Validates that two label sequences are comparable and returns their length.
///
/// # Errors
/// Returns [`EvaluationError::LabelLengthMismatch`] when the lengths differ and
/// [`EvaluationError::EmptyLabels`] when both are empty.
pub(crate) const fn validate_label_lengths(
    ground_truth_len: usize,
    predicted_len: usize,
) -> Result<usize> {
    if ground_truth_len != predicted_len {
        return Err(EvaluationError::length_mismatch(
            ground_truth_len,
            predicted_len,
        ));
    }
    if ground_truth_len == 0 {
        return Err(EvaluationError::EmptyLabels);
    }
    Ok(ground_truth_len)
}
