//! Error types for experiment directory operations.

use std::{io, path::PathBuf};

use hamachi_core::define_error_codes;
use thiserror::Error;

/// Error produced while creating or updating an experiment directory.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// The experiment directory already exists and will not be reused.
    #[error("experiment directory `{path}` already exists")]
    AlreadyExists {
        /// Directory the caller asked to create.
        path: PathBuf,
    },
    /// The experiment directory does not exist.
    #[error("experiment directory `{path}` does not exist")]
    MissingDirectory {
        /// Directory the caller asked to open.
        path: PathBuf,
    },
    /// The loss log has not been initialised.
    #[error("loss log `{path}` is missing from the experiment directory")]
    MissingLossLog {
        /// Expected location of the loss log.
        path: PathBuf,
    },
    /// Parameters did not serialise to a JSON object.
    #[error("parameters in `{path}` must form a JSON object")]
    ParamsNotObject {
        /// Parameter file being written or read.
        path: PathBuf,
    },
    /// A checkpoint tensor's values did not fill its shape.
    #[error("tensor of shape {shape:?} cannot hold {values} values")]
    TensorShape {
        /// Declared shape.
        shape: Vec<usize>,
        /// Number of values present.
        values: usize,
    },
    /// Filesystem access failed.
    #[error("I/O failure on `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The loss log could not be parsed as CSV.
    #[error("CSV failure on `{path}`: {source}")]
    Csv {
        /// Loss log being read.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: csv::Error,
    },
    /// JSON encoding or decoding failed.
    #[error("JSON failure on `{path}`: {source}")]
    Json {
        /// File being encoded or decoded.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

define_error_codes! {
    /// Stable codes describing [`ExperimentError`] variants.
    enum ExperimentErrorCode for ExperimentError {
        /// The experiment directory already exists.
        AlreadyExists => AlreadyExists { .. } => "EXPERIMENT_ALREADY_EXISTS",
        /// The experiment directory does not exist.
        MissingDirectory => MissingDirectory { .. } => "EXPERIMENT_MISSING_DIRECTORY",
        /// The loss log has not been initialised.
        MissingLossLog => MissingLossLog { .. } => "EXPERIMENT_MISSING_LOSS_LOG",
        /// Parameters did not form a JSON object.
        ParamsNotObject => ParamsNotObject { .. } => "EXPERIMENT_PARAMS_NOT_OBJECT",
        /// A checkpoint tensor's values did not fill its shape.
        TensorShape => TensorShape { .. } => "EXPERIMENT_TENSOR_SHAPE",
        /// Filesystem access failed.
        Io => Io { .. } => "EXPERIMENT_IO",
        /// The loss log could not be parsed as CSV.
        Csv => Csv { .. } => "EXPERIMENT_CSV",
        /// JSON encoding or decoding failed.
        Json => Json { .. } => "EXPERIMENT_JSON",
    }
}

/// Convenient result alias for experiment operations.
pub type Result<T, E = ExperimentError> = std::result::Result<T, E>;

/// Wraps an [`io::Error`] with the path it concerns.
pub(crate) fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> ExperimentError {
    let path = path.into();
    move |source| ExperimentError::Io { path, source }
}

/// Wraps a [`serde_json::Error`] with the file it concerns.
pub(crate) fn json_error(
    path: impl Into<PathBuf>,
) -> impl FnOnce(serde_json::Error) -> ExperimentError {
    let path = path.into();
    move |source| ExperimentError::Json { path, source }
}
