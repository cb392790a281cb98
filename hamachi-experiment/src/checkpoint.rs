//! Model checkpoints keyed by epoch.
//!
//! A model hands over its parameters as a [`StateDict`]: named tensors with a
//! shape and flat row-major `f32` values. Each checkpoint is the JSON encoding
//! of one state dict, stored as `checkpoints/model-epoch{N}.pt`. Non-finite
//! values, which JSON numbers cannot hold, are written as the strings `"NaN"`,
//! `"inf"`, and `"-inf"`.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, instrument};

use crate::{
    bootstrap::Experiment,
    error::{ExperimentError, Result, io_error, json_error},
    layout::{CHECKPOINTS_DIR, checkpoint_file_name, parse_checkpoint_epoch},
};

/// A parameter tensor: a shape and its row-major values.
///
/// # Examples
/// ```
/// use hamachi_experiment::ParamTensor;
///
/// let weight = ParamTensor::new(vec![2, 3], vec![0.0; 6])?;
/// assert_eq!(weight.numel(), 6);
/// assert!(ParamTensor::new(vec![2, 2], vec![1.0]).is_err());
/// # Ok::<(), hamachi_experiment::ExperimentError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTensor")]
pub struct ParamTensor {
    shape: Vec<usize>,
    #[serde(serialize_with = "serialize_values")]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct RawTensor {
    shape: Vec<usize>,
    #[serde(deserialize_with = "deserialize_values")]
    values: Vec<f32>,
}

/// One tensor element as stored on disk.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Finite(f32),
    NonFinite(NonFinite),
}

#[derive(Serialize, Deserialize)]
enum NonFinite {
    #[serde(rename = "NaN")]
    Nan,
    #[serde(rename = "inf")]
    Infinity,
    #[serde(rename = "-inf")]
    NegativeInfinity,
}

impl From<f32> for StoredValue {
    fn from(value: f32) -> Self {
        if value.is_nan() {
            Self::NonFinite(NonFinite::Nan)
        } else if value.is_infinite() {
            Self::NonFinite(if value.is_sign_positive() {
                NonFinite::Infinity
            } else {
                NonFinite::NegativeInfinity
            })
        } else {
            Self::Finite(value)
        }
    }
}

impl From<StoredValue> for f32 {
    fn from(stored: StoredValue) -> Self {
        match stored {
            StoredValue::Finite(value) => value,
            StoredValue::NonFinite(NonFinite::Nan) => Self::NAN,
            StoredValue::NonFinite(NonFinite::Infinity) => Self::INFINITY,
            StoredValue::NonFinite(NonFinite::NegativeInfinity) => Self::NEG_INFINITY,
        }
    }
}

fn serialize_values<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(|&value| StoredValue::from(value)))
}

fn deserialize_values<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
    let stored = Vec::<StoredValue>::deserialize(deserializer)?;
    Ok(stored.into_iter().map(f32::from).collect())
}

impl TryFrom<RawTensor> for ParamTensor {
    type Error = ExperimentError;

    fn try_from(raw: RawTensor) -> Result<Self> {
        Self::new(raw.shape, raw.values)
    }
}

impl ParamTensor {
    /// Creates a tensor, checking that `values` fills `shape` exactly.
    ///
    /// # Errors
    /// Returns [`ExperimentError::TensorShape`] when the element count
    /// implied by `shape` differs from `values.len()`.
    pub fn new(shape: Vec<usize>, values: Vec<f32>) -> Result<Self> {
        let expected = shape
            .iter()
            .try_fold(1_usize, |acc, &dim| acc.checked_mul(dim));
        if expected != Some(values.len()) {
            return Err(ExperimentError::TensorShape {
                shape,
                values: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    /// Zero-dimensional tensor holding `value`.
    #[must_use]
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Vec::new(),
            values: vec![value],
        }
    }

    /// Dimensions of the tensor.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major element values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.values.len()
    }
}

/// Named parameter tensors of one model, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateDict {
    tensors: BTreeMap<String, ParamTensor>,
}

impl StateDict {
    /// Empty state dict.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the tensor stored under `name`.
    pub fn insert(&mut self, name: impl Into<String>, tensor: ParamTensor) -> Option<ParamTensor> {
        self.tensors.insert(name.into(), tensor)
    }

    /// Builder-style [`Self::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, tensor: ParamTensor) -> Self {
        self.insert(name, tensor);
        self
    }

    /// Tensor stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamTensor> {
        self.tensors.get(name)
    }

    /// Tensors in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamTensor)> {
        self.tensors
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor))
    }

    /// Number of tensors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Returns `true` when no tensors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Total number of scalar parameters across all tensors.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.tensors.values().map(ParamTensor::numel).sum()
    }
}

/// Models that can be snapshotted into a checkpoint.
pub trait Checkpoint {
    /// Returns the model's current parameters.
    fn state_dict(&self) -> StateDict;
}

impl Checkpoint for StateDict {
    fn state_dict(&self) -> StateDict {
        self.clone()
    }
}

impl Experiment {
    /// Writes `net`'s parameters to `checkpoints/model-epoch{epoch}.pt`.
    ///
    /// An existing checkpoint for the same epoch is replaced.
    ///
    /// # Errors
    /// Returns [`ExperimentError::Json`] if encoding fails and
    /// [`ExperimentError::Io`] if the checkpoint cannot be written.
    #[instrument(name = "experiment.save_ckpt", err, skip(self, net))]
    pub fn save_ckpt<M>(&self, net: &M, epoch: u64) -> Result<()>
    where
        M: Checkpoint + ?Sized,
    {
        let path = self.layout.checkpoint(epoch);
        let state = net.state_dict();
        let encoded = serde_json::to_vec(&state).map_err(json_error(&path))?;
        self.dir
            .open_dir(CHECKPOINTS_DIR)
            .and_then(|checkpoints| checkpoints.write(checkpoint_file_name(epoch), encoded))
            .map_err(io_error(&path))?;
        info!(
            tensors = state.len(),
            parameters = state.parameter_count(),
            path = %path.display(),
            "checkpoint saved"
        );
        Ok(())
    }

    /// Reads the checkpoint written for `epoch`.
    ///
    /// # Errors
    /// Returns [`ExperimentError::Io`] if the checkpoint cannot be read and
    /// [`ExperimentError::Json`] if it does not decode into a state dict.
    #[instrument(name = "experiment.load_ckpt", err, skip(self))]
    pub fn load_ckpt(&self, epoch: u64) -> Result<StateDict> {
        let path = self.layout.checkpoint(epoch);
        let bytes = self
            .dir
            .open_dir(CHECKPOINTS_DIR)
            .and_then(|checkpoints| checkpoints.read(checkpoint_file_name(epoch)))
            .map_err(io_error(&path))?;
        serde_json::from_slice(&bytes).map_err(json_error(&path))
    }

    /// Epochs with a saved checkpoint, in ascending order.
    ///
    /// # Errors
    /// Returns [`ExperimentError::Io`] if the checkpoint directory cannot be
    /// listed.
    pub fn list_checkpoints(&self) -> Result<Vec<u64>> {
        let dir_path = self.layout.checkpoints_dir();
        let checkpoints = self
            .dir
            .open_dir(CHECKPOINTS_DIR)
            .map_err(io_error(&dir_path))?;
        let mut epochs = Vec::new();
        for entry in checkpoints.entries().map_err(io_error(&dir_path))? {
            let entry = entry.map_err(io_error(&dir_path))?;
            if let Some(epoch) = entry.file_name().to_str().and_then(parse_checkpoint_epoch) {
                epochs.push(epoch);
            }
        }
        epochs.sort_unstable();
        Ok(epochs)
    }
}

/// Saves `net`'s parameters as `<model_dir>/checkpoints/model-epoch{epoch}.pt`.
///
/// # Errors
/// See [`Experiment::save_ckpt`]; additionally fails with
/// [`ExperimentError::MissingDirectory`] if `model_dir` does not exist.
///
/// # Examples
/// ```
/// use hamachi_experiment::{ParamTensor, StateDict, init_pipeline, load_ckpt, save_ckpt};
///
/// let scratch = tempfile::tempdir()?;
/// let model_dir = scratch.path().join("run");
/// init_pipeline(&model_dir)?;
/// let net = StateDict::new().with("bias", ParamTensor::new(vec![2], vec![0.5, -0.5])?);
/// save_ckpt(&model_dir, &net, 3)?;
/// assert!(model_dir.join("checkpoints/model-epoch3.pt").is_file());
/// assert_eq!(load_ckpt(&model_dir, 3)?, net);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn save_ckpt<M>(model_dir: impl AsRef<Path>, net: &M, epoch: u64) -> Result<()>
where
    M: Checkpoint + ?Sized,
{
    Experiment::open(model_dir.as_ref())?.save_ckpt(net, epoch)
}

/// Loads the checkpoint saved for `epoch` under `model_dir`.
///
/// # Errors
/// See [`Experiment::load_ckpt`].
pub fn load_ckpt(model_dir: impl AsRef<Path>, epoch: u64) -> Result<StateDict> {
    Experiment::open(model_dir.as_ref())?.load_ckpt(epoch)
}

/// Lists the epochs checkpointed under `model_dir`.
///
/// # Errors
/// See [`Experiment::list_checkpoints`].
pub fn list_checkpoints(model_dir: impl AsRef<Path>) -> Result<Vec<u64>> {
    Experiment::open(model_dir.as_ref())?.list_checkpoints()
}
