//! JSON parameter persistence.
//!
//! Parameters are stored as a single JSON object with sorted keys and
//! two-space indentation so diffs between runs stay readable.

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::{
    bootstrap::Experiment,
    error::{ExperimentError, Result, io_error, json_error},
    layout::PARAMS_FILE,
};

/// Parameter mapping as read from `params.json`.
pub type Params = Map<String, Value>;

impl Experiment {
    /// Writes `params` to `params.json`, replacing any previous file.
    ///
    /// # Errors
    /// Returns [`ExperimentError::ParamsNotObject`] if `params` does not
    /// serialise to a JSON object, [`ExperimentError::Json`] if serialisation
    /// fails, and [`ExperimentError::Io`] if the write fails.
    #[instrument(name = "experiment.save_params", err, skip_all)]
    pub fn save_params<P>(&self, params: &P) -> Result<()>
    where
        P: Serialize + ?Sized,
    {
        let path = self.layout.params();
        // Round-tripping through `Value` sorts object keys at every depth.
        let value = serde_json::to_value(params).map_err(json_error(&path))?;
        let Value::Object(object) = value else {
            return Err(ExperimentError::ParamsNotObject { path });
        };
        let text = serde_json::to_string_pretty(&object).map_err(json_error(&path))?;
        self.dir.write(PARAMS_FILE, text).map_err(io_error(&path))?;
        debug!(keys = object.len(), "parameters saved");
        Ok(())
    }

    /// Reads `params.json` as a JSON object.
    ///
    /// # Errors
    /// Returns [`ExperimentError::Io`] if the file cannot be read,
    /// [`ExperimentError::Json`] if it is not valid JSON, and
    /// [`ExperimentError::ParamsNotObject`] if it holds something other than
    /// an object.
    pub fn load_params(&self) -> Result<Params> {
        match self.load_params_as::<Value>()? {
            Value::Object(object) => Ok(object),
            _ => Err(ExperimentError::ParamsNotObject {
                path: self.layout.params(),
            }),
        }
    }

    /// Reads `params.json` into a typed value.
    ///
    /// # Errors
    /// Returns [`ExperimentError::Io`] if the file cannot be read and
    /// [`ExperimentError::Json`] if it does not decode into `T`.
    #[instrument(name = "experiment.load_params", err, skip_all)]
    pub fn load_params_as<T: DeserializeOwned>(&self) -> Result<T> {
        let path = self.layout.params();
        let text = self
            .dir
            .read_to_string(PARAMS_FILE)
            .map_err(io_error(&path))?;
        serde_json::from_str(&text).map_err(json_error(&path))
    }
}

/// Writes `params` to `<model_dir>/params.json` with sorted keys and an indent
/// of two spaces.
///
/// # Errors
/// See [`Experiment::save_params`]; additionally fails with
/// [`ExperimentError::MissingDirectory`] if `model_dir` does not exist.
///
/// # Examples
/// ```
/// use hamachi_experiment::{load_params, save_params};
/// use serde_json::json;
///
/// let scratch = tempfile::tempdir()?;
/// save_params(scratch.path(), &json!({"lr": 0.01, "batch_size": 64}))?;
/// let text = std::fs::read_to_string(scratch.path().join("params.json"))?;
/// assert_eq!(text, "{\n  \"batch_size\": 64,\n  \"lr\": 0.01\n}");
/// assert_eq!(load_params(scratch.path())?["lr"], json!(0.01));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn save_params<P>(model_dir: impl AsRef<Path>, params: &P) -> Result<()>
where
    P: Serialize + ?Sized,
{
    Experiment::open(model_dir.as_ref())?.save_params(params)
}

/// Reads `<model_dir>/params.json`.
///
/// # Errors
/// See [`Experiment::load_params`].
pub fn load_params(model_dir: impl AsRef<Path>) -> Result<Params> {
    Experiment::open(model_dir.as_ref())?.load_params()
}

/// Reads `<model_dir>/params.json` into a typed value.
///
/// # Errors
/// See [`Experiment::load_params_as`].
pub fn load_params_as<T: DeserializeOwned>(model_dir: impl AsRef<Path>) -> Result<T> {
    Experiment::open(model_dir.as_ref())?.load_params_as()
}
