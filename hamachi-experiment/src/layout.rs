//! On-disk layout of an experiment directory.
//!
//! ```text
//! <model_dir>/
//! ├── checkpoints/model-epoch{N}.pt
//! ├── figures/
//! ├── losses.csv
//! └── params.json
//! ```

use std::path::{Path, PathBuf};

/// Subdirectory holding model checkpoints.
pub const CHECKPOINTS_DIR: &str = "checkpoints";
/// Subdirectory reserved for plots produced by the training loop.
pub const FIGURES_DIR: &str = "figures";
/// CSV loss log file name.
pub const LOSS_LOG_FILE: &str = "losses.csv";
/// JSON parameter file name.
pub const PARAMS_FILE: &str = "params.json";

const CHECKPOINT_PREFIX: &str = "model-epoch";
const CHECKPOINT_SUFFIX: &str = ".pt";

/// File name of the checkpoint written for `epoch`.
///
/// # Examples
/// ```
/// use hamachi_experiment::checkpoint_file_name;
///
/// assert_eq!(checkpoint_file_name(12), "model-epoch12.pt");
/// ```
#[must_use]
pub fn checkpoint_file_name(epoch: u64) -> String {
    format!("{CHECKPOINT_PREFIX}{epoch}{CHECKPOINT_SUFFIX}")
}

/// Epoch encoded in a checkpoint file name, if `name` is one.
///
/// # Examples
/// ```
/// use hamachi_experiment::parse_checkpoint_epoch;
///
/// assert_eq!(parse_checkpoint_epoch("model-epoch7.pt"), Some(7));
/// assert_eq!(parse_checkpoint_epoch("notes.txt"), None);
/// ```
#[must_use]
pub fn parse_checkpoint_epoch(name: &str) -> Option<u64> {
    name.strip_prefix(CHECKPOINT_PREFIX)?
        .strip_suffix(CHECKPOINT_SUFFIX)?
        .parse()
        .ok()
}

/// Paths of the files and directories making up one experiment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExperimentLayout {
    root: PathBuf,
}

impl ExperimentLayout {
    /// Layout rooted at `model_dir`.
    #[must_use]
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: model_dir.into(),
        }
    }

    /// The experiment directory itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding checkpoints.
    #[must_use]
    pub fn checkpoints_dir(&self) -> PathBuf {
        self.root.join(CHECKPOINTS_DIR)
    }

    /// Directory reserved for figures.
    #[must_use]
    pub fn figures_dir(&self) -> PathBuf {
        self.root.join(FIGURES_DIR)
    }

    /// CSV loss log.
    #[must_use]
    pub fn loss_log(&self) -> PathBuf {
        self.root.join(LOSS_LOG_FILE)
    }

    /// JSON parameter file.
    #[must_use]
    pub fn params(&self) -> PathBuf {
        self.root.join(PARAMS_FILE)
    }

    /// Checkpoint file for `epoch`.
    #[must_use]
    pub fn checkpoint(&self, epoch: u64) -> PathBuf {
        self.checkpoints_dir().join(checkpoint_file_name(epoch))
    }
}
