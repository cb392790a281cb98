//! Experiment directory creation and access.
//!
//! An experiment directory is created once per training run and never merged
//! into: creating over an existing path fails. All later file access goes
//! through a capability handle on the directory.

use std::{
    io,
    path::{Path, PathBuf},
};

use cap_std::{ambient_authority, fs::Dir};
use tracing::{Span, field, info, instrument};

use crate::{
    error::{ExperimentError, Result, io_error},
    layout::{CHECKPOINTS_DIR, ExperimentLayout, FIGURES_DIR, LOSS_LOG_FILE},
    loss_log::LOSS_LOG_HEADERS,
};

/// Configures and creates a new experiment directory.
///
/// # Examples
/// ```
/// use hamachi_experiment::ExperimentBuilder;
///
/// let scratch = tempfile::tempdir()?;
/// let experiment = ExperimentBuilder::new(scratch.path().join("run"))
///     .with_headers(["epoch", "loss"])
///     .create()?;
/// assert_eq!(experiment.read_loss_log()?.header(), ["epoch", "loss"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct ExperimentBuilder {
    layout: ExperimentLayout,
    headers: Vec<String>,
}

impl ExperimentBuilder {
    /// Builder for an experiment rooted at `model_dir` with the default loss
    /// log header.
    #[must_use]
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: ExperimentLayout::new(model_dir),
            headers: LOSS_LOG_HEADERS.iter().map(|&h| h.to_owned()).collect(),
        }
    }

    /// Replaces the loss log header row.
    #[must_use]
    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Loss log header row that [`Self::create`] will write.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Creates the directory tree and the loss log.
    ///
    /// Missing parent directories are created. The loss log holds only the
    /// header row, without a trailing newline.
    ///
    /// # Errors
    /// Returns [`ExperimentError::AlreadyExists`] if the directory exists and
    /// [`ExperimentError::Io`] if any part of the tree cannot be created.
    #[instrument(
        name = "experiment.create",
        err,
        skip(self),
        fields(model_dir = field::Empty, columns = self.headers.len()),
    )]
    pub fn create(self) -> Result<Experiment> {
        let root = self.layout.root().to_path_buf();
        Span::current().record("model_dir", field::display(root.display()));
        let already_exists = || ExperimentError::AlreadyExists { path: root.clone() };

        let leaf = root.file_name().ok_or_else(already_exists)?;
        let parent = match root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(io_error(parent))?;
        let parent_dir =
            Dir::open_ambient_dir(parent, ambient_authority()).map_err(io_error(parent))?;
        parent_dir.create_dir(leaf).map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                already_exists()
            } else {
                ExperimentError::Io {
                    path: root.clone(),
                    source,
                }
            }
        })?;

        let dir = parent_dir.open_dir(leaf).map_err(io_error(&root))?;
        dir.create_dir(CHECKPOINTS_DIR)
            .map_err(io_error(self.layout.checkpoints_dir()))?;
        dir.create_dir(FIGURES_DIR)
            .map_err(io_error(self.layout.figures_dir()))?;
        dir.write(LOSS_LOG_FILE, self.headers.join(","))
            .map_err(io_error(self.layout.loss_log()))?;

        info!(project_dir = %root.display(), "experiment directory initialised");
        Ok(Experiment {
            layout: self.layout,
            dir,
        })
    }
}

/// Handle on an existing experiment directory.
#[derive(Debug)]
pub struct Experiment {
    pub(crate) layout: ExperimentLayout,
    pub(crate) dir: Dir,
}

impl Experiment {
    /// Opens the experiment directory at `model_dir`.
    ///
    /// # Errors
    /// Returns [`ExperimentError::MissingDirectory`] if the directory does not
    /// exist and [`ExperimentError::Io`] if it cannot be opened.
    pub fn open(model_dir: impl Into<PathBuf>) -> Result<Self> {
        let layout = ExperimentLayout::new(model_dir);
        let dir = Dir::open_ambient_dir(layout.root(), ambient_authority()).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ExperimentError::MissingDirectory {
                    path: layout.root().to_path_buf(),
                }
            } else {
                ExperimentError::Io {
                    path: layout.root().to_path_buf(),
                    source,
                }
            }
        })?;
        Ok(Self { layout, dir })
    }

    /// Paths making up this experiment.
    #[must_use]
    pub fn layout(&self) -> &ExperimentLayout {
        &self.layout
    }
}

/// Creates an experiment directory with its `checkpoints/` and `figures/`
/// subdirectories and a loss log holding the default header row.
///
/// # Errors
/// Returns [`ExperimentError::AlreadyExists`] if `model_dir` exists and
/// [`ExperimentError::Io`] on filesystem failures.
///
/// # Examples
/// ```
/// use hamachi_experiment::init_pipeline;
///
/// let scratch = tempfile::tempdir()?;
/// let model_dir = scratch.path().join("run");
/// init_pipeline(&model_dir)?;
/// assert!(model_dir.join("checkpoints").is_dir());
/// assert!(init_pipeline(&model_dir).is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn init_pipeline(model_dir: impl AsRef<Path>) -> Result<Experiment> {
    ExperimentBuilder::new(model_dir.as_ref()).create()
}
