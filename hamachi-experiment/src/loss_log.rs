//! Append-only CSV loss log.
//!
//! The log starts as a single header row with no trailing newline. Each
//! appended row is written as a newline followed by the comma-joined values,
//! so the file never ends with an empty line. Values are written unquoted;
//! reading goes through a CSV parser, so hand-edited logs with quoted fields
//! still load.

use std::{fmt::Display, io, io::Write as _, path::Path};

use cap_std::fs::OpenOptions;
use csv::ReaderBuilder;
use tracing::{debug, instrument};

use crate::{
    bootstrap::Experiment,
    error::{ExperimentError, Result, io_error},
    layout::{ExperimentLayout, LOSS_LOG_FILE},
};

/// Default loss log header row.
pub const LOSS_LOG_HEADERS: [&str; 7] = [
    "epoch",
    "step",
    "loss",
    "discrimn_loss_e",
    "compress_loss_e",
    "discrimn_loss_t",
    "compress_loss_t",
];

/// One training step's losses in the default header order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LossRecord {
    /// Training epoch.
    pub epoch: u64,
    /// Step within the epoch.
    pub step: u64,
    /// Total loss.
    pub loss: f64,
    /// Discriminative loss, empirical estimate.
    pub discrimn_loss_e: f64,
    /// Compressive loss, empirical estimate.
    pub compress_loss_e: f64,
    /// Discriminative loss, theoretical estimate.
    pub discrimn_loss_t: f64,
    /// Compressive loss, theoretical estimate.
    pub compress_loss_t: f64,
}

impl LossRecord {
    /// Row values in header order.
    ///
    /// Floats keep a fractional part even when integral, so `1.0` is written
    /// as `1.0` rather than `1`.
    ///
    /// # Examples
    /// ```
    /// use hamachi_experiment::LossRecord;
    ///
    /// let record = LossRecord {
    ///     epoch: 2,
    ///     step: 10,
    ///     loss: 1.0,
    ///     discrimn_loss_e: 0.5,
    ///     compress_loss_e: 0.25,
    ///     discrimn_loss_t: 0.125,
    ///     compress_loss_t: -0.5,
    /// };
    /// assert_eq!(record.entries().join(","), "2,10,1.0,0.5,0.25,0.125,-0.5");
    /// ```
    #[must_use]
    pub fn entries(&self) -> [String; 7] {
        [
            self.epoch.to_string(),
            self.step.to_string(),
            format!("{:?}", self.loss),
            format!("{:?}", self.discrimn_loss_e),
            format!("{:?}", self.compress_loss_e),
            format!("{:?}", self.discrimn_loss_t),
            format!("{:?}", self.compress_loss_t),
        ]
    }
}

/// Parsed contents of a loss log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LossLog {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LossLog {
    /// Reads a header row followed by data rows from `reader`.
    ///
    /// Rows may differ in length from the header. Blank lines are skipped.
    ///
    /// # Errors
    /// Returns [`csv::Error`] if reading fails or a row is malformed.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let header: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|row| row.iter().map(str::to_owned).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { header, rows })
    }

    /// Parses CSV text held in memory.
    ///
    /// # Errors
    /// See [`Self::from_reader`].
    ///
    /// # Examples
    /// ```
    /// use hamachi_experiment::LossLog;
    ///
    /// let log = LossLog::parse("epoch,note\n0,\"warm, then cool\"")?;
    /// assert_eq!(log.column("note"), Some(vec!["warm, then cool"]));
    /// # Ok::<(), csv::Error>(())
    /// ```
    pub fn parse(contents: &str) -> Result<Self, csv::Error> {
        Self::from_reader(contents.as_bytes())
    }

    /// Column names.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Appended rows in write order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Values of column `name`, one per row, or `None` for unknown columns.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.header.iter().position(|column| column == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map_or("", String::as_str))
                .collect(),
        )
    }
}

fn join_entries<I>(entries: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    entries
        .into_iter()
        .map(|entry| entry.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl Experiment {
    /// Appends one row to the loss log.
    ///
    /// # Errors
    /// Returns [`ExperimentError::MissingLossLog`] if the log was never
    /// created and [`ExperimentError::Io`] if the append fails.
    #[instrument(name = "experiment.save_state", err, skip_all)]
    pub fn save_state<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let path = self.layout.loss_log();
        let row = join_entries(entries);
        let mut file = self
            .dir
            .open_with(LOSS_LOG_FILE, OpenOptions::new().append(true))
            .map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    ExperimentError::MissingLossLog { path: path.clone() }
                } else {
                    ExperimentError::Io {
                        path: path.clone(),
                        source,
                    }
                }
            })?;
        write!(file, "\n{row}").map_err(io_error(&path))?;
        debug!(row = row.as_str(), "loss row appended");
        Ok(())
    }

    /// Appends a typed loss record.
    ///
    /// # Errors
    /// See [`Self::save_state`].
    pub fn save_loss_record(&self, record: &LossRecord) -> Result<()> {
        self.save_state(record.entries())
    }

    /// Reads back the loss log.
    ///
    /// # Errors
    /// Returns [`ExperimentError::MissingLossLog`] if the log is absent,
    /// [`ExperimentError::Io`] if it cannot be opened, and
    /// [`ExperimentError::Csv`] if its contents cannot be parsed.
    pub fn read_loss_log(&self) -> Result<LossLog> {
        let path = self.layout.loss_log();
        let file = self.dir.open(LOSS_LOG_FILE).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ExperimentError::MissingLossLog { path: path.clone() }
            } else {
                ExperimentError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        LossLog::from_reader(file).map_err(|source| ExperimentError::Csv { path, source })
    }
}

/// Opens `model_dir`, treating a missing directory as a missing loss log.
fn open_for_loss_log(model_dir: &Path) -> Result<Experiment> {
    Experiment::open(model_dir).map_err(|err| match err {
        ExperimentError::MissingDirectory { .. } => ExperimentError::MissingLossLog {
            path: ExperimentLayout::new(model_dir).loss_log(),
        },
        other => other,
    })
}

/// Appends one comma-joined row to `<model_dir>/losses.csv`.
///
/// Each entry is written with its `Display` form, so an integral `f64` such as
/// `1.0` appears as `1` and `1e-7` as `0.0000001`. Log through
/// [`save_loss_record`] to keep a fractional part on every loss value.
///
/// # Errors
/// Returns [`ExperimentError::MissingLossLog`] if the experiment was not
/// initialised and [`ExperimentError::Io`] if the append fails.
///
/// # Examples
/// ```
/// use hamachi_experiment::{LossRecord, init_pipeline, save_loss_record, save_state};
///
/// let scratch = tempfile::tempdir()?;
/// let model_dir = scratch.path().join("run");
/// init_pipeline(&model_dir)?;
/// save_state(&model_dir, [0.0, 1.0, 2.5])?;
/// let record = LossRecord {
///     epoch: 0,
///     step: 1,
///     loss: 2.0,
///     discrimn_loss_e: 1.0,
///     compress_loss_e: 1.0,
///     discrimn_loss_t: 1.0,
///     compress_loss_t: 1.0,
/// };
/// save_loss_record(&model_dir, &record)?;
/// let text = std::fs::read_to_string(model_dir.join("losses.csv"))?;
/// assert!(text.ends_with("\n0,1,2.5\n0,1,2.0,1.0,1.0,1.0,1.0"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn save_state<I>(model_dir: impl AsRef<Path>, entries: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: Display,
{
    open_for_loss_log(model_dir.as_ref())?.save_state(entries)
}

/// Appends a typed loss record to `<model_dir>/losses.csv`.
///
/// # Errors
/// See [`save_state`].
pub fn save_loss_record(model_dir: impl AsRef<Path>, record: &LossRecord) -> Result<()> {
    open_for_loss_log(model_dir.as_ref())?.save_loss_record(record)
}

/// Reads `<model_dir>/losses.csv`.
///
/// # Errors
/// Returns [`ExperimentError::MissingLossLog`] if the log is absent.
pub fn read_loss_log(model_dir: impl AsRef<Path>) -> Result<LossLog> {
    open_for_loss_log(model_dir.as_ref())?.read_loss_log()
}
