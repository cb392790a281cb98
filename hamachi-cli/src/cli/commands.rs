//! Command implementations and argument parsing for the hamachi CLI.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use hamachi_core::{EvaluationError, LabelCount, clustering_assignment, label_agreement};
use hamachi_experiment::{ExperimentError, Params, init_pipeline, load_params, save_state};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "hamachi",
    about = "Manage experiment directories and score clustering runs."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Create a new experiment directory with an empty loss log.
    Init(InitArgs),
    /// Append one row to an experiment's loss log.
    Log(LogArgs),
    /// Print an experiment's saved parameters.
    Params(ParamsArgs),
    /// Score predicted labels against ground truth.
    Evaluate(EvaluateArgs),
}

/// Arguments for `init`.
#[derive(Debug, Args, Clone)]
pub struct InitArgs {
    /// Experiment directory to create; must not exist yet.
    pub model_dir: PathBuf,
}

/// Arguments for `log`.
#[derive(Debug, Args, Clone)]
pub struct LogArgs {
    /// Initialised experiment directory.
    pub model_dir: PathBuf,

    /// Row values, written comma-separated in the order given.
    #[arg(required = true, allow_hyphen_values = true)]
    pub entries: Vec<String>,
}

/// Arguments for `params`.
#[derive(Debug, Args, Clone)]
pub struct ParamsArgs {
    /// Experiment directory holding `params.json`.
    pub model_dir: PathBuf,
}

/// Arguments for `evaluate`.
#[derive(Debug, Args, Clone)]
pub struct EvaluateArgs {
    /// Ground-truth labels, one integer per line.
    pub true_labels: PathBuf,

    /// Predicted labels or cluster ids, one integer per line.
    pub pred_labels: PathBuf,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A label file could not be read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A label file contained a line that is not an integer.
    #[error("`{path}` line {line}: `{value}` is not an integer label")]
    LabelParse {
        /// Label file being read.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Offending text, trimmed.
        value: String,
        /// Integer parse failure.
        #[source]
        source: ParseIntError,
    },
    /// Label scoring failed.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    /// Experiment directory access failed.
    #[error(transparent)]
    Experiment(#[from] ExperimentError),
}

impl CliError {
    /// Stable code of the library error behind this failure, if any.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Evaluation(err) => Some(err.code().as_str()),
            Self::Experiment(err) => Some(err.code().as_str()),
            Self::Io { .. } | Self::LabelParse { .. } => None,
        }
    }
}

/// Scores produced by `evaluate`.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    /// Samples matched under the best cluster-to-class mapping.
    pub clustering: LabelCount,
    /// Samples whose predicted label equals the true label as written.
    pub labels: LabelCount,
    /// `(cluster, class)` pairs of the best mapping, ordered by cluster.
    pub mapping: Vec<(i64, i64)>,
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An experiment directory was created.
    Initialised {
        /// Directory that was created.
        model_dir: PathBuf,
    },
    /// A row was appended to the loss log.
    Logged {
        /// Number of values in the row.
        columns: usize,
    },
    /// Saved parameters were loaded.
    Params(Params),
    /// Labels were scored.
    Evaluation(EvaluationSummary),
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the command fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use hamachi_cli::cli::{Cli, Command, InitArgs, Outcome, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let scratch = tempfile::tempdir()?;
/// let model_dir = scratch.path().join("run");
/// let cli = Cli {
///     command: Command::Init(InitArgs {
///         model_dir: model_dir.clone(),
///     }),
/// };
/// assert_eq!(run_cli(cli)?, Outcome::Initialised { model_dir });
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<Outcome, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Init(args) => {
            span.record("command", "init");
            run_init(&args)
        }
        Command::Log(args) => {
            span.record("command", "log");
            run_log(&args)
        }
        Command::Params(args) => {
            span.record("command", "params");
            run_params(&args)
        }
        Command::Evaluate(args) => {
            span.record("command", "evaluate");
            run_evaluate(&args)
        }
    }
}

pub(super) fn run_init(args: &InitArgs) -> Result<Outcome, CliError> {
    init_pipeline(&args.model_dir)?;
    Ok(Outcome::Initialised {
        model_dir: args.model_dir.clone(),
    })
}

pub(super) fn run_log(args: &LogArgs) -> Result<Outcome, CliError> {
    save_state(&args.model_dir, &args.entries)?;
    Ok(Outcome::Logged {
        columns: args.entries.len(),
    })
}

pub(super) fn run_params(args: &ParamsArgs) -> Result<Outcome, CliError> {
    Ok(Outcome::Params(load_params(&args.model_dir)?))
}

#[instrument(
    name = "cli.evaluate",
    err,
    skip(args),
    fields(true_labels = %args.true_labels.display(), samples = field::Empty),
)]
pub(super) fn run_evaluate(args: &EvaluateArgs) -> Result<Outcome, CliError> {
    let truth = read_labels(&args.true_labels)?;
    let predicted = read_labels(&args.pred_labels)?;
    Span::current().record("samples", truth.len());

    let alignment = clustering_assignment(&truth, &predicted)?;
    let labels = label_agreement(&predicted, &truth)?;
    info!(
        clustering = %alignment.count(),
        labels = %labels,
        "labels scored"
    );
    Ok(Outcome::Evaluation(EvaluationSummary {
        clustering: alignment.count(),
        labels,
        mapping: alignment.mapping().to_vec(),
    }))
}

/// Reads integer labels from `path`, one per line.
///
/// Surrounding whitespace is ignored, as are blank lines.
///
/// # Errors
/// Returns [`CliError::Io`] if the file cannot be read and
/// [`CliError::LabelParse`] for a line that is not an integer.
pub fn read_labels(path: &Path) -> Result<Vec<i64>, CliError> {
    let io_error = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_error)?);
    let mut labels = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(io_error)?;
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        let label = value.parse().map_err(|source| CliError::LabelParse {
            path: path.to_path_buf(),
            line: index + 1,
            value: value.to_owned(),
            source,
        })?;
        labels.push(label);
    }
    Ok(labels)
}

/// Renders `outcome` to `writer`.
///
/// Parameters are printed as indented JSON; scores as `name: ratio (m/t)`
/// lines followed by the tab-separated cluster mapping.
///
/// # Errors
/// Returns [`io::Error`] if writing to `writer` fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use hamachi_cli::cli::{Outcome, render_outcome};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let mut buffer = Vec::new();
/// render_outcome(&Outcome::Logged { columns: 3 }, &mut buffer)?;
/// assert_eq!(String::from_utf8(buffer)?, "appended 3 values\n");
/// # Ok(())
/// # }
/// ```
pub fn render_outcome(outcome: &Outcome, mut writer: impl Write) -> io::Result<()> {
    match outcome {
        Outcome::Initialised { model_dir } => {
            writeln!(writer, "initialised {}", model_dir.display())
        }
        Outcome::Logged { columns } => writeln!(writer, "appended {columns} values"),
        Outcome::Params(params) => {
            serde_json::to_writer_pretty(&mut writer, params)?;
            writeln!(writer)
        }
        Outcome::Evaluation(summary) => render_evaluation(summary, writer),
    }
}

fn render_evaluation(summary: &EvaluationSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "samples: {}", summary.clustering.total())?;
    writeln!(
        writer,
        "clustering accuracy: {} ({})",
        summary.clustering.ratio(),
        summary.clustering
    )?;
    writeln!(
        writer,
        "label accuracy: {} ({})",
        summary.labels.ratio(),
        summary.labels
    )?;
    writeln!(writer, "mapping:")?;
    for (cluster, class) in &summary.mapping {
        writeln!(writer, "{cluster}\t{class}")?;
    }
    Ok(())
}
