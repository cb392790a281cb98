//! Command-line interface for hamachi experiment directories.
//!
//! `init`, `log`, and `params` drive the experiment helpers against a model
//! directory; `evaluate` scores predicted labels against ground truth.

mod commands;

pub use commands::{
    Cli, CliError, Command, EvaluateArgs, EvaluationSummary, InitArgs, LogArgs, Outcome,
    ParamsArgs, read_labels, render_outcome, run_cli,
};

#[cfg(test)]
mod test_helpers;
