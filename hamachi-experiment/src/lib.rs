//! Experiment directory helpers for training pipelines.
//!
//! A training run owns one directory holding its parameters, an append-only
//! CSV loss log, figures, and per-epoch model checkpoints. The free functions
//! take the directory path on every call; [`Experiment`] keeps an open handle
//! for callers making many writes.

mod bootstrap;
mod checkpoint;
mod error;
mod layout;
mod loss_log;
mod params;

pub use crate::{
    bootstrap::{Experiment, ExperimentBuilder, init_pipeline},
    checkpoint::{
        Checkpoint, ParamTensor, StateDict, list_checkpoints, load_ckpt, save_ckpt,
    },
    error::{ExperimentError, ExperimentErrorCode, Result},
    layout::{
        CHECKPOINTS_DIR, ExperimentLayout, FIGURES_DIR, LOSS_LOG_FILE, PARAMS_FILE,
        checkpoint_file_name, parse_checkpoint_epoch,
    },
    loss_log::{
        LOSS_LOG_HEADERS, LossLog, LossRecord, read_loss_log, save_loss_record, save_state,
    },
    params::{Params, load_params, load_params_as, save_params},
};
