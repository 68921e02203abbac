//! # Experiment harness
//!
//! The harness repeats whole optimization runs to gather statistics. Runs are
//! independent units of work: they are spread over a bounded worker pool, each
//! run's textual report is parsed back into a [`RunResult`], and the results are
//! assembled in submission order into an [`ExperimentReport`] once every run has
//! finished.
pub mod executor;
pub mod experiment;

pub use executor::{
    current_run_id, CommandExecutor, InProcessExecutor, RunExecutor, RUN_ID_ENV,
};
pub use experiment::{
    ColumnSummary, ExperimentHarness, ExperimentOptions, ExperimentReport, ParameterManifest,
    RunResult, PARAMETER_COLUMNS, RESULT_COLUMNS,
};
