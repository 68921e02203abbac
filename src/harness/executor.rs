use std::env;
use std::ffi::{OsStr, OsString};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::Command;

use tracing::warn;

use crate::{
    chemotaxis::PopulationOperator,
    control::{BfoaOptions, OptimizationLoop},
    error::{AlignError, Result},
    sequence::SequenceSource,
};

/// Environment variable carrying the run id to external run commands.
pub const RUN_ID_ENV: &str = "BFOALIGN_RUN_ID";

/// The run id a [`CommandExecutor`] handed to this process, or `0` when the
/// process was not started by a harness.
///
/// # Errors
///
/// Returns `AlignError::Configuration` if the variable is set but is not a run number.
pub fn current_run_id() -> Result<usize> {
    parse_run_id(env::var_os(RUN_ID_ENV).as_deref())
}

fn parse_run_id(value: Option<&OsStr>) -> Result<usize> {
    let Some(value) = value else {
        return Ok(0);
    };
    value
        .to_str()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| {
            AlignError::Configuration(format!(
                "{} must be a run number, got {:?}",
                RUN_ID_ENV, value
            ))
        })
}

/// Executes one isolated optimization run and returns its textual report.
///
/// `None` means the run terminated abnormally and produced no output.
pub trait RunExecutor: Send + Sync {
    fn execute(&self, run_id: usize) -> Option<String>;
}

/// Runs the optimization loop inside the current process.
///
/// Every run gets a fresh operator from `make_operator`, so runs share nothing
/// but the read-only options and sequence source. A panic or an error inside the
/// run counts as an abnormal termination.
pub struct InProcessExecutor<S, F> {
    options: BfoaOptions,
    source: S,
    make_operator: F,
}

impl<S, F> InProcessExecutor<S, F> {
    pub fn new(options: BfoaOptions, source: S, make_operator: F) -> Self {
        Self {
            options,
            source,
            make_operator,
        }
    }

    pub fn options(&self) -> &BfoaOptions {
        &self.options
    }
}

impl<S, F, Op> InProcessExecutor<S, F>
where
    S: SequenceSource,
    F: Fn(usize) -> Op,
    Op: PopulationOperator,
{
    fn run(&self, run_id: usize) -> Result<String> {
        let mut optimizer =
            OptimizationLoop::new(self.options.clone(), (self.make_operator)(run_id))?;
        Ok(optimizer.run(&self.source)?.render())
    }
}

impl<S, F, Op> RunExecutor for InProcessExecutor<S, F>
where
    S: SequenceSource + Send + Sync,
    F: Fn(usize) -> Op + Send + Sync,
    Op: PopulationOperator,
{
    fn execute(&self, run_id: usize) -> Option<String> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(run_id))) {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                warn!(run_id, error = %e, "Run failed");
                None
            }
            Err(_) => {
                warn!(run_id, "Run panicked");
                None
            }
        }
    }
}

/// Runs each optimization as an external process and captures its stdout.
///
/// A spawn failure or a non-zero exit status counts as an abnormal termination.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandExecutor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl RunExecutor for CommandExecutor {
    fn execute(&self, run_id: usize) -> Option<String> {
        let output = match Command::new(&self.program)
            .args(&self.args)
            .env(RUN_ID_ENV, run_id.to_string())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!(run_id, program = %self.program.display(), error = %e, "Could not start run");
                return None;
            }
        };

        if !output.status.success() {
            warn!(run_id, status = %output.status, "Run terminated abnormally");
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
