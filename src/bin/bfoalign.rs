// Command-line entry point: a single optimization run, or a parallel experiment.
use std::ffi::OsString;
use std::path::PathBuf;

use bfoalign::{
    chemotaxis::ChemotaxisEngine,
    control::{BfoaOptions, OptimizationLoop},
    harness::{
        current_run_id, CommandExecutor, ExperimentHarness, ExperimentOptions, ExperimentReport,
        InProcessExecutor, ParameterManifest, RunExecutor,
    },
    sequence::FastaSource,
    Result, ResultExt,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one optimization and print its report to stdout
    Run(RunArgs),
    /// Repeat the optimization in parallel and write the results as CSV
    Experiment(ExperimentArgs),
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// FASTA file with the sequences to align
    #[arg(long)]
    fasta: PathBuf,

    #[arg(long, default_value_t = 6)]
    bacteria: usize,

    #[arg(long, default_value_t = 5)]
    iterations: usize,

    /// Initial tumble size (gaps inserted per cell)
    #[arg(long, default_value_t = 300.0)]
    initial_step: f64,

    #[arg(long, default_value_t = 5.0)]
    step_floor: f64,

    /// Best fitness above which the step is damped
    #[arg(long, default_value_t = 500.0)]
    damping_threshold: f64,

    #[arg(long, default_value_t = 0.15)]
    attraction_distance: f64,

    #[arg(long, default_value_t = 0.005)]
    attraction_weight: f64,

    #[arg(long, default_value_t = 0.15)]
    repulsion_distance: f64,

    #[arg(long, default_value_t = 0.003)]
    repulsion_weight: f64,

    /// Fitness values above this are treated as anomalies
    #[arg(long, default_value_t = 100.0)]
    anomaly_threshold: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    fn options(&self) -> BfoaOptions {
        BfoaOptions::builder()
            .num_bacteria(self.bacteria)
            .num_iterations(self.iterations)
            .initial_step(self.initial_step)
            .step_floor(self.step_floor)
            .damping_threshold(self.damping_threshold)
            .attraction(self.attraction_distance, self.attraction_weight)
            .repulsion(self.repulsion_distance, self.repulsion_weight)
            .anomaly_threshold(self.anomaly_threshold)
            .build()
    }

    /// Arguments that reproduce these settings for a `run` child process.
    fn forwarded(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "run".into(),
            "--fasta".into(),
            self.fasta.clone().into_os_string(),
        ];
        args.extend(
            [
                format!("--bacteria={}", self.bacteria),
                format!("--iterations={}", self.iterations),
                format!("--initial-step={}", self.initial_step),
                format!("--step-floor={}", self.step_floor),
                format!("--damping-threshold={}", self.damping_threshold),
                format!("--attraction-distance={}", self.attraction_distance),
                format!("--attraction-weight={}", self.attraction_weight),
                format!("--repulsion-distance={}", self.repulsion_distance),
                format!("--repulsion-weight={}", self.repulsion_weight),
                format!("--anomaly-threshold={}", self.anomaly_threshold),
            ]
            .map(OsString::from),
        );
        if let Some(seed) = self.seed {
            args.push(format!("--seed={}", seed).into());
        }
        args
    }
}

#[derive(Args, Debug)]
struct ExperimentArgs {
    #[command(flatten)]
    run: RunArgs,

    #[arg(long, default_value_t = 30)]
    runs: usize,

    /// Number of runs executed at the same time
    #[arg(long, default_value_t = 3)]
    concurrency: usize,

    /// Directory receiving results.csv and parameters.csv
    #[arg(long, default_value = "experiment")]
    out: PathBuf,

    /// Run each optimization as a separate process instead of a worker thread
    #[arg(long)]
    processes: bool,
}

fn engine_for(seed: Option<u64>, run_id: usize) -> ChemotaxisEngine {
    match seed {
        Some(seed) => ChemotaxisEngine::with_seed(seed.wrapping_add(run_id as u64)),
        None => ChemotaxisEngine::default(),
    }
}

/// A child started by `experiment --processes` seeds its engine with its own run id.
fn run_single(args: &RunArgs) -> Result<()> {
    let run_id = current_run_id()?;
    let mut optimizer = OptimizationLoop::new(args.options(), engine_for(args.seed, run_id))?;
    let report = optimizer.run(&FastaSource::new(&args.fasta))?;
    print!("{}", report);
    Ok(())
}

fn run_harness<E: RunExecutor>(
    executor: E,
    parameters: ParameterManifest,
    options: &ExperimentOptions,
) -> Result<ExperimentReport> {
    ExperimentHarness::new(executor, parameters).run(options)
}

fn run_experiment(args: &ExperimentArgs) -> Result<()> {
    let options = args.run.options();
    options.validate()?;
    let experiment = ExperimentOptions::new(args.runs, args.concurrency);
    let parameters = ParameterManifest::from(&options);

    let report = if args.processes {
        let program = std::env::current_exe().context("Failed to locate the bfoalign binary")?;
        let executor = CommandExecutor::new(program).args(args.run.forwarded());
        run_harness(executor, parameters, &experiment)?
    } else {
        let seed = args.run.seed;
        let executor = InProcessExecutor::new(
            options,
            FastaSource::new(&args.run.fasta),
            move |run_id| engine_for(seed, run_id),
        );
        run_harness(executor, parameters, &experiment)?
    };

    let (results, parameters) = report.write_csv(&args.out)?;
    println!("Wrote {} and {}", results.display(), parameters.display());
    println!(
        "{:<16} {:>6} {:>14} {:>14} {:>14} {:>14}",
        "column", "count", "mean", "std", "min", "max"
    );
    let show = |v: Option<f64>| {
        v.map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "-".to_string())
    };
    for summary in report.summary() {
        println!(
            "{:<16} {:>6} {:>14} {:>14} {:>14} {:>14}",
            summary.column,
            summary.count,
            show(summary.mean),
            show(summary.std),
            show(summary.min),
            show(summary.max)
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Run(args) => run_single(args),
        Command::Experiment(args) => run_experiment(args),
    }
}
