use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use super::executor::RunExecutor;
use crate::{
    control::BfoaOptions,
    error::{AlignError, Result},
    report::{self, ReportFields},
};

pub const DEFAULT_TOTAL_RUNS: usize = 30;
pub const DEFAULT_CONCURRENCY: usize = 3;

pub const RESULTS_FILE: &str = "results.csv";
pub const PARAMETERS_FILE: &str = "parameters.csv";

/// Column order of the results table.
pub const RESULT_COLUMNS: [&str; 7] = [
    "run",
    "fitness",
    "blosum_score",
    "interaction",
    "nfe",
    "elapsed_seconds",
    "timestamp",
];

/// Column order of the parameters table.
pub const PARAMETER_COLUMNS: [&str; 8] = [
    "bacteria",
    "iterations",
    "initial_step",
    "step_floor",
    "attraction_distance",
    "attraction_weight",
    "repulsion_distance",
    "repulsion_weight",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentOptions {
    total_runs: usize,
    concurrency: usize,
}

impl ExperimentOptions {
    pub fn new(total_runs: usize, concurrency: usize) -> Self {
        Self {
            total_runs,
            concurrency,
        }
    }

    pub fn get_total_runs(&self) -> usize {
        self.total_runs
    }

    pub fn get_concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_runs == 0 {
            return Err(AlignError::Configuration(
                "Total runs cannot be zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(AlignError::Configuration(
                "Concurrency cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ExperimentOptions {
    fn default() -> Self {
        Self {
            total_runs: DEFAULT_TOTAL_RUNS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Structured summary of one run, recovered from its textual report.
///
/// Every field a run did not report is `None`; an abnormally terminated run has
/// all fields missing but keeps its id.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub run_id: usize,
    pub fitness: Option<f64>,
    pub blosum_score: Option<f64>,
    pub interaction: Option<f64>,
    pub nfe: Option<u64>,
    pub elapsed_seconds: Option<f64>,
    pub timestamp: NaiveDateTime,
}

impl RunResult {
    pub fn from_fields(run_id: usize, fields: ReportFields, timestamp: NaiveDateTime) -> Self {
        Self {
            run_id,
            fitness: fields.fitness,
            blosum_score: fields.blosum_score,
            interaction: fields.interaction,
            nfe: fields.nfe,
            elapsed_seconds: fields.elapsed_seconds,
            timestamp,
        }
    }

    /// Whether no field at all was recovered.
    pub fn is_missing(&self) -> bool {
        self.fitness.is_none()
            && self.blosum_score.is_none()
            && self.interaction.is_none()
            && self.nfe.is_none()
            && self.elapsed_seconds.is_none()
    }

    /// The row in [`RESULT_COLUMNS`] order; missing values are empty cells.
    pub fn to_row(&self) -> Vec<String> {
        fn cell<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }
        vec![
            self.run_id.to_string(),
            cell(self.fitness),
            cell(self.blosum_score),
            cell(self.interaction),
            cell(self.nfe),
            cell(self.elapsed_seconds),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }
}

/// The parameters every run of an experiment was configured with.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterManifest {
    pub bacteria: usize,
    pub iterations: usize,
    pub initial_step: f64,
    pub step_floor: f64,
    pub attraction_distance: f64,
    pub attraction_weight: f64,
    pub repulsion_distance: f64,
    pub repulsion_weight: f64,
}

impl ParameterManifest {
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.bacteria.to_string(),
            self.iterations.to_string(),
            self.initial_step.to_string(),
            self.step_floor.to_string(),
            self.attraction_distance.to_string(),
            self.attraction_weight.to_string(),
            self.repulsion_distance.to_string(),
            self.repulsion_weight.to_string(),
        ]
    }
}

impl From<&BfoaOptions> for ParameterManifest {
    fn from(options: &BfoaOptions) -> Self {
        let energy = options.get_energy();
        Self {
            bacteria: options.get_num_bacteria(),
            iterations: options.get_num_iterations(),
            initial_step: options.get_initial_step(),
            step_floor: options.get_step_floor(),
            attraction_distance: energy.attraction_distance,
            attraction_weight: energy.attraction_weight,
            repulsion_distance: energy.repulsion_distance,
            repulsion_weight: energy.repulsion_weight,
        }
    }
}

/// Descriptive statistics of one numeric column over its present values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; needs two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    fn of(column: &'static str, values: &[f64]) -> Self {
        let count = values.len();
        let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|mean| {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        });
        Self {
            column,
            count,
            mean,
            std,
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
        }
    }
}

/// All run results of an experiment plus the parameters they ran with.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentReport {
    pub results: Vec<RunResult>,
    pub parameters: ParameterManifest,
}

impl ExperimentReport {
    pub fn results_table(&self) -> Vec<Vec<String>> {
        self.results.iter().map(RunResult::to_row).collect()
    }

    /// Always exactly one row.
    pub fn parameters_table(&self) -> Vec<Vec<String>> {
        vec![self.parameters.to_row()]
    }

    /// Summaries of fitness, BLOSUM score and elapsed time.
    pub fn summary(&self) -> Vec<ColumnSummary> {
        let collect = |f: fn(&RunResult) -> Option<f64>| -> Vec<f64> {
            self.results.iter().filter_map(f).collect()
        };
        vec![
            ColumnSummary::of("fitness", &collect(|r| r.fitness)),
            ColumnSummary::of("blosum_score", &collect(|r| r.blosum_score)),
            ColumnSummary::of("elapsed_seconds", &collect(|r| r.elapsed_seconds)),
        ]
    }

    /// Writes `results.csv` and `parameters.csv` into `dir`, creating it if needed.
    pub fn write_csv(&self, dir: impl AsRef<Path>) -> Result<(PathBuf, PathBuf)> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let results_path = dir.join(RESULTS_FILE);
        let mut writer = csv::Writer::from_path(&results_path)?;
        writer.write_record(RESULT_COLUMNS)?;
        for row in self.results_table() {
            writer.write_record(&row)?;
        }
        writer.flush()?;

        let parameters_path = dir.join(PARAMETERS_FILE);
        let mut writer = csv::Writer::from_path(&parameters_path)?;
        writer.write_record(PARAMETER_COLUMNS)?;
        for row in self.parameters_table() {
            writer.write_record(&row)?;
        }
        writer.flush()?;

        Ok((results_path, parameters_path))
    }
}

/// Fans independent runs out over a bounded worker pool and collects their
/// reports in submission order.
pub struct ExperimentHarness<E> {
    executor: E,
    parameters: ParameterManifest,
}

impl<E> ExperimentHarness<E>
where
    E: RunExecutor,
{
    pub fn new(executor: E, parameters: ParameterManifest) -> Self {
        Self {
            executor,
            parameters,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn run(&self, options: &ExperimentOptions) -> Result<ExperimentReport> {
        self.run_experiment(options.get_total_runs(), options.get_concurrency())
    }

    /// Runs `total_runs` runs on `concurrency` workers and waits for all of them.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::Configuration` for zero runs or zero concurrency and
    /// `AlignError::Harness` if the worker pool cannot be built. Failed runs are
    /// not errors; they show up as rows with missing fields.
    pub fn run_experiment(&self, total_runs: usize, concurrency: usize) -> Result<ExperimentReport> {
        ExperimentOptions::new(total_runs, concurrency).validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("bfoalign-worker-{}", i))
            .build()
            .map_err(|e| AlignError::Harness(format!("Failed to build worker pool: {}", e)))?;

        info!(total_runs, concurrency, "Starting experiment");
        let results: Vec<RunResult> = pool.install(|| {
            (1..=total_runs)
                .into_par_iter()
                .map(|run_id| self.run_one(run_id))
                .collect()
        });

        let failed = results.iter().filter(|r| r.is_missing()).count();
        info!(total_runs, failed, "Experiment finished");

        Ok(ExperimentReport {
            results,
            parameters: self.parameters.clone(),
        })
    }

    fn run_one(&self, run_id: usize) -> RunResult {
        let _span = info_span!("run", run_id).entered();
        info!("Run started");

        let fields = match self.executor.execute(run_id) {
            Some(text) => {
                let parsed = report::parse(&text);
                if parsed.version.is_some_and(|v| v != report::REPORT_VERSION) {
                    warn!(version = ?parsed.version, "Unexpected report version");
                }
                parsed.fields
            }
            None => ReportFields::default(),
        };

        let result = RunResult::from_fields(run_id, fields, Local::now().naive_local());
        info!(fitness = ?result.fitness, "Run completed");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-03-01 12:00:00", TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn test_run_result_row_keeps_missing_cells_empty() {
        let fields = ReportFields {
            fitness: Some(1.5),
            nfe: Some(10),
            ..ReportFields::default()
        };
        let row = RunResult::from_fields(4, fields, timestamp()).to_row();
        assert_eq!(
            row,
            vec!["4", "1.5", "", "", "10", "", "2024-03-01 12:00:00"]
        );
    }

    #[test]
    fn test_summary_ignores_missing_values() {
        let results = [Some(1.0), None, Some(3.0)]
            .iter()
            .enumerate()
            .map(|(i, fitness)| {
                let fields = ReportFields {
                    fitness: *fitness,
                    ..ReportFields::default()
                };
                RunResult::from_fields(i + 1, fields, timestamp())
            })
            .collect();
        let report = ExperimentReport {
            results,
            parameters: ParameterManifest::from(&BfoaOptions::default()),
        };

        let summary = report.summary();
        assert_eq!(summary[0].column, "fitness");
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].mean, Some(2.0));
        assert_eq!(summary[0].min, Some(1.0));
        assert_eq!(summary[0].max, Some(3.0));
        assert!((summary[0].std.unwrap() - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary[1].count, 0);
        assert_eq!(summary[1].mean, None);
    }

    #[test]
    fn test_experiment_options_validation() {
        assert!(ExperimentOptions::default().validate().is_ok());
        assert!(ExperimentOptions::new(0, 2).validate().is_err());
        assert!(ExperimentOptions::new(5, 0).validate().is_err());
    }

    #[test]
    fn test_parameter_manifest_from_options() {
        let manifest = ParameterManifest::from(&BfoaOptions::default());
        assert_eq!(manifest.bacteria, 6);
        assert_eq!(manifest.iterations, 5);
        assert_eq!(manifest.to_row().len(), PARAMETER_COLUMNS.len());
    }
}
