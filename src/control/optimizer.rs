use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{
    anomaly::{AnomalyCorrector, AnomalyState},
    elite::{EliteCandidate, EliteRecord, EliteTracker},
    options::BfoaOptions,
    scheduler::StepScheduler,
};
use crate::{
    alignment::{seed_population, Population},
    chemotaxis::{FitnessBreakdown, PopulationOperator},
    error::{AlignError, Result},
    report::{self, ReportFields},
    sequence::{SequenceSet, SequenceSource},
};

/// What happened in one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationOutcome {
    /// An evaluation step failed and the population was reseeded.
    Reset,
    /// The population was scored and the best cell went through the anomaly check.
    Scored {
        best_index: usize,
        /// Fitness reported by the operator's best selection.
        best_fitness: f64,
        /// `Normal`, `Corrected` or `Discarded`.
        state: AnomalyState,
        /// Fitness carried forward: the best fitness, the corrected value, or zero.
        working_fitness: f64,
        elite_updated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    pub step: usize,
    pub outcome: IterationOutcome,
    /// Elite fitness after the iteration, negative infinity while there is none.
    pub elite_fitness: f64,
    /// Cumulative evaluation count after the iteration.
    pub nfe: u64,
}

/// Summary of one completed optimization run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub elite: Option<EliteRecord>,
    pub sequences: SequenceSet,
    pub elapsed: Duration,
    pub nfe: u64,
    pub resets: usize,
    pub corrections: usize,
    pub discards: usize,
    pub history: Vec<IterationRecord>,
}

impl RunReport {
    pub fn has_solution(&self) -> bool {
        self.elite.is_some()
    }

    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// The labelled fields the harness reads back.
    pub fn fields(&self) -> ReportFields {
        ReportFields {
            fitness: self.elite.as_ref().map(|e| e.fitness),
            blosum_score: self.elite.as_ref().map(|e| e.breakdown.substitution),
            interaction: self.elite.as_ref().map(|e| e.breakdown.interaction),
            nfe: Some(self.nfe),
            elapsed_seconds: Some(self.elapsed.as_secs_f64()),
        }
    }

    /// Renders the versioned textual report.
    pub fn render(&self) -> String {
        let mut body = vec![
            format!("Iterations: {}", self.iterations()),
            format!("Resets: {}", self.resets),
            format!("Corrections: {}", self.corrections),
            format!("Discards: {}", self.discards),
        ];
        if let Some(elite) = &self.elite {
            body.push(format!("Best alignment (cell {}):", elite.index));
            body.push(elite.alignment.render_with_names(&self.sequences));
        }
        report::render(&self.fields(), &body)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

struct RunState<'a> {
    sequences: &'a SequenceSet,
    population: Population,
    elite: EliteTracker,
    nfe: u64,
    resets: usize,
    corrections: usize,
    discards: usize,
}

/// Drives one optimization run: step scheduling, operator invocation, anomaly
/// handling, elitism and population resets.
///
/// A run is strictly sequential and owns its population; independent runs are
/// parallelised by the experiment harness, never inside a run.
pub struct OptimizationLoop<Op> {
    options: BfoaOptions,
    operator: Op,
    scheduler: StepScheduler,
    corrector: AnomalyCorrector,
}

impl<Op> OptimizationLoop<Op>
where
    Op: PopulationOperator,
{
    /// Creates a new loop after validating `options`.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::Configuration` if the options are invalid.
    pub fn new(options: BfoaOptions, operator: Op) -> Result<Self> {
        options.validate()?;
        let scheduler =
            StepScheduler::new(options.get_step_floor(), options.get_damping_threshold());
        let corrector = AnomalyCorrector::new(options.get_anomaly_threshold());
        Ok(Self {
            options,
            operator,
            scheduler,
            corrector,
        })
    }

    pub fn options(&self) -> &BfoaOptions {
        &self.options
    }

    pub fn operator(&self) -> &Op {
        &self.operator
    }

    /// Loads the sequences once and runs the optimization on them.
    pub fn run<S>(&mut self, source: &S) -> Result<RunReport>
    where
        S: SequenceSource + ?Sized,
    {
        let sequences = source.load()?;
        self.run_with_sequences(sequences)
    }

    /// Runs the configured number of iterations.
    ///
    /// Evaluation failures, anomalies and failed repairs are all recovered inside
    /// the run; the only errors are empty inputs.
    pub fn run_with_sequences(&mut self, sequences: SequenceSet) -> Result<RunReport> {
        if sequences.is_empty() {
            return Err(AlignError::SequenceSource(
                "Cannot align an empty sequence set".to_string(),
            ));
        }

        let start = Instant::now();
        let size = self.options.get_num_bacteria();
        let total = self.options.get_num_iterations();
        info!(
            sequences = sequences.len(),
            bacteria = size,
            iterations = total,
            "Starting run"
        );

        let mut state = RunState {
            sequences: &sequences,
            population: seed_population(&sequences, size),
            elite: EliteTracker::new(self.options.get_anomaly_threshold()),
            nfe: 0,
            resets: 0,
            corrections: 0,
            discards: 0,
        };
        let mut history = Vec::with_capacity(total);

        self.operator.reset_counters(size);
        for iteration in 0..total {
            let record = self.iterate(iteration, &mut state);
            debug!(?record, "Iteration finished");
            history.push(record);
            self.operator.reset_counters(size);
        }

        let elite = state.elite.into_record();
        match &elite {
            Some(e) => info!(fitness = e.fitness, nfe = state.nfe, "Best fitness"),
            None => warn!(nfe = state.nfe, "{}", report::NO_SOLUTION),
        }

        Ok(RunReport {
            elite,
            sequences: sequences.clone(),
            elapsed: start.elapsed(),
            nfe: state.nfe,
            resets: state.resets,
            corrections: state.corrections,
            discards: state.discards,
            history,
        })
    }

    fn evaluate(&mut self, population: &mut Population, step: usize) -> Result<()> {
        self.operator.perturb(population, step)?;
        self.operator.normalize(population)?;
        self.operator.score(population)?;
        self.operator
            .build_energy_tables(population, self.options.get_energy())?;
        self.operator.combine_fitness()?;
        Ok(())
    }

    fn reseed(&mut self, state: &mut RunState<'_>) {
        state.nfe += self.operator.evaluation_count();
        state.population = seed_population(state.sequences, self.options.get_num_bacteria());
        state.resets += 1;
    }

    fn iterate(&mut self, iteration: usize, state: &mut RunState<'_>) -> IterationRecord {
        let total = self.options.get_num_iterations();
        let current_best = if state.elite.is_empty() {
            0.0
        } else {
            state.elite.fitness()
        };
        let step = self.scheduler.compute_step(
            iteration,
            total,
            self.options.get_initial_step(),
            current_best,
        ) as usize;
        info!(iteration = iteration + 1, total, step, "Iteration");

        let record = |outcome, state: &RunState<'_>| IterationRecord {
            iteration,
            step,
            outcome,
            elite_fitness: state.elite.fitness(),
            nfe: state.nfe,
        };

        if let Err(e) = self.evaluate(&mut state.population, step) {
            warn!(iteration = iteration + 1, error = %e, "Evaluation failed, reseeding population");
            self.reseed(state);
            return record(IterationOutcome::Reset, state);
        }

        state.nfe += self.operator.evaluation_count();
        let (best_index, best_fitness) = match self.operator.select_best(state.nfe) {
            Ok(best) => best,
            Err(e) => {
                warn!(iteration = iteration + 1, error = %e, "Best selection failed, reseeding population");
                // Evaluations of this iteration are already counted.
                state.population =
                    seed_population(state.sequences, self.options.get_num_bacteria());
                state.resets += 1;
                return record(IterationOutcome::Reset, state);
            }
        };

        let (anomaly_state, breakdown) = match self.corrector.assess(best_fitness) {
            AnomalyState::Normal => {
                let breakdown = self
                    .operator
                    .breakdown(best_index)
                    .map(|b| FitnessBreakdown {
                        fitness: best_fitness,
                        ..b
                    })
                    .unwrap_or_else(|| FitnessBreakdown::standalone(best_fitness));
                (AnomalyState::Normal, breakdown)
            }
            _ => {
                warn!(cell = best_index, fitness = best_fitness, "Anomaly detected");
                let correction = self.corrector.correct(
                    &mut self.operator,
                    &mut state.population,
                    best_index,
                    state.sequences,
                    &state.elite,
                    self.options.get_energy(),
                );
                match correction.state {
                    AnomalyState::Corrected => state.corrections += 1,
                    _ => state.discards += 1,
                }
                (correction.state, correction.breakdown)
            }
        };

        // A discarded cell is not credited this iteration.
        let elite_updated = anomaly_state != AnomalyState::Discarded
            && state.population.get(best_index).is_some_and(|alignment| {
                state.elite.consider(EliteCandidate {
                    index: best_index,
                    breakdown,
                    alignment,
                })
            });
        if elite_updated {
            info!(cell = best_index, fitness = breakdown.fitness, "New elite");
        }

        if let Some(elite) = state.elite.alignment() {
            if let Err(e) = self.operator.replace_worst(&mut state.population, elite) {
                warn!(error = %e, "Could not replace the worst cell");
            }
        }

        record(
            IterationOutcome::Scored {
                best_index,
                best_fitness,
                state: anomaly_state,
                working_fitness: breakdown.fitness,
                elite_updated,
            },
            state,
        )
    }
}
