#![allow(dead_code)]

use std::cell::Cell;

use bfoalign::{
    alignment::Alignment,
    chemotaxis::{EnergyParams, FitnessBreakdown, PopulationOperator},
    error::{AlignError, Result},
    sequence::InMemorySource,
};

/// Evaluations a failing iteration performs before its scoring step fails.
pub const EVALUATIONS_BEFORE_FAILURE: u64 = 3;

/// An operator that replays a fixed fitness table per iteration.
///
/// Iterations are counted by `perturb` calls. Iterations listed in `failing`
/// fail in `score` after counting [`EVALUATIONS_BEFORE_FAILURE`] evaluations.
pub struct ScriptedOperator {
    tables: Vec<Vec<f64>>,
    failing: Vec<usize>,
    evaluations_per_iteration: u64,
    single: Option<f64>,
    iteration: Option<usize>,
    table: Vec<f64>,
    evaluations: u64,
    pub replacements: Cell<usize>,
}

impl ScriptedOperator {
    pub fn new(tables: Vec<Vec<f64>>) -> Self {
        Self {
            tables,
            failing: Vec::new(),
            evaluations_per_iteration: 10,
            single: Some(0.0),
            iteration: None,
            table: Vec::new(),
            evaluations: 0,
            replacements: Cell::new(0),
        }
    }

    pub fn failing(mut self, iterations: &[usize]) -> Self {
        self.failing = iterations.to_vec();
        self
    }

    pub fn evaluations_per_iteration(mut self, count: u64) -> Self {
        self.evaluations_per_iteration = count;
        self
    }

    /// What re-scoring a single repaired cell yields; `None` makes it fail.
    pub fn single_score(mut self, score: Option<f64>) -> Self {
        self.single = score;
        self
    }

    fn current(&self) -> usize {
        self.iteration.unwrap_or(0)
    }
}

impl PopulationOperator for ScriptedOperator {
    fn perturb(&mut self, _population: &mut [Alignment], _step: usize) -> Result<()> {
        self.iteration = Some(self.iteration.map_or(0, |i| i + 1));
        Ok(())
    }

    fn normalize(&mut self, _population: &mut [Alignment]) -> Result<()> {
        Ok(())
    }

    fn score(&mut self, _population: &[Alignment]) -> Result<()> {
        if self.failing.contains(&self.current()) {
            self.evaluations += EVALUATIONS_BEFORE_FAILURE;
            return Err(AlignError::Evaluation("scripted failure".to_string()));
        }
        self.evaluations += self.evaluations_per_iteration;
        Ok(())
    }

    fn build_energy_tables(
        &mut self,
        _population: &[Alignment],
        _energy: &EnergyParams,
    ) -> Result<()> {
        Ok(())
    }

    fn combine_fitness(&mut self) -> Result<()> {
        let last = self.tables.len().saturating_sub(1);
        self.table = self
            .tables
            .get(self.current().min(last))
            .cloned()
            .unwrap_or_default();
        Ok(())
    }

    fn fitness_table(&self) -> &[f64] {
        &self.table
    }

    fn breakdown(&self, index: usize) -> Option<FitnessBreakdown> {
        self.table
            .get(index)
            .map(|&f| FitnessBreakdown::standalone(f))
    }

    fn set_fitness(&mut self, index: usize, breakdown: FitnessBreakdown) -> Result<()> {
        let slot = self
            .table
            .get_mut(index)
            .ok_or_else(|| AlignError::Evaluation("out of range".to_string()))?;
        *slot = breakdown.fitness;
        Ok(())
    }

    fn evaluation_count(&self) -> u64 {
        self.evaluations
    }

    fn select_best(&self, _cumulative_nfe: u64) -> Result<(usize, f64)> {
        self.table
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .ok_or(AlignError::EmptyPopulation)
    }

    fn score_single(&mut self, _alignment: &Alignment) -> Result<f64> {
        self.evaluations += 1;
        self.single
            .ok_or_else(|| AlignError::Repair("scripted repair failure".to_string()))
    }

    fn replace_worst(&self, population: &mut [Alignment], elite: &Alignment) -> Result<()> {
        let worst = self
            .table
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .ok_or(AlignError::EmptyPopulation)?;
        population[worst] = elite.clone();
        self.replacements.set(self.replacements.get() + 1);
        Ok(())
    }

    fn reset_counters(&mut self, _population_size: usize) {
        self.table.clear();
        self.evaluations = 0;
    }
}

pub fn source() -> InMemorySource {
    InMemorySource::from_strs(&[("alpha", "MKVLAAG"), ("beta", "MKVLG"), ("gamma", "MKAG")])
}
