//! # Anomaly correction
//!
//! A fitness above the anomaly threshold is a computation defect, not an optimum.
//! The corrector walks the flagged slot through a small state machine:
//!
//! ```text
//! Normal -> Anomalous -> Corrected   (repair re-scored below the threshold)
//!                     \-> Discarded  (repair failed or errored)
//! ```
//!
//! A corrected slot carries its re-scored fitness; a discarded slot holds the
//! placeholder alignment and a fitness of exactly zero.

use tracing::{debug, info, warn};

use crate::{
    alignment::Alignment,
    chemotaxis::{EnergyParams, FitnessBreakdown, PopulationOperator},
    control::elite::EliteTracker,
    error::{AlignError, OptionExt, Result},
    sequence::SequenceSet,
};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyState {
    Normal,
    Anomalous,
    Corrected,
    Discarded,
}

/// Terminal outcome of one correction attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Either `Corrected` or `Discarded`.
    pub state: AnomalyState,
    pub breakdown: FitnessBreakdown,
}

impl Correction {
    pub fn fitness(&self) -> f64 {
        self.breakdown.fitness
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnomalyCorrector {
    threshold: f64,
}

impl AnomalyCorrector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classifies a fitness value. Non-finite values are anomalous.
    pub fn assess(&self, fitness: f64) -> AnomalyState {
        if fitness.is_finite() && fitness <= self.threshold {
            AnomalyState::Normal
        } else {
            AnomalyState::Anomalous
        }
    }

    /// Repairs the anomalous slot `index`, or discards its content if repair fails.
    ///
    /// On success the full fitness table is recomputed and the slot's entry is pinned
    /// to the re-scored value. On failure the slot is overwritten with the placeholder
    /// alignment and its entry pinned to zero.
    pub fn correct<Op>(
        &self,
        operator: &mut Op,
        population: &mut [Alignment],
        index: usize,
        sequences: &SequenceSet,
        elite: &EliteTracker,
        energy: &EnergyParams,
    ) -> Correction
    where
        Op: PopulationOperator + ?Sized,
    {
        match self.repair(operator, population, index, sequences, elite, energy) {
            Ok(breakdown) => {
                info!(cell = index, fitness = breakdown.fitness, "Correction succeeded");
                Correction {
                    state: AnomalyState::Corrected,
                    breakdown,
                }
            }
            Err(e) => {
                warn!(cell = index, error = %e, "Correction failed, discarding cell");
                if let Some(slot) = population.get_mut(index) {
                    *slot = Alignment::placeholder(sequences.len());
                }
                let zero = FitnessBreakdown::default();
                if let Err(e) = operator.set_fitness(index, zero) {
                    debug!(cell = index, error = %e, "Could not zero the fitness entry");
                }
                Correction {
                    state: AnomalyState::Discarded,
                    breakdown: zero,
                }
            }
        }
    }

    /// Without a valid elite the slot is rebuilt from the whole input set, so the
    /// repaired alignment keeps one row per input sequence.
    fn repair<Op>(
        &self,
        operator: &mut Op,
        population: &mut [Alignment],
        index: usize,
        sequences: &SequenceSet,
        elite: &EliteTracker,
        energy: &EnergyParams,
    ) -> Result<FitnessBreakdown>
    where
        Op: PopulationOperator + ?Sized,
    {
        let backup = match elite.alignment() {
            Some(alignment) if elite.has_valid_elite() => alignment.clone(),
            _ => Alignment::from_sequences(sequences.sequences()),
        };

        let slot = population.get_mut(index).ok_or_else_align(|| {
            AlignError::Repair(format!("Cell {} is outside the population", index))
        })?;
        *slot = backup;

        let fitness = operator.score_single(slot)?;
        if self.assess(fitness) != AnomalyState::Normal {
            return Err(AlignError::Repair(format!(
                "Corrected fitness {} is still anomalous",
                fitness
            )));
        }

        operator.score(population)?;
        operator.build_energy_tables(population, energy)?;
        operator.combine_fitness()?;

        let breakdown = FitnessBreakdown::standalone(fitness);
        operator.set_fitness(index, breakdown)?;
        Ok(breakdown)
    }
}
