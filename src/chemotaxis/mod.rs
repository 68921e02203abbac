//! # PopulationOperator
//!
//! The `PopulationOperator` trait is the seam between the adaptive control loop and
//! the chemotaxis mechanics. The loop decides *when* to move, score and replace;
//! the operator decides *how*. [`ChemotaxisEngine`] is the default operator, scoring
//! alignments with BLOSUM62 and coupling the population through attraction and
//! repulsion energies.
//!
//! Every method may fail. The loop treats a failure in any evaluation step as a
//! recoverable error and reseeds the population.
pub mod engine;

use crate::{alignment::Alignment, error::Result};

pub use engine::{substitution_score, ChemotaxisEngine, GAP_PENALTY};

/// Distances and weights of the cell-to-cell attraction and repulsion terms.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyParams {
    pub attraction_distance: f64,
    pub attraction_weight: f64,
    pub repulsion_distance: f64,
    pub repulsion_weight: f64,
}

/// The components of one slot's fitness.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FitnessBreakdown {
    /// Substitution-matrix score of the alignment.
    pub substitution: f64,
    /// Attraction plus repulsion energy against the rest of the population.
    pub interaction: f64,
    /// Combined fitness; higher is better.
    pub fitness: f64,
}

impl FitnessBreakdown {
    /// A breakdown for a slot scored on its own, without population interaction.
    pub fn standalone(substitution: f64) -> Self {
        Self {
            substitution,
            interaction: 0.0,
            fitness: substitution,
        }
    }
}

/// Moves, scores and maintains a population of alignments.
///
/// Calls are synchronous and happen from a single thread for the lifetime of a
/// run, so implementations keep their per-iteration tables as plain fields.
pub trait PopulationOperator {
    /// Perturbs every alignment by a stochastic step bounded by `step`.
    fn perturb(&mut self, population: &mut [Alignment], step: usize) -> Result<()>;

    /// Re-pads all alignments to a common length.
    fn normalize(&mut self, population: &mut [Alignment]) -> Result<()>;

    /// Scores every alignment against the substitution matrix.
    fn score(&mut self, population: &[Alignment]) -> Result<()>;

    /// Builds the attraction and repulsion tables from the current scores.
    fn build_energy_tables(&mut self, population: &[Alignment], energy: &EnergyParams)
        -> Result<()>;

    /// Combines scores and interaction energies into the fitness table.
    fn combine_fitness(&mut self) -> Result<()>;

    /// The fitness table produced by the last [`combine_fitness`](Self::combine_fitness).
    fn fitness_table(&self) -> &[f64];

    /// Fitness components of one slot, if the slot has been scored.
    fn breakdown(&self, index: usize) -> Option<FitnessBreakdown>;

    /// Overwrites one slot's fitness table entry.
    fn set_fitness(&mut self, index: usize, breakdown: FitnessBreakdown) -> Result<()>;

    /// Evaluations performed since the last [`reset_counters`](Self::reset_counters).
    fn evaluation_count(&self) -> u64;

    /// Returns `(index, fitness)` of the fittest slot.
    fn select_best(&self, cumulative_nfe: u64) -> Result<(usize, f64)>;

    /// Scores a lone alignment, outside of the population tables.
    fn score_single(&mut self, alignment: &Alignment) -> Result<f64>;

    /// Overwrites the least fit slot with a copy of `elite`.
    fn replace_worst(&self, population: &mut [Alignment], elite: &Alignment) -> Result<()>;

    /// Clears per-iteration tables and counters.
    fn reset_counters(&mut self, population_size: usize);
}
