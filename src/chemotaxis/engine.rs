use bio::scores::blosum62;
use tracing::debug;

use super::{EnergyParams, FitnessBreakdown, PopulationOperator};
use crate::{
    alignment::{Alignment, GAP},
    error::{AlignError, OptionExt, Result},
    rng::RandomNumberGenerator,
};

/// Score of a residue aligned against a gap.
pub const GAP_PENALTY: f64 = -4.0;

/// The default chemotaxis operator.
///
/// Tumbling inserts gaps at random positions, squaring pads rows to a common
/// width, and fitness is the BLOSUM62 sum-of-pairs score plus the interaction
/// energy between cells.
#[derive(Clone)]
pub struct ChemotaxisEngine {
    rng: RandomNumberGenerator,
    substitution: Vec<f64>,
    attraction: Vec<f64>,
    repulsion: Vec<f64>,
    interaction: Vec<f64>,
    fitness: Vec<f64>,
    evaluations: u64,
}

impl ChemotaxisEngine {
    pub fn new(rng: RandomNumberGenerator) -> Self {
        Self {
            rng,
            substitution: Vec::new(),
            attraction: Vec::new(),
            repulsion: Vec::new(),
            interaction: Vec::new(),
            fitness: Vec::new(),
            evaluations: 0,
        }
    }

    /// Creates an engine with a reproducible random stream.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(RandomNumberGenerator::from_seed(seed))
    }

    pub fn substitution_table(&self) -> &[f64] {
        &self.substitution
    }

    pub fn interaction_table(&self) -> &[f64] {
        &self.interaction
    }

    /// Sums `distance * exp(weight * (S_i - S_j)^2)` over every other cell `j`.
    fn cell_interaction(&mut self, index: usize, distance: f64, weight: f64) -> f64 {
        let own = self.substitution[index];
        let mut total = 0.0;
        for (j, &other) in self.substitution.iter().enumerate() {
            if j == index {
                continue;
            }
            let diff = (own - other).powi(2);
            total += distance * (weight * diff).exp();
            self.evaluations += 1;
        }
        total
    }

    fn worst_index(&self) -> Option<usize> {
        self.fitness
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                // NaN counts as the worst value.
                match (a.is_nan(), b.is_nan()) {
                    (true, true) => std::cmp::Ordering::Equal,
                    (true, false) => std::cmp::Ordering::Less,
                    (false, true) => std::cmp::Ordering::Greater,
                    (false, false) => a.total_cmp(b),
                }
            })
            .map(|(i, _)| i)
    }
}

impl Default for ChemotaxisEngine {
    fn default() -> Self {
        Self::new(RandomNumberGenerator::new())
    }
}

fn matrix_symbol(symbol: u8) -> u8 {
    let symbol = symbol.to_ascii_uppercase();
    if symbol.is_ascii_uppercase() || symbol == b'*' {
        symbol
    } else {
        b'X'
    }
}

/// BLOSUM62 sum-of-pairs score of an alignment.
///
/// Residue pairs use the matrix, a residue against a gap scores [`GAP_PENALTY`],
/// two gaps score zero.
pub fn substitution_score(alignment: &Alignment) -> f64 {
    let mut score = 0.0;
    for column in alignment.columns() {
        for (i, &a) in column.iter().enumerate() {
            for &b in &column[i + 1..] {
                score += match (a == GAP, b == GAP) {
                    (true, true) => 0.0,
                    (true, false) | (false, true) => GAP_PENALTY,
                    (false, false) => blosum62(matrix_symbol(a), matrix_symbol(b)) as f64,
                };
            }
        }
    }
    score
}

impl PopulationOperator for ChemotaxisEngine {
    fn perturb(&mut self, population: &mut [Alignment], step: usize) -> Result<()> {
        for alignment in population.iter_mut() {
            let rows = alignment.num_rows();
            if rows == 0 {
                return Err(AlignError::Evaluation(
                    "Cannot tumble an alignment without rows".to_string(),
                ));
            }
            for _ in 0..step {
                let row = self.rng.gen_index(rows);
                let pos = self.rng.gen_insertion_point(alignment.rows()[row].len());
                alignment.insert_gap(row, pos);
            }
        }
        Ok(())
    }

    fn normalize(&mut self, population: &mut [Alignment]) -> Result<()> {
        let width = population.iter().map(Alignment::width).max().unwrap_or(0);
        for alignment in population.iter_mut() {
            alignment.pad_to(width);
            alignment.strip_gap_columns();
        }
        // Stripping can shorten alignments unevenly.
        let width = population.iter().map(Alignment::width).max().unwrap_or(0);
        for alignment in population.iter_mut() {
            alignment.pad_to(width);
        }
        Ok(())
    }

    fn score(&mut self, population: &[Alignment]) -> Result<()> {
        if population.is_empty() {
            return Err(AlignError::EmptyPopulation);
        }
        self.substitution = population.iter().map(substitution_score).collect();
        self.evaluations += population.len() as u64;
        Ok(())
    }

    fn build_energy_tables(
        &mut self,
        population: &[Alignment],
        energy: &EnergyParams,
    ) -> Result<()> {
        if self.substitution.len() != population.len() {
            return Err(AlignError::Evaluation(format!(
                "Substitution table holds {} scores for {} cells",
                self.substitution.len(),
                population.len()
            )));
        }

        let n = population.len();
        let attraction: Vec<f64> = (0..n)
            .map(|i| {
                self.cell_interaction(i, -energy.attraction_distance, -energy.attraction_weight)
            })
            .collect();
        let repulsion: Vec<f64> = (0..n)
            .map(|i| self.cell_interaction(i, energy.repulsion_distance, -energy.repulsion_weight))
            .collect();
        self.attraction = attraction;
        self.repulsion = repulsion;
        self.interaction = self
            .attraction
            .iter()
            .zip(&self.repulsion)
            .map(|(a, r)| a + r)
            .collect();
        Ok(())
    }

    fn combine_fitness(&mut self) -> Result<()> {
        if self.interaction.len() != self.substitution.len() {
            return Err(AlignError::Evaluation(
                "Interaction table does not match the substitution table".to_string(),
            ));
        }
        let fitness: Vec<f64> = self
            .substitution
            .iter()
            .zip(&self.interaction)
            .map(|(s, i)| s + i)
            .collect();
        if let Some(pos) = fitness.iter().position(|f| f.is_nan()) {
            return Err(AlignError::InvalidNumericValue(format!(
                "Fitness of cell {} is NaN",
                pos
            )));
        }
        self.fitness = fitness;
        Ok(())
    }

    fn fitness_table(&self) -> &[f64] {
        &self.fitness
    }

    fn breakdown(&self, index: usize) -> Option<FitnessBreakdown> {
        Some(FitnessBreakdown {
            substitution: *self.substitution.get(index)?,
            interaction: *self.interaction.get(index)?,
            fitness: *self.fitness.get(index)?,
        })
    }

    fn set_fitness(&mut self, index: usize, breakdown: FitnessBreakdown) -> Result<()> {
        if index >= self.fitness.len()
            || index >= self.substitution.len()
            || index >= self.interaction.len()
        {
            return Err(AlignError::Evaluation(format!(
                "Cell {} is outside the fitness table",
                index
            )));
        }
        self.substitution[index] = breakdown.substitution;
        self.interaction[index] = breakdown.interaction;
        self.fitness[index] = breakdown.fitness;
        Ok(())
    }

    fn evaluation_count(&self) -> u64 {
        self.evaluations
    }

    fn select_best(&self, cumulative_nfe: u64) -> Result<(usize, f64)> {
        let (best, fitness) = self
            .fitness
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, f)| !f.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .ok_or_else_align(|| AlignError::EmptyPopulation)?;

        debug!(
            best,
            fitness,
            blosum_score = self.substitution.get(best).copied().unwrap_or_default(),
            interaction = self.interaction.get(best).copied().unwrap_or_default(),
            nfe = cumulative_nfe,
            "Best cell of the iteration"
        );
        Ok((best, fitness))
    }

    fn score_single(&mut self, alignment: &Alignment) -> Result<f64> {
        if alignment.num_rows() == 0 {
            return Err(AlignError::Evaluation(
                "Cannot score an alignment without rows".to_string(),
            ));
        }
        let mut squared = alignment.clone();
        squared.square();
        self.evaluations += 1;
        Ok(substitution_score(&squared))
    }

    fn replace_worst(&self, population: &mut [Alignment], elite: &Alignment) -> Result<()> {
        let worst = self
            .worst_index()
            .ok_or_else_align(|| AlignError::EmptyPopulation)?;
        let slot = population.get_mut(worst).ok_or_else_align(|| {
            AlignError::Evaluation(format!("Worst cell {} is outside the population", worst))
        })?;
        *slot = elite.clone();
        Ok(())
    }

    fn reset_counters(&mut self, population_size: usize) {
        for table in [
            &mut self.substitution,
            &mut self.attraction,
            &mut self.repulsion,
            &mut self.interaction,
            &mut self.fitness,
        ] {
            table.clear();
            table.reserve(population_size);
        }
        self.evaluations = 0;
    }
}
