//! # Elitism
//!
//! The [`EliteTracker`] keeps the best valid candidate seen during a run. It lives
//! outside the population, so population resets never touch it, and its alignment
//! is an owned snapshot that later mutation of the population cannot corrupt.
//!
//! All updates go through [`EliteTracker::consider`].

use crate::alignment::Alignment;
use crate::chemotaxis::FitnessBreakdown;

/// The best solution found so far.
#[derive(Debug, Clone, PartialEq)]
pub struct EliteRecord {
    /// Population slot the snapshot was taken from.
    pub index: usize,
    pub fitness: f64,
    pub breakdown: FitnessBreakdown,
    pub alignment: Alignment,
}

/// A candidate offered to the tracker.
#[derive(Debug, Clone, Copy)]
pub struct EliteCandidate<'a> {
    pub index: usize,
    pub breakdown: FitnessBreakdown,
    pub alignment: &'a Alignment,
}

#[derive(Debug, Clone)]
pub struct EliteTracker {
    anomaly_threshold: f64,
    record: Option<EliteRecord>,
}

impl EliteTracker {
    /// Creates an empty tracker: no index, fitness of negative infinity, no alignment.
    pub fn new(anomaly_threshold: f64) -> Self {
        Self {
            anomaly_threshold,
            record: None,
        }
    }

    pub fn record(&self) -> Option<&EliteRecord> {
        self.record.as_ref()
    }

    pub fn into_record(self) -> Option<EliteRecord> {
        self.record
    }

    pub fn index(&self) -> Option<usize> {
        self.record.as_ref().map(|r| r.index)
    }

    /// Elite fitness, or negative infinity while empty.
    pub fn fitness(&self) -> f64 {
        self.record
            .as_ref()
            .map_or(f64::NEG_INFINITY, |r| r.fitness)
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        self.record.as_ref().map(|r| &r.alignment)
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_none()
    }

    /// Whether a fitness value lies inside the plausible range.
    pub fn is_valid_fitness(&self, fitness: f64) -> bool {
        fitness.is_finite() && fitness <= self.anomaly_threshold
    }

    /// Whether the current elite exists and holds a valid fitness.
    pub fn has_valid_elite(&self) -> bool {
        self.record
            .as_ref()
            .is_some_and(|r| self.is_valid_fitness(r.fitness))
    }

    /// Offers a candidate; returns `true` when it became the new elite.
    ///
    /// An anomalous candidate is never accepted. A valid candidate replaces the
    /// elite when there is none, when the elite itself is anomalous, or when it is
    /// strictly better.
    pub fn consider(&mut self, candidate: EliteCandidate<'_>) -> bool {
        let fitness = candidate.breakdown.fitness;
        if !self.is_valid_fitness(fitness) {
            return false;
        }

        let replace = match &self.record {
            None => true,
            Some(current) => !self.is_valid_fitness(current.fitness) || fitness > current.fitness,
        };
        if replace {
            self.record = Some(EliteRecord {
                index: candidate.index,
                fitness,
                breakdown: candidate.breakdown,
                alignment: candidate.alignment.clone(),
            });
        }
        replace
    }
}
