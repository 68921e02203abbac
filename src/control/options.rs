//! # BfoaOptions
//!
//! The `BfoaOptions` struct holds the parameters of one optimization run: population
//! size, iteration count, step-size bounds, the attraction/repulsion energy terms and
//! the anomaly threshold. Options are fixed when a run starts.
//!
//! ## Example
//!
//! ```rust
//! use bfoalign::control::options::BfoaOptions;
//!
//! // Create a new BfoaOptions instance with default parameters
//! let default_options = BfoaOptions::default();
//! assert_eq!(default_options.get_num_bacteria(), 6);
//!
//! // Or configure it with the builder
//! let options = BfoaOptions::builder()
//!     .num_bacteria(10)
//!     .num_iterations(10)
//!     .initial_step(2.0)
//!     .step_floor(1.0)
//!     .build();
//! assert!(options.validate().is_ok());
//! ```

use crate::chemotaxis::EnergyParams;
use crate::error::{AlignError, Result};

pub const DEFAULT_NUM_BACTERIA: usize = 6;
pub const DEFAULT_NUM_ITERATIONS: usize = 5;
pub const DEFAULT_INITIAL_STEP: f64 = 300.0;
pub const DEFAULT_STEP_FLOOR: f64 = 5.0;
pub const DEFAULT_DAMPING_THRESHOLD: f64 = 500.0;
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 100.0;
pub const DEFAULT_ATTRACTION_DISTANCE: f64 = 0.15;
pub const DEFAULT_ATTRACTION_WEIGHT: f64 = 0.005;
pub const DEFAULT_REPULSION_DISTANCE: f64 = DEFAULT_ATTRACTION_DISTANCE;
pub const DEFAULT_REPULSION_WEIGHT: f64 = 0.003;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BfoaOptions {
    num_bacteria: usize,
    num_iterations: usize,
    initial_step: f64,
    step_floor: f64,
    /// Best-fitness level above which the step is damped
    damping_threshold: f64,
    energy: EnergyParams,
    /// Fitness values above this are anomalous
    anomaly_threshold: f64,
}

impl BfoaOptions {
    pub fn new(
        num_bacteria: usize,
        num_iterations: usize,
        initial_step: f64,
        energy: EnergyParams,
    ) -> Self {
        Self {
            num_bacteria,
            num_iterations,
            initial_step,
            energy,
            ..Self::default()
        }
    }

    pub fn get_num_bacteria(&self) -> usize {
        self.num_bacteria
    }

    pub fn get_num_iterations(&self) -> usize {
        self.num_iterations
    }

    pub fn get_initial_step(&self) -> f64 {
        self.initial_step
    }

    pub fn get_step_floor(&self) -> f64 {
        self.step_floor
    }

    pub fn get_damping_threshold(&self) -> f64 {
        self.damping_threshold
    }

    pub fn get_energy(&self) -> &EnergyParams {
        &self.energy
    }

    pub fn get_anomaly_threshold(&self) -> f64 {
        self.anomaly_threshold
    }

    /// Sets the population size.
    pub fn set_num_bacteria(&mut self, num_bacteria: usize) {
        self.num_bacteria = num_bacteria;
    }

    /// Sets the number of iterations.
    pub fn set_num_iterations(&mut self, num_iterations: usize) {
        self.num_iterations = num_iterations;
    }

    pub fn set_initial_step(&mut self, initial_step: f64) {
        self.initial_step = initial_step;
    }

    pub fn set_step_floor(&mut self, step_floor: f64) {
        self.step_floor = step_floor;
    }

    pub fn set_damping_threshold(&mut self, threshold: f64) {
        self.damping_threshold = threshold;
    }

    pub fn set_energy(&mut self, energy: EnergyParams) {
        self.energy = energy;
    }

    pub fn set_anomaly_threshold(&mut self, threshold: f64) {
        self.anomaly_threshold = threshold;
    }

    /// Checks the options for values a run cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::Configuration` if:
    /// - the population is empty
    /// - the step floor is not positive, or the initial step is below it
    /// - any numeric parameter is not finite
    /// - any energy weight or distance is negative
    pub fn validate(&self) -> Result<()> {
        if self.num_bacteria == 0 {
            return Err(AlignError::Configuration(
                "Number of bacteria cannot be zero".to_string(),
            ));
        }

        let numeric = [
            ("initial step", self.initial_step),
            ("step floor", self.step_floor),
            ("damping threshold", self.damping_threshold),
            ("anomaly threshold", self.anomaly_threshold),
            ("attraction distance", self.energy.attraction_distance),
            ("attraction weight", self.energy.attraction_weight),
            ("repulsion distance", self.energy.repulsion_distance),
            ("repulsion weight", self.energy.repulsion_weight),
        ];
        if let Some((name, value)) = numeric.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AlignError::Configuration(format!(
                "The {} must be finite, got {}",
                name, value
            )));
        }

        if self.step_floor <= 0.0 {
            return Err(AlignError::Configuration(
                "Step floor must be positive".to_string(),
            ));
        }
        if self.initial_step < self.step_floor {
            return Err(AlignError::Configuration(format!(
                "Initial step {} is below the step floor {}",
                self.initial_step, self.step_floor
            )));
        }
        if self.damping_threshold <= 0.0 {
            return Err(AlignError::Configuration(
                "Damping threshold must be positive".to_string(),
            ));
        }
        if let Some((name, _)) = numeric[4..].iter().find(|(_, v)| *v < 0.0) {
            return Err(AlignError::Configuration(format!(
                "The {} cannot be negative",
                name
            )));
        }
        Ok(())
    }

    /// Returns a builder for creating a `BfoaOptions` instance.
    pub fn builder() -> BfoaOptionsBuilder {
        BfoaOptionsBuilder::default()
    }
}

impl Default for BfoaOptions {
    fn default() -> Self {
        Self {
            num_bacteria: DEFAULT_NUM_BACTERIA,
            num_iterations: DEFAULT_NUM_ITERATIONS,
            initial_step: DEFAULT_INITIAL_STEP,
            step_floor: DEFAULT_STEP_FLOOR,
            damping_threshold: DEFAULT_DAMPING_THRESHOLD,
            energy: EnergyParams::default(),
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
        }
    }
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            attraction_distance: DEFAULT_ATTRACTION_DISTANCE,
            attraction_weight: DEFAULT_ATTRACTION_WEIGHT,
            repulsion_distance: DEFAULT_REPULSION_DISTANCE,
            repulsion_weight: DEFAULT_REPULSION_WEIGHT,
        }
    }
}

/// Builder for `BfoaOptions`.
///
/// Provides a fluent interface for constructing `BfoaOptions` instances. Unset
/// values fall back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct BfoaOptionsBuilder {
    num_bacteria: Option<usize>,
    num_iterations: Option<usize>,
    initial_step: Option<f64>,
    step_floor: Option<f64>,
    damping_threshold: Option<f64>,
    attraction_distance: Option<f64>,
    attraction_weight: Option<f64>,
    repulsion_distance: Option<f64>,
    repulsion_weight: Option<f64>,
    anomaly_threshold: Option<f64>,
}

impl BfoaOptionsBuilder {
    pub fn num_bacteria(mut self, value: usize) -> Self {
        self.num_bacteria = Some(value);
        self
    }

    pub fn num_iterations(mut self, value: usize) -> Self {
        self.num_iterations = Some(value);
        self
    }

    pub fn initial_step(mut self, value: f64) -> Self {
        self.initial_step = Some(value);
        self
    }

    pub fn step_floor(mut self, value: f64) -> Self {
        self.step_floor = Some(value);
        self
    }

    pub fn damping_threshold(mut self, value: f64) -> Self {
        self.damping_threshold = Some(value);
        self
    }

    pub fn attraction(mut self, distance: f64, weight: f64) -> Self {
        self.attraction_distance = Some(distance);
        self.attraction_weight = Some(weight);
        self
    }

    pub fn repulsion(mut self, distance: f64, weight: f64) -> Self {
        self.repulsion_distance = Some(distance);
        self.repulsion_weight = Some(weight);
        self
    }

    pub fn anomaly_threshold(mut self, value: f64) -> Self {
        self.anomaly_threshold = Some(value);
        self
    }

    /// Builds the `BfoaOptions` instance.
    pub fn build(self) -> BfoaOptions {
        let defaults = BfoaOptions::default();
        BfoaOptions {
            num_bacteria: self.num_bacteria.unwrap_or(defaults.num_bacteria),
            num_iterations: self.num_iterations.unwrap_or(defaults.num_iterations),
            initial_step: self.initial_step.unwrap_or(defaults.initial_step),
            step_floor: self.step_floor.unwrap_or(defaults.step_floor),
            damping_threshold: self.damping_threshold.unwrap_or(defaults.damping_threshold),
            energy: EnergyParams {
                attraction_distance: self
                    .attraction_distance
                    .unwrap_or(defaults.energy.attraction_distance),
                attraction_weight: self
                    .attraction_weight
                    .unwrap_or(defaults.energy.attraction_weight),
                repulsion_distance: self
                    .repulsion_distance
                    .unwrap_or(defaults.energy.repulsion_distance),
                repulsion_weight: self
                    .repulsion_weight
                    .unwrap_or(defaults.energy.repulsion_weight),
            },
            anomaly_threshold: self.anomaly_threshold.unwrap_or(defaults.anomaly_threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let options = BfoaOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.get_initial_step(), 300.0);
        assert_eq!(options.get_anomaly_threshold(), 100.0);
        assert_eq!(options.get_energy().repulsion_distance, 0.15);
    }

    #[test]
    fn test_builder_overrides() {
        let options = BfoaOptions::builder()
            .num_bacteria(10)
            .attraction(0.2, 0.002)
            .build();
        assert_eq!(options.get_num_bacteria(), 10);
        assert_eq!(options.get_energy().attraction_distance, 0.2);
        assert_eq!(options.get_num_iterations(), DEFAULT_NUM_ITERATIONS);
    }

    #[test]
    fn test_zero_bacteria_is_rejected() {
        let options = BfoaOptions::builder().num_bacteria(0).build();
        match options.validate() {
            Err(AlignError::Configuration(msg)) => assert!(msg.contains("bacteria")),
            _ => panic!("Expected Configuration error"),
        }
    }

    #[test]
    fn test_step_bounds_are_checked() {
        let options = BfoaOptions::builder().initial_step(2.0).build();
        assert!(options.validate().is_err());

        let options = BfoaOptions::builder().step_floor(0.0).build();
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_non_finite_and_negative_values_are_rejected() {
        let options = BfoaOptions::builder().anomaly_threshold(f64::NAN).build();
        assert!(options.validate().is_err());

        let options = BfoaOptions::builder().repulsion(0.1, -1.0).build();
        assert!(options.validate().is_err());
    }
}
