/// Computes the per-iteration step magnitude ("tumble" size).
///
/// The step cools exponentially, halving over the course of a run. When the best
/// known fitness exceeds the damping threshold the step is shrunk further, so an
/// inflated best cannot drive oversized perturbations. The result always lies in
/// `[floor, initial_step]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepScheduler {
    floor: f64,
    damping_threshold: f64,
}

/// Smallest damping factor applied for an inflated best fitness.
pub const MIN_DAMPING: f64 = 0.01;

impl StepScheduler {
    pub fn new(floor: f64, damping_threshold: f64) -> Self {
        Self {
            floor,
            damping_threshold,
        }
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// `0.5^(iteration / total)`; a run without iterations does not cool.
    pub fn cooling(iteration: usize, total_iterations: usize) -> f64 {
        if total_iterations == 0 {
            return 1.0;
        }
        0.5_f64.powf(iteration as f64 / total_iterations as f64)
    }

    /// Damping factor for the given best fitness, in `[MIN_DAMPING, 1]`.
    pub fn damping(&self, best_fitness: f64) -> f64 {
        if best_fitness > self.damping_threshold {
            (self.damping_threshold / best_fitness).max(MIN_DAMPING)
        } else {
            1.0
        }
    }

    pub fn compute_step(
        &self,
        iteration: usize,
        total_iterations: usize,
        initial_step: f64,
        best_fitness: f64,
    ) -> f64 {
        let step =
            initial_step * Self::cooling(iteration, total_iterations) * self.damping(best_fitness);
        step.min(initial_step).max(self.floor)
    }
}
