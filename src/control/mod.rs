pub mod anomaly;
pub mod elite;
pub mod optimizer;
pub mod options;
pub mod scheduler;

pub use anomaly::{AnomalyCorrector, AnomalyState, Correction};
pub use elite::{EliteCandidate, EliteRecord, EliteTracker};
pub use optimizer::{IterationOutcome, IterationRecord, OptimizationLoop, RunReport};
pub use options::{BfoaOptions, BfoaOptionsBuilder};
pub use scheduler::StepScheduler;
