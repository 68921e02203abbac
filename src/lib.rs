pub mod alignment;
pub mod chemotaxis;
pub mod control;
pub mod error;
pub mod harness;
pub mod report;
pub mod rng;
pub mod sequence;

// Re-export commonly used types for convenience
pub use error::{AlignError, OptionExt, Result, ResultExt};
