//! # Error Types
//!
//! This module defines the error types for the alignment optimizer and the
//! experiment harness. Operator failures are reported as values of
//! [`AlignError`] so the optimization loop can recover from them; anomalous
//! fitness values are not errors and never show up here.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use bfoalign::error::{AlignError, Result};
//!
//! fn some_function() -> Result<()> {
//!     Ok(())
//! }
//!
//! fn caller() {
//!     match some_function() {
//!         Ok(_) => println!("Success!"),
//!         Err(e) => println!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! Using the `ResultExt` trait to add context to errors:
//!
//! ```rust
//! use bfoalign::error::{Result, ResultExt};
//! use std::fs::File;
//!
//! fn open_fasta(path: &str) -> Result<()> {
//!     File::open(path).context("Failed to open FASTA file")?;
//!     Ok(())
//! }
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use bfoalign::error::{AlignError, OptionExt};
//!
//! fn best_fitness(table: &[f64]) -> bfoalign::error::Result<f64> {
//!     table
//!         .iter()
//!         .cloned()
//!         .reduce(f64::max)
//!         .ok_or_else_align(|| AlignError::EmptyPopulation)
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Represents errors that can occur while aligning sequences or running experiments.
#[derive(Error, Debug)]
pub enum AlignError {
    /// Error that occurs when an invalid configuration is provided.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error that occurs when an empty population or fitness table is encountered.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// Error raised by a population operator step (scoring, energy tables, fitness).
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Error raised while repairing an anomalous candidate.
    #[error("Repair error: {0}")]
    Repair(String),

    /// Error that occurs when the sequence source cannot deliver sequences.
    #[error("Sequence source error: {0}")]
    SequenceSource(String),

    /// Error that occurs when the experiment harness cannot schedule runs.
    #[error("Harness error: {0}")]
    Harness(String),

    /// Error that occurs when NaN or infinity values are encountered.
    #[error("Invalid numeric value: {0}")]
    InvalidNumericValue(String),

    /// Error that occurs when an I/O operation fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error that occurs when writing a tabular report fails.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for alignment operations.
pub type Result<T> = std::result::Result<T, AlignError>;

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use bfoalign::error::ResultExt;
/// use std::fs::File;
///
/// fn read_file(path: &str) -> bfoalign::error::Result<()> {
///     File::open(path).context("Failed to open file")?;
///     Ok(())
/// }
/// ```
pub trait ResultExt<T, E> {
    /// Adds context to an error, converting it to an `AlignError`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| AlignError::Other(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, AlignError>` using a closure to
    /// generate the error.
    fn ok_or_else_align<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> AlignError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_align<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> AlignError,
    {
        self.ok_or_else(err_fn)
    }
}
