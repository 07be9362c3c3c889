//! Error types for the reordering engine.

use thiserror::Error;

/// Result type alias for optimization operations.
pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Errors raised before an optimization run starts.
///
/// A run that hits its iteration or time budget is not an error: it ends
/// in [`crate::Termination::BudgetExhausted`] with a usable result.
#[derive(Error, Debug)]
pub enum OptimizeError {
    /// Matrix, labels or seed permutation rejected by the core model.
    #[error("Core error: {0}")]
    Core(#[from] clana_core::CoreError),

    /// Non-positive budgets, bad temperature schedule or move weights.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Move that does not fit a permutation of the given length.
    #[error("Invalid move {mv} for {n} labels")]
    InvalidMove {
        /// Offending move, formatted.
        mv: String,
        /// Permutation length.
        n: usize,
    },
}
