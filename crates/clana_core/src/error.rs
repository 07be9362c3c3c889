//! Error types for clana_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors raised at the boundary of the matrix model.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Matrix not square, label count mismatch, or permutation not a bijection.
    #[error("Shape error: {0}")]
    Shape(String),

    /// A matrix entry is negative or not finite.
    #[error("Invalid value {value} at ({row}, {col}): entries must be finite and >= 0")]
    InvalidValue {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// The rejected value.
        value: f64,
    },

    /// Configuration rejected before any work began.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Shorthand for building a [`CoreError::Shape`].
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        CoreError::Shape(msg.into())
    }
}
