//! Error types for clustering.

use thiserror::Error;

/// Result type alias for clustering operations.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors raised by the cluster builder and flat cuts.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Matrix or permutation rejected by the core model.
    #[error("Core error: {0}")]
    Core(#[from] clana_core::CoreError),

    /// Unknown linkage name or unusable cut threshold.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Requested cluster count outside `1..=n_labels`.
    #[error("Cannot cut {n_labels} labels into {requested} clusters")]
    InvalidClusterCount {
        /// Clusters asked for.
        requested: usize,
        /// Labels available.
        n_labels: usize,
    },
}
