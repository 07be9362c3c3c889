//! # clana
//!
//! Confusion matrix analysis in Rust.
//!
//! clana-rs reorders the rows and columns of a confusion matrix so that
//! classes a model mixes up end up next to each other, then groups them:
//!
//! - **Core**: confusion matrix, labels, permutations and zero-copy views
//! - **Optimize**: disorder score, move generator, local search and annealing
//! - **Cluster**: agglomerative grouping of classes by mutual confusion
//! - **Analysis**: diagnostics, top confusions and reports
//!
//! ## Quick Start
//!
//! ```rust
//! use clana::prelude::*;
//!
//! let cm = ConfusionMatrix::from_counts(&[
//!     vec![10, 0, 0],
//!     vec![0, 8, 2],
//!     vec![0, 1, 9],
//! ]).unwrap();
//! let labels = LabelSet::numbered(cm.size());
//!
//! let config = OptimizerConfig::default().with_seed(42).with_max_stale_iterations(500);
//! let result = optimize(&cm, &config).unwrap();
//!
//! let clustering = ClusterConfig::default()
//!     .with_cut(FlatCut::ClusterCount(2))
//!     .cluster(&cm, Some(&result.permutation))
//!     .unwrap();
//!
//! let report = ReorderingReport::new(&cm, &labels, &result, clustering.flat.as_ref()).unwrap();
//! println!("{}", report.to_string_table());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all crates
pub use clana_analysis as analysis;
pub use clana_cluster as cluster;
pub use clana_core as core;
pub use clana_optimize as optimize;

/// Prelude module for convenient imports.
///
/// ```rust
/// use clana::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use clana_core::{ConfusionMatrix, LabelSet, Permutation, PermutedView, Seed};

    // Optimization
    pub use clana_optimize::{
        optimize, optimize_multi_start, MoveWeights, OptimizationResult, Optimizer, OptimizerConfig,
        TemperatureSchedule, Termination,
    };

    // Clustering
    pub use clana_cluster::{ClusterBuilder, ClusterConfig, Dendrogram, FlatClustering, FlatCut, Linkage};

    // Analysis
    pub use clana_analysis::{find_problems, silhouette, top_confusions, ReorderingReport};
}
