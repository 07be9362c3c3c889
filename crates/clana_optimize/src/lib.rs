//! # clana_optimize
//!
//! Reordering engine for confusion matrices.
//!
//! This crate provides:
//! - [`DisorderCost`] the objective: confusions weighted by display distance
//! - [`Move`] and [`MoveGenerator`] permutation-preserving perturbations
//! - [`Optimizer`] stochastic local search with optional simulated annealing
//! - [`optimize_multi_start`] independent restarts run in parallel
//! - Observers for progress reporting
//!
//! ## Example
//!
//! ```rust
//! use clana_core::ConfusionMatrix;
//! use clana_optimize::{optimize, OptimizerConfig};
//!
//! let cm = ConfusionMatrix::from_counts(&[
//!     vec![10, 0, 0],
//!     vec![0, 8, 2],
//!     vec![0, 1, 9],
//! ]).unwrap();
//!
//! let config = OptimizerConfig::default()
//!     .with_seed(42)
//!     .with_max_iterations(1_000)
//!     .with_max_stale_iterations(200);
//! let result = optimize(&cm, &config).unwrap();
//! assert_eq!(result.cost, 3.0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod cost;
mod error;
mod moves;
mod multi_start;
mod observer;
mod optimizer;
mod schedule;

pub use config::{MoveWeights, OptimizerConfig};
pub use cost::DisorderCost;
pub use error::{OptimizeError, Result};
pub use moves::{Move, MoveGenerator, MoveKind};
pub use multi_start::{optimize_multi_start, optimize_multi_start_from, MultiStartResult};
pub use observer::{BestCostRecorder, LoggingObserver, NoopObserver, OptimizationObserver};
pub use optimizer::{optimize, OptimizationResult, Optimizer, OptimizerState, Termination};
pub use schedule::TemperatureSchedule;
