//! # clana_analysis
//!
//! Analysis utilities for clana-rs: matrix diagnostics, top confusions and
//! reordering reports.
//!
//! This crate provides tools for inspecting a classifier through its
//! confusion matrix:
//! - Classes missing from the data or never predicted
//! - The most frequent confusions
//! - A report of a reordering run with per-class metrics and groups
//! - The silhouette score of a grouping

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod confusions;
mod problems;
mod report;
mod silhouette;

pub use confusions::{top_confusions, Confusion};
pub use problems::{find_problems, MatrixProblem, ProblemKind};
pub use report::{ClassSummary, ReorderingReport};
pub use silhouette::silhouette;
