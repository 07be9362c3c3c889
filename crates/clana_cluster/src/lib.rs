//! # clana_cluster
//!
//! Hierarchical grouping of classes that a model confuses with each other.
//!
//! This crate provides:
//! - [`confusion_distance`] the dissimilarity `1 / (1 + m[i][j] + m[j][i])`
//! - [`Linkage`] single, complete and average linkage
//! - [`ClusterBuilder`] deterministic agglomerative clustering
//! - [`Dendrogram`] the merge tree with leaf order and merge history
//! - [`FlatCut`] / [`FlatClustering`] flat groups cut from the tree
//!
//! ## Example
//!
//! ```rust
//! use clana_core::ConfusionMatrix;
//! use clana_cluster::{ClusterConfig, FlatCut, Linkage};
//!
//! let cm = ConfusionMatrix::from_counts(&[
//!     vec![8, 3, 0],
//!     vec![2, 7, 0],
//!     vec![0, 0, 9],
//! ]).unwrap();
//!
//! let config = ClusterConfig::default()
//!     .with_linkage(Linkage::Complete)
//!     .with_cut(FlatCut::ClusterCount(2));
//! let result = config.cluster(&cm, None).unwrap();
//! assert_eq!(result.flat.unwrap().assignment, vec![0, 0, 1]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod builder;
mod cut;
mod dendrogram;
mod distance;
mod error;
mod linkage;

pub use builder::{ClusterBuilder, ClusterConfig, Clustering};
pub use cut::{FlatClustering, FlatCut};
pub use dendrogram::{ClusterNode, Dendrogram, MergeStep};
pub use distance::confusion_distance;
pub use error::{ClusterError, Result};
pub use linkage::Linkage;
