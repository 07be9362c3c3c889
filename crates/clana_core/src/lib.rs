//! # clana_core
//!
//! Core types for clana-rs confusion matrix analysis.
//!
//! This crate provides:
//! - [`ConfusionMatrix`] an immutable N×N table of true-vs-predicted counts
//! - [`LabelSet`] the class names aligned with the matrix rows
//! - [`Permutation`] a validated bijection from display position to label index
//! - [`PermutedView`] a zero-copy reindexed view of a matrix
//! - [`Seed`] for deterministic random number generation
//! - Error types and common utilities
//!
//! ## Index Convention
//!
//! A permutation maps a *display position* to an *original label index*:
//! row/column `i` of a view is row/column `perm[i]` of the matrix.
//!
//! ## Example
//!
//! ```rust
//! use clana_core::{ConfusionMatrix, Permutation};
//!
//! let cm = ConfusionMatrix::from_counts(&[vec![5, 1], vec![0, 4]]).unwrap();
//! let perm = Permutation::new(vec![1, 0]).unwrap();
//! let view = cm.apply(&perm).unwrap();
//! assert_eq!(view.get(0, 0), 4.0);
//! assert_eq!(view.get(1, 0), 1.0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod labels;
mod matrix;
mod permutation;
mod seed;
mod view;

pub use error::{CoreError, Result};
pub use labels::LabelSet;
pub use matrix::ConfusionMatrix;
pub use permutation::Permutation;
pub use seed::Seed;
pub use view::PermutedView;
