//! Candidate perturbations of a permutation.
//!
//! Every move is expressed as an in-place swap, reversal or rotation of the
//! display order, so applying a move to a valid permutation always yields a
//! valid permutation.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use clana_core::Permutation;

use crate::config::MoveWeights;
use crate::error::{OptimizeError, Result};

/// Kind of a [`Move`], used for move selection and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    /// Transposition of two positions.
    Swap,
    /// Reversal of a contiguous block.
    Reverse,
    /// Block moved to another place (rotation of a sub-range).
    Relocate,
}

impl std::fmt::Display for MoveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveKind::Swap => write!(f, "swap"),
            MoveKind::Reverse => write!(f, "reverse"),
            MoveKind::Relocate => write!(f, "relocate"),
        }
    }
}

/// A permutation-preserving change of the display order.
///
/// The variants are plain data. Hand-built moves should go through
/// [`Move::swap`], [`Move::reverse`] or [`Move::relocate`], which check the
/// positions against the permutation length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Exchange the labels at positions `i` and `j` (`i != j`).
    Swap {
        /// First position.
        i: usize,
        /// Second position.
        j: usize,
    },
    /// Reverse positions `start..=end` (`start < end`).
    Reverse {
        /// First position of the block.
        start: usize,
        /// Last position of the block.
        end: usize,
    },
    /// Move the block `start..=end` so that it begins at `insert` (when
    /// `insert < start`) or ends at `insert` (when `insert > end`).
    Relocate {
        /// First position of the block.
        start: usize,
        /// Last position of the block.
        end: usize,
        /// Target position, outside `start..=end`.
        insert: usize,
    },
}

impl Move {
    /// Swap of positions `i` and `j` in a permutation of length `n`.
    pub fn swap(i: usize, j: usize, n: usize) -> Result<Self> {
        let mv = Move::Swap { i, j };
        mv.validate(n)?;
        Ok(mv)
    }

    /// Reversal of `start..=end` in a permutation of length `n`.
    pub fn reverse(start: usize, end: usize, n: usize) -> Result<Self> {
        let mv = Move::Reverse { start, end };
        mv.validate(n)?;
        Ok(mv)
    }

    /// Relocation of `start..=end` to `insert` in a permutation of length `n`.
    pub fn relocate(start: usize, end: usize, insert: usize, n: usize) -> Result<Self> {
        let mv = Move::Relocate { start, end, insert };
        mv.validate(n)?;
        Ok(mv)
    }

    /// Check that the move is well formed for a permutation of length `n`.
    ///
    /// Every position must be `< n`; a swap needs `i != j`, a reversal
    /// `start < end`, and a relocation a target outside its block.
    pub fn validate(&self, n: usize) -> Result<()> {
        let ok = match *self {
            Move::Swap { i, j } => i != j && i < n && j < n,
            Move::Reverse { start, end } => start < end && end < n,
            Move::Relocate { start, end, insert } => {
                start <= end && end < n && insert < n && (insert < start || insert > end)
            }
        };
        if ok {
            Ok(())
        } else {
            Err(OptimizeError::InvalidMove {
                mv: format!("{:?}", self),
                n,
            })
        }
    }

    /// The move's kind.
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::Swap { .. } => MoveKind::Swap,
            Move::Reverse { .. } => MoveKind::Reverse,
            Move::Relocate { .. } => MoveKind::Relocate,
        }
    }

    /// Smallest contiguous range of positions `(lo, hi)` the move changes.
    pub fn touched_range(&self) -> (usize, usize) {
        match *self {
            Move::Swap { i, j } => (i.min(j), i.max(j)),
            Move::Reverse { start, end } => (start, end),
            Move::Relocate { start, end, insert } => {
                if insert > end {
                    (start, insert)
                } else {
                    (insert, end)
                }
            }
        }
    }

    /// Apply the move to `perm` in place.
    ///
    /// # Panics
    ///
    /// Panics if the move is not valid for `perm.len()`; see
    /// [`Move::validate`].
    pub fn apply(&self, perm: &mut Permutation) {
        match *self {
            Move::Swap { i, j } => perm.swap(i, j),
            Move::Reverse { start, end } => perm.reverse(start, end),
            Move::Relocate { start, end, insert } => {
                let len = end - start + 1;
                if insert > end {
                    perm.rotate_left(start, insert, len);
                } else {
                    perm.rotate_right(insert, end, len);
                }
            }
        }
    }

    /// Apply the move to a copy of the touched range, which starts at
    /// display position `offset`.
    pub(crate) fn rearrange(&self, segment: &mut [usize], offset: usize) {
        match *self {
            Move::Swap { i, j } => segment.swap(i - offset, j - offset),
            Move::Reverse { .. } => segment.reverse(),
            Move::Relocate { start, end, insert } => {
                let len = end - start + 1;
                if insert > end {
                    segment.rotate_left(len);
                } else {
                    segment.rotate_right(len);
                }
            }
        }
    }
}

/// Draws random moves according to [`MoveWeights`].
#[derive(Debug, Clone)]
pub struct MoveGenerator {
    kinds: Vec<MoveKind>,
    dist: WeightedIndex<f64>,
}

impl MoveGenerator {
    /// Build a generator; fails if the weights are invalid.
    pub fn new(weights: &MoveWeights) -> Result<Self> {
        weights.validate()?;
        let pairs = [
            (MoveKind::Swap, weights.swap),
            (MoveKind::Reverse, weights.reverse),
            (MoveKind::Relocate, weights.relocate),
        ];
        let (kinds, w): (Vec<MoveKind>, Vec<f64>) =
            pairs.into_iter().filter(|(_, w)| *w > 0.0).unzip();
        let dist = WeightedIndex::new(&w)
            .map_err(|e| OptimizeError::InvalidConfiguration(format!("move weights: {}", e)))?;
        Ok(Self { kinds, dist })
    }

    /// Propose a move for a permutation of length `n`.
    ///
    /// Returns `None` for `n < 2`, where no move exists. Block moves make no
    /// sense below three labels, so only swaps are drawn there.
    pub fn propose<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Option<Move> {
        if n < 2 {
            return None;
        }
        let kind = if n < 3 {
            MoveKind::Swap
        } else {
            self.kinds[self.dist.sample(rng)]
        };

        let mv = match kind {
            MoveKind::Swap => {
                let i = rng.gen_range(0..n);
                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                Move::Swap { i, j }
            }
            MoveKind::Reverse => {
                let a = rng.gen_range(0..n);
                let mut b = rng.gen_range(0..n - 1);
                if b >= a {
                    b += 1;
                }
                Move::Reverse { start: a.min(b), end: a.max(b) }
            }
            MoveKind::Relocate => {
                // Block of 1..n-1 labels, target drawn among the positions
                // outside the block.
                let len = rng.gen_range(1..n);
                let start = rng.gen_range(0..=n - len);
                let end = start + len - 1;
                let r = rng.gen_range(0..n - len);
                let insert = if r < start { r } else { r + len };
                Move::Relocate { start, end, insert }
            }
        };
        Some(mv)
    }
}
