//! Disorder cost of a label ordering.
//!
//! For a permutation `P` with inverse `pos`, the cost is
//!
//! ```text
//! cost(P) = Σ_{i≠j} m[i][j] · |pos(i) − pos(j)|
//!         = Σ_{u<v} s(u, v) · |pos(u) − pos(v)|,   s(u, v) = m[u][v] + m[v][u]
//! ```
//!
//! Confusions between classes shown far apart cost more than confusions
//! between neighbours, so minimizing the cost pulls confusable classes
//! together. The diagonal never contributes.
//!
//! Moves only relocate the labels inside a small range of display
//! positions, so the cost change of a move is evaluated from the moved
//! labels alone: O(N) for a swap, O(|range| · N) for block moves.

use clana_core::{ConfusionMatrix, Permutation};

use crate::moves::Move;

/// Precomputed symmetric confusion weights for fast cost evaluation.
#[derive(Debug, Clone)]
pub struct DisorderCost {
    n: usize,
    /// Row-major `s(u, v)`, zero on the diagonal.
    weights: Vec<f64>,
}

impl DisorderCost {
    /// Precompute `s(u, v) = m[u][v] + m[v][u]` for every label pair.
    pub fn new(matrix: &ConfusionMatrix) -> Self {
        let n = matrix.size();
        let mut weights = vec![0.0; n * n];
        for u in 0..n {
            for v in 0..n {
                if u != v {
                    weights[u * n + v] = matrix.symmetric_confusion(u, v);
                }
            }
        }
        Self { n, weights }
    }

    /// Number of labels.
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    fn weight(&self, u: usize, v: usize) -> f64 {
        self.weights[u * self.n + v]
    }

    /// Full cost of `perm`, O(N²).
    pub fn cost(&self, perm: &Permutation) -> f64 {
        self.cost_of_order(perm.as_slice())
    }

    /// Full cost of a raw display order (`order[position] = label`).
    pub fn cost_of_order(&self, order: &[usize]) -> f64 {
        debug_assert_eq!(order.len(), self.n);
        let mut total = 0.0;
        for (p, &u) in order.iter().enumerate() {
            for (q, &v) in order.iter().enumerate().skip(p + 1) {
                total += self.weight(u, v) * (q - p) as f64;
            }
        }
        total
    }

    /// Cost change of transposing display positions `a` and `b`.
    ///
    /// Only the two moved labels change distance to anybody, and their
    /// distance to each other stays `|a − b|`.
    pub fn swap_delta(&self, order: &[usize], a: usize, b: usize) -> f64 {
        if a == b {
            return 0.0;
        }
        let x = order[a];
        let y = order[b];
        let mut delta = 0.0;
        for (k, &v) in order.iter().enumerate() {
            if k == a || k == b {
                continue;
            }
            let change = dist(b, k) - dist(a, k);
            delta += (self.weight(x, v) - self.weight(y, v)) * change;
        }
        delta
    }

    /// Cost change of applying `mv` to `order`.
    ///
    /// `inverse` must be the inverse of `order` (label -> position).
    ///
    /// # Panics
    ///
    /// Panics if `mv` is not valid for `order.len()`; see
    /// [`Move::validate`].
    pub fn move_delta(&self, order: &[usize], inverse: &[usize], mv: &Move) -> f64 {
        if let Move::Swap { i, j } = *mv {
            return self.swap_delta(order, i, j);
        }

        let (lo, hi) = mv.touched_range();
        let old_segment = &order[lo..=hi];
        let mut new_segment = old_segment.to_vec();
        mv.rearrange(&mut new_segment, lo);

        // new_pos[k]: new display position of the label that sat at lo + k.
        let mut new_pos = vec![0; new_segment.len()];
        for (k, &label) in new_segment.iter().enumerate() {
            new_pos[inverse[label] - lo] = lo + k;
        }

        let mut delta = 0.0;
        for (a, &u) in old_segment.iter().enumerate() {
            let old_u = lo + a;
            let new_u = new_pos[a];
            if old_u == new_u {
                // Distance to labels outside the range is unchanged.
                for (b, &v) in old_segment.iter().enumerate().skip(a + 1) {
                    let w = self.weight(u, v);
                    if w != 0.0 {
                        delta += w * (dist(new_u, new_pos[b]) - dist(old_u, lo + b));
                    }
                }
                continue;
            }

            // Labels outside the touched range keep their position.
            for (k, &v) in order.iter().enumerate() {
                if k >= lo && k <= hi {
                    continue;
                }
                let w = self.weight(u, v);
                if w != 0.0 {
                    delta += w * (dist(new_u, k) - dist(old_u, k));
                }
            }

            // Pairs inside the range, each counted once.
            for (b, &v) in old_segment.iter().enumerate().skip(a + 1) {
                let w = self.weight(u, v);
                if w != 0.0 {
                    delta += w * (dist(new_u, new_pos[b]) - dist(old_u, lo + b));
                }
            }
        }
        delta
    }
}

#[inline]
fn dist(a: usize, b: usize) -> f64 {
    a.abs_diff(b) as f64
}
