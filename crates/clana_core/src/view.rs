//! Zero-copy permuted view of a confusion matrix.

use crate::matrix::ConfusionMatrix;

/// Read-only reindexed view of a [`ConfusionMatrix`].
///
/// Row/column `i` of the view is row/column `perm[i]` of the underlying
/// matrix. The view only borrows the matrix and the index array; use
/// [`PermutedView::to_matrix`] when an owned, reordered copy is required.
#[derive(Debug, Clone, Copy)]
pub struct PermutedView<'a> {
    matrix: &'a ConfusionMatrix,
    perm: &'a [usize],
}

impl<'a> PermutedView<'a> {
    /// Callers guarantee `perm` is a bijection of matching length.
    pub(crate) fn new(matrix: &'a ConfusionMatrix, perm: &'a [usize]) -> Self {
        Self { matrix, perm }
    }

    /// Number of classes.
    #[inline]
    pub fn size(&self) -> usize {
        self.perm.len()
    }

    /// Value at display row `i`, display column `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix.get(self.perm[i], self.perm[j])
    }

    /// Original label index shown at display position `i`.
    #[inline]
    pub fn label_at(&self, i: usize) -> usize {
        self.perm[i]
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> &'a ConfusionMatrix {
        self.matrix
    }

    /// Iterate over display rows.
    pub fn rows(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        (0..self.size()).map(move |i| (0..self.size()).map(|j| self.get(i, j)).collect())
    }

    /// Copy the view into an owned matrix in display order.
    pub fn to_matrix(&self) -> ConfusionMatrix {
        let n = self.size();
        let data = (0..n).flat_map(|i| (0..n).map(move |j| self.get(i, j))).collect();
        ConfusionMatrix::from_validated(data, n)
    }

    /// Cell-wise equality with an owned matrix.
    pub fn equals_matrix(&self, other: &ConfusionMatrix) -> bool {
        let n = self.size();
        other.size() == n && (0..n).all(|i| (0..n).all(|j| self.get(i, j) == other.get(i, j)))
    }
}

#[cfg(test)]
mod tests {
    use crate::{ConfusionMatrix, Permutation};

    fn sample() -> ConfusionMatrix {
        ConfusionMatrix::from_counts(&[vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]).unwrap()
    }

    #[test]
    fn test_apply_permutation() {
        let cm = sample();
        let perm = Permutation::new(vec![2, 0, 1]).unwrap();
        let view = cm.apply(&perm).unwrap();

        let expected = [[8.0, 6.0, 7.0], [2.0, 0.0, 1.0], [5.0, 3.0, 4.0]];
        for (i, row) in expected.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                assert_eq!(view.get(i, j), v);
            }
        }
        assert_eq!(view.label_at(0), 2);
    }

    #[test]
    fn test_inverse_restores_original() {
        let cm = sample();
        let perm = Permutation::new(vec![1, 2, 0]).unwrap();
        let permuted = cm.apply(&perm).unwrap().to_matrix();
        let inv = perm.inverse();
        let restored = permuted.apply(&inv).unwrap();
        assert!(restored.equals_matrix(&cm));
    }

    #[test]
    fn test_rows_iterator() {
        let cm = sample();
        let perm = Permutation::new(vec![2, 1, 0]).unwrap();
        let rows: Vec<Vec<f64>> = cm.apply(&perm).unwrap().rows().collect();
        assert_eq!(rows[0], vec![8.0, 7.0, 6.0]);
        assert_eq!(rows[2], vec![2.0, 1.0, 0.0]);
    }
}
