//! Label permutations (display position -> original label index).

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A bijection from display position to original label index.
///
/// Every constructor validates the bijection and every mutation is a
/// permutation-preserving operation (swap, reverse, rotate), so a
/// `Permutation` value can never hold a repeated or out-of-range index.
///
/// # Example
///
/// ```rust
/// use clana_core::Permutation;
///
/// let p = Permutation::new(vec![2, 0, 1]).unwrap();
/// assert_eq!(p.inverse().as_slice(), &[1, 2, 0]);
/// assert!(Permutation::new(vec![0, 0, 1]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Permutation(Vec<usize>);

impl Permutation {
    /// Validate `indices` as a bijection over `[0, indices.len())`.
    pub fn new(indices: Vec<usize>) -> Result<Self> {
        validate_bijection(&indices)?;
        Ok(Self(indices))
    }

    /// The identity permutation of length `n`.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self((0..n).collect())
    }

    /// Number of positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty permutation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label index shown at `position`.
    #[inline]
    pub fn get(&self, position: usize) -> usize {
        self.0[position]
    }

    /// Indices as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Consume into the raw index vector.
    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }

    /// The inverse bijection: label index -> display position.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut inv = vec![0; self.0.len()];
        for (position, &label) in self.0.iter().enumerate() {
            inv[label] = position;
        }
        Self(inv)
    }

    /// Display position of `label`. O(n); callers in hot loops keep an inverse.
    pub fn position_of(&self, label: usize) -> Option<usize> {
        self.0.iter().position(|&l| l == label)
    }

    /// Composition `self ∘ inner`: position `i` maps to `inner[self[i]]`.
    ///
    /// Viewing a view: `m.apply(&inner)` then `apply(&outer)` shows the
    /// same cells as `m.apply(&outer.compose(&inner))`.
    pub fn compose(&self, inner: &Permutation) -> Result<Self> {
        if self.len() != inner.len() {
            return Err(CoreError::shape(format!(
                "cannot compose permutations of length {} and {}",
                self.len(),
                inner.len()
            )));
        }
        Ok(Self(self.0.iter().map(|&i| inner.0[i]).collect()))
    }

    /// Transpose two positions.
    #[inline]
    pub fn swap(&mut self, a: usize, b: usize) {
        self.0.swap(a, b);
    }

    /// Reverse positions `start..=end`.
    pub fn reverse(&mut self, start: usize, end: usize) {
        self.0[start..=end].reverse();
    }

    /// Rotate positions `start..=end` left by `k`.
    pub fn rotate_left(&mut self, start: usize, end: usize, k: usize) {
        self.0[start..=end].rotate_left(k);
    }

    /// Rotate positions `start..=end` right by `k`.
    pub fn rotate_right(&mut self, start: usize, end: usize, k: usize) {
        self.0[start..=end].rotate_right(k);
    }

    /// Reorder `items` into display order.
    pub fn reorder<T: Clone>(&self, items: &[T]) -> Result<Vec<T>> {
        if items.len() != self.len() {
            return Err(CoreError::shape(format!(
                "cannot reorder {} items with a permutation of length {}",
                items.len(),
                self.len()
            )));
        }
        Ok(self.0.iter().map(|&i| items[i].clone()).collect())
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = CoreError;

    fn try_from(indices: Vec<usize>) -> Result<Self> {
        Self::new(indices)
    }
}

impl From<Permutation> for Vec<usize> {
    fn from(p: Permutation) -> Self {
        p.0
    }
}

/// Check that `indices` contains every value of `[0, len)` exactly once.
pub(crate) fn validate_bijection(indices: &[usize]) -> Result<()> {
    let n = indices.len();
    let mut seen = vec![false; n];
    for (position, &label) in indices.iter().enumerate() {
        if label >= n {
            return Err(CoreError::shape(format!(
                "permutation entry {} at position {} is out of range [0, {})",
                label, position, n
            )));
        }
        if seen[label] {
            return Err(CoreError::shape(format!(
                "permutation is not a bijection: index {} appears more than once",
                label
            )));
        }
        seen[label] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_bijection() {
        assert!(matches!(Permutation::new(vec![0, 2]), Err(CoreError::Shape(_))));
        assert!(matches!(Permutation::new(vec![1, 1]), Err(CoreError::Shape(_))));
        assert!(Permutation::new(vec![]).is_ok());
    }

    #[test]
    fn test_inverse_roundtrip() {
        let p = Permutation::new(vec![3, 0, 2, 1]).unwrap();
        let inv = p.inverse();
        for i in 0..4 {
            assert_eq!(inv.get(p.get(i)), i);
        }
        assert_eq!(inv.inverse(), p);
        assert_eq!(p.compose(&inv).unwrap(), Permutation::identity(4));
    }

    #[test]
    fn test_block_operations_preserve_bijection() {
        let mut p = Permutation::identity(6);
        p.reverse(1, 4);
        assert_eq!(p.as_slice(), &[0, 4, 3, 2, 1, 5]);
        p.rotate_left(0, 5, 2);
        assert_eq!(p.as_slice(), &[3, 2, 1, 5, 0, 4]);
        p.rotate_right(2, 4, 1);
        assert_eq!(p.as_slice(), &[3, 2, 0, 1, 5, 4]);
        assert!(validate_bijection(p.as_slice()).is_ok());
    }

    #[test]
    fn test_reorder_and_position() {
        let p = Permutation::new(vec![2, 0, 1]).unwrap();
        let labels = vec!["a", "b", "c"];
        assert_eq!(p.reorder(&labels).unwrap(), vec!["c", "a", "b"]);
        assert_eq!(p.position_of(0), Some(1));
        assert_eq!(p.position_of(7), None);
    }

    #[test]
    fn test_serde_validates() {
        let p: Permutation = serde_json::from_str("[1, 0, 2]").unwrap();
        assert_eq!(p.as_slice(), &[1, 0, 2]);
        assert!(serde_json::from_str::<Permutation>("[1, 1, 2]").is_err());
    }
}
