//! Confusion matrix storage and per-class metrics.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::permutation::{validate_bijection, Permutation};
use crate::view::PermutedView;

/// Confusion matrix for classification evaluation.
///
/// Row `i` is true label `i`, column `j` is predicted label `j`. Entries are
/// stored as `f64` so both raw counts and row-normalized matrices fit the
/// same type. Once constructed the matrix is immutable; reordering happens
/// through [`PermutedView`] without touching the payload.
///
/// Serializes as a plain 2-D array; deserialization runs the same
/// validation as [`ConfusionMatrix::from_rows`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct ConfusionMatrix {
    /// Row-major values, `n * n` entries.
    data: Vec<f64>,
    /// Number of classes.
    n: usize,
}

impl ConfusionMatrix {
    /// Build a matrix from rows of floating point values.
    ///
    /// Fails with [`CoreError::Shape`] if the grid is empty or not square and
    /// with [`CoreError::InvalidValue`] on a negative or non-finite entry.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(CoreError::shape("confusion matrix must have at least one class"));
        }

        let mut data = Vec::with_capacity(n * n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(CoreError::shape(format!(
                    "confusion matrix is expected to be square, but row {} has {} columns (n = {})",
                    i,
                    row.len(),
                    n
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(CoreError::InvalidValue { row: i, col: j, value });
                }
                data.push(value);
            }
        }

        Ok(Self { data, n })
    }

    /// Wrap row-major values that were already validated (e.g. copied from
    /// another matrix).
    pub(crate) fn from_validated(data: Vec<f64>, n: usize) -> Self {
        debug_assert_eq!(data.len(), n * n);
        Self { data, n }
    }

    /// Build a matrix from integer counts.
    pub fn from_counts(rows: &[Vec<u64>]) -> Result<Self> {
        let rows: Vec<Vec<f64>> = rows
            .iter()
            .map(|row| row.iter().map(|&v| v as f64).collect())
            .collect();
        Self::from_rows(&rows)
    }

    /// Count predictions into an `n_classes × n_classes` matrix.
    ///
    /// Pairs whose class index is out of range are skipped.
    pub fn from_predictions(preds: &[usize], targets: &[usize], n_classes: usize) -> Result<Self> {
        if n_classes == 0 {
            return Err(CoreError::shape("confusion matrix must have at least one class"));
        }
        if preds.len() != targets.len() {
            return Err(CoreError::shape(format!(
                "predictions ({}) and targets ({}) must have the same length",
                preds.len(),
                targets.len()
            )));
        }

        let mut data = vec![0.0; n_classes * n_classes];
        for (&pred, &target) in preds.iter().zip(targets) {
            if target < n_classes && pred < n_classes {
                data[target * n_classes + pred] += 1.0;
            }
        }
        Ok(Self { data, n: n_classes })
    }

    /// Number of classes.
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Value at row `i` (true label), column `j` (predicted label).
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Mutual confusion between two labels: `m[i][j] + m[j][i]`.
    #[inline]
    pub fn symmetric_confusion(&self, i: usize, j: usize) -> f64 {
        self.get(i, j) + self.get(j, i)
    }

    /// Number of samples whose true label is `i`.
    pub fn row_sum(&self, i: usize) -> f64 {
        self.row(i).iter().sum()
    }

    /// Number of samples predicted as `j`.
    pub fn col_sum(&self, j: usize) -> f64 {
        (0..self.n).map(|i| self.get(i, j)).sum()
    }

    /// Sum of all entries.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Sum of the diagonal.
    pub fn trace(&self) -> f64 {
        (0..self.n).map(|i| self.get(i, i)).sum()
    }

    /// Sum of all off-diagonal entries.
    pub fn off_diagonal_mass(&self) -> f64 {
        self.total() - self.trace()
    }

    /// Get accuracy.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0.0 {
            0.0
        } else {
            self.trace() / total
        }
    }

    /// Get precision for a class.
    pub fn precision(&self, class: usize) -> f64 {
        let tp = self.get(class, class);
        let predicted = self.col_sum(class);
        if predicted == 0.0 {
            0.0
        } else {
            tp / predicted
        }
    }

    /// Get recall for a class.
    pub fn recall(&self, class: usize) -> f64 {
        let tp = self.get(class, class);
        let support = self.row_sum(class);
        if support == 0.0 {
            0.0
        } else {
            tp / support
        }
    }

    /// Get F1 score for a class.
    pub fn f1(&self, class: usize) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Get macro-averaged F1 score.
    pub fn macro_f1(&self) -> f64 {
        let sum: f64 = (0..self.n).map(|i| self.f1(i)).sum();
        sum / self.n as f64
    }

    /// Normalize the matrix row-wise (each row then shows recall).
    ///
    /// Rows with no samples stay all-zero.
    pub fn normalize_rows(&self) -> Self {
        let mut data = self.data.clone();
        for i in 0..self.n {
            let sum = self.row_sum(i);
            if sum > 0.0 {
                for v in &mut data[i * self.n..(i + 1) * self.n] {
                    *v /= sum;
                }
            }
        }
        Self { data, n: self.n }
    }

    /// Reindexed read-only view of this matrix.
    ///
    /// Row/column `i` of the view is row/column `perm[i]` of `self`.
    /// Fails with [`CoreError::Shape`] if the permutation length differs
    /// from the number of classes.
    pub fn apply<'a>(&'a self, perm: &'a Permutation) -> Result<PermutedView<'a>> {
        if perm.len() != self.n {
            return Err(CoreError::shape(format!(
                "permutation has length {}, matrix is {} x {}",
                perm.len(),
                self.n,
                self.n
            )));
        }
        Ok(PermutedView::new(self, perm.as_slice()))
    }

    /// Like [`ConfusionMatrix::apply`] for a raw index slice.
    ///
    /// The slice is checked to be a bijection over `[0, n)`.
    pub fn apply_indices<'a>(&'a self, indices: &'a [usize]) -> Result<PermutedView<'a>> {
        if indices.len() != self.n {
            return Err(CoreError::shape(format!(
                "permutation has length {}, matrix is {} x {}",
                indices.len(),
                self.n,
                self.n
            )));
        }
        validate_bijection(indices)?;
        Ok(PermutedView::new(self, indices))
    }

    /// Get a text representation.
    pub fn to_string_table(&self, labels: Option<&[String]>) -> String {
        let mut s = String::new();

        s.push_str("       ");
        for j in 0..self.n {
            let label = labels.and_then(|l| l.get(j)).map(String::as_str).unwrap_or("");
            s.push_str(&format!("{:>8}", label.chars().take(7).collect::<String>()));
        }
        s.push('\n');

        for i in 0..self.n {
            let label = labels.and_then(|l| l.get(i)).map(String::as_str).unwrap_or("");
            s.push_str(&format!("{:>6} ", label.chars().take(6).collect::<String>()));
            for j in 0..self.n {
                s.push_str(&format!("{:>8}", self.get(i, j)));
            }
            s.push('\n');
        }

        s
    }
}

impl TryFrom<Vec<Vec<f64>>> for ConfusionMatrix {
    type Error = CoreError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl From<ConfusionMatrix> for Vec<Vec<f64>> {
    fn from(cm: ConfusionMatrix) -> Self {
        cm.data.chunks(cm.n).map(<[f64]>::to_vec).collect()
    }
}
