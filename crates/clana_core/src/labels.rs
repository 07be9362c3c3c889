//! Class label sets aligned with confusion matrix rows.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::matrix::ConfusionMatrix;
use crate::permutation::Permutation;

/// Ordered, duplicate-free class names, index-aligned with a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    /// Create a label set. Fails with [`CoreError::Shape`] on duplicates.
    pub fn new(labels: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(CoreError::shape(format!("duplicate label '{}'", label)));
            }
        }
        Ok(Self(labels))
    }

    /// Labels "0", "1", ... for matrices that come without a labels file.
    pub fn numbered(n: usize) -> Self {
        Self((0..n).map(|i| i.to_string()).collect())
    }

    /// Parse one label per line; blank lines are skipped.
    pub fn from_lines(text: &str) -> Result<Self> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    /// Check that this set names every row of `matrix`.
    pub fn check_matches(&self, matrix: &ConfusionMatrix) -> Result<()> {
        if self.len() != matrix.size() {
            return Err(CoreError::shape(format!(
                "confusion matrix is {} x {}, but {} labels were given",
                matrix.size(),
                matrix.size(),
                self.len()
            )));
        }
        Ok(())
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label for an original class index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Labels as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Labels in display order under `perm`.
    pub fn permuted(&self, perm: &Permutation) -> Result<Vec<String>> {
        perm.reorder(&self.0)
    }
}

impl TryFrom<Vec<String>> for LabelSet {
    type Error = CoreError;

    fn try_from(labels: Vec<String>) -> Result<Self> {
        Self::new(labels)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(labels: LabelSet) -> Self {
        labels.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicates() {
        let err = LabelSet::new(vec!["cat".into(), "dog".into(), "cat".into()]).unwrap_err();
        assert!(matches!(err, CoreError::Shape(_)));
    }

    #[test]
    fn test_from_lines() {
        let labels = LabelSet::from_lines("cat\n\n dog \nbird\n").unwrap();
        assert_eq!(labels.as_slice(), &["cat", "dog", "bird"]);
    }

    #[test]
    fn test_matches_matrix() {
        let cm = ConfusionMatrix::from_counts(&[vec![1, 0], vec![0, 1]]).unwrap();
        assert!(LabelSet::numbered(2).check_matches(&cm).is_ok());
        assert!(matches!(LabelSet::numbered(3).check_matches(&cm), Err(CoreError::Shape(_))));
    }

    #[test]
    fn test_permuted() {
        let labels = LabelSet::numbered(3);
        let perm = Permutation::new(vec![1, 2, 0]).unwrap();
        assert_eq!(labels.permuted(&perm).unwrap(), vec!["1", "2", "0"]);
    }
}
