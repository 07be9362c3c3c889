//! Structural problems visible in a confusion matrix.

use serde::{Deserialize, Serialize};

use clana_core::{ConfusionMatrix, LabelSet, Result};

/// Kind of a [`MatrixProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// All-zero row: the class never occurs as a true label.
    NotInData,
    /// All-zero column: the classifier never predicts the class.
    NeverPredicted,
}

/// A class whose row or column is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixProblem {
    /// What is wrong.
    pub kind: ProblemKind,
    /// Label index.
    pub label: usize,
    /// Label name.
    pub name: String,
}

impl std::fmt::Display for MatrixProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ProblemKind::NotInData => write!(f, "The class '{}' was not in the dataset", self.name),
            ProblemKind::NeverPredicted => write!(f, "The class '{}' was never predicted", self.name),
        }
    }
}

/// Find classes absent from the data and classes never predicted.
///
/// Absent classes come first, then never-predicted ones, each in label
/// order. Every problem is also logged at WARN.
pub fn find_problems(matrix: &ConfusionMatrix, labels: &LabelSet) -> Result<Vec<MatrixProblem>> {
    labels.check_matches(matrix)?;
    let n = matrix.size();
    let name = |i: usize| labels.get(i).unwrap_or_default().to_string();

    let absent = (0..n)
        .filter(|&i| matrix.row_sum(i) == 0.0)
        .map(|i| MatrixProblem { kind: ProblemKind::NotInData, label: i, name: name(i) });
    let never = (0..n)
        .filter(|&j| matrix.col_sum(j) == 0.0)
        .map(|j| MatrixProblem { kind: ProblemKind::NeverPredicted, label: j, name: name(j) });
    let problems: Vec<MatrixProblem> = absent.chain(never).collect();

    for p in &problems {
        tracing::warn!("{}", p);
    }
    Ok(problems)
}
