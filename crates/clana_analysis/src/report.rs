//! Summary of a reordering run.
//!
//! Collects what a user needs after optimizing: the display order, the
//! reordered matrix, scores, per-class metrics and the class groups.

use serde::{Deserialize, Serialize};

use clana_cluster::FlatClustering;
use clana_core::{ConfusionMatrix, LabelSet, Result};
use clana_optimize::{OptimizationResult, Termination};

use crate::silhouette::silhouette;

/// Per-class metrics, listed in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    /// Original label index.
    pub label: usize,
    /// Label name.
    pub name: String,
    /// Precision: TP / (TP + FP)
    pub precision: f64,
    /// Recall: TP / (TP + FN)
    pub recall: f64,
    /// Number of true instances of this class.
    pub support: f64,
}

/// Report on a reordered confusion matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderingReport {
    /// Display position -> original label index.
    pub permutation: Vec<usize>,
    /// Label names in display order.
    pub labels: Vec<String>,
    /// The matrix in display order.
    pub reordered: ConfusionMatrix,
    /// Disorder score before optimizing.
    pub initial_cost: f64,
    /// Disorder score of `permutation`.
    pub cost: f64,
    /// How the optimizer stopped.
    pub termination: Termination,
    /// Optimizer iterations.
    pub iterations: usize,
    /// Overall accuracy.
    pub accuracy: f64,
    /// Per-class metrics in display order.
    pub classes: Vec<ClassSummary>,
    /// Label names per group, each group in display order.
    pub groups: Vec<Vec<String>>,
    /// Silhouette score of the groups, when defined.
    #[serde(default)]
    pub silhouette: Option<f64>,
}

impl ReorderingReport {
    /// Build a report.
    ///
    /// Fails with a shape error if the labels, permutation or clustering do
    /// not match the matrix size.
    pub fn new(
        matrix: &ConfusionMatrix,
        labels: &LabelSet,
        result: &OptimizationResult,
        clustering: Option<&FlatClustering>,
    ) -> Result<Self> {
        labels.check_matches(matrix)?;
        let perm = &result.permutation;
        let view = matrix.apply(perm)?;
        let names = labels.permuted(perm)?;

        let classes = perm
            .as_slice()
            .iter()
            .zip(&names)
            .map(|(&label, name)| ClassSummary {
                label,
                name: name.clone(),
                precision: matrix.precision(label),
                recall: matrix.recall(label),
                support: matrix.row_sum(label),
            })
            .collect();

        let mut score = None;
        let groups = match clustering {
            Some(flat) => {
                if flat.assignment.len() != matrix.size() {
                    return Err(clana_core::CoreError::Shape(format!(
                        "clustering covers {} labels, matrix has {}",
                        flat.assignment.len(),
                        matrix.size()
                    )));
                }
                let mut groups = vec![Vec::new(); flat.n_clusters];
                for (&label, name) in perm.as_slice().iter().zip(&names) {
                    groups[flat.cluster_of(label)].push(name.clone());
                }
                score = silhouette(matrix, flat);
                if let Some(s) = score {
                    tracing::info!("silhouette_score={:.4}", s);
                }
                groups
            }
            None => Vec::new(),
        };

        Ok(Self {
            permutation: perm.as_slice().to_vec(),
            labels: names,
            reordered: view.to_matrix(),
            initial_cost: result.initial_cost,
            cost: result.cost,
            termination: result.termination,
            iterations: result.iterations,
            accuracy: matrix.accuracy(),
            classes,
            groups,
            silhouette: score,
        })
    }

    /// Display the report as a formatted string.
    pub fn to_string_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Score: {:.2} -> {:.2}\n", self.initial_cost, self.cost));
        output.push_str(&format!(
            "Optimizer {} after {} iterations\n",
            self.termination, self.iterations
        ));
        output.push_str(&format!("Perm: {:?}\n", self.permutation));
        output.push_str(&format!("Accuracy: {:.2}%\n\n", self.accuracy * 100.0));

        output.push_str("       class  precision    recall   support\n");
        for class in &self.classes {
            output.push_str(&format!(
                "{:>12}       {:.2}      {:.2}  {:>8}\n",
                class.name, class.precision, class.recall, class.support
            ));
        }

        if !self.groups.is_empty() {
            if let Some(s) = self.silhouette {
                output.push_str(&format!("\nSilhouette: {:.4}\n", s));
            }
            output.push_str("\nGroups:\n");
            for group in &self.groups {
                output.push_str(&format!("\t{}: {:?}\n", group.len(), group));
            }
        }

        output
    }

    /// Groups with more than one member.
    pub fn non_trivial_groups(&self) -> impl Iterator<Item = &Vec<String>> {
        self.groups.iter().filter(|g| g.len() > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clana_core::Permutation;

    fn result_for(perm: Vec<usize>) -> OptimizationResult {
        OptimizationResult {
            permutation: Permutation::new(perm).unwrap(),
            cost: 3.0,
            initial_cost: 6.0,
            termination: Termination::Converged,
            iterations: 120,
            accepted_moves: 1,
            improvements: 1,
        }
    }

    fn sample() -> (ConfusionMatrix, LabelSet) {
        let cm = ConfusionMatrix::from_counts(&[vec![10, 0, 0], vec![0, 8, 2], vec![0, 1, 9]]).unwrap();
        let labels = LabelSet::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        (cm, labels)
    }

    #[test]
    fn test_report_display_order() {
        let (cm, labels) = sample();
        let report = ReorderingReport::new(&cm, &labels, &result_for(vec![1, 2, 0]), None).unwrap();

        assert_eq!(report.labels, vec!["b", "c", "a"]);
        assert_eq!(report.reordered.get(0, 1), 2.0);
        assert_eq!(report.classes[0].label, 1);
        assert_eq!(report.classes[0].support, 10.0);
        assert!((report.accuracy - 27.0 / 30.0).abs() < 1e-12);
        assert!(report.groups.is_empty());
        assert!(report.silhouette.is_none());

        let table = report.to_string_table();
        assert!(table.contains("Score: 6.00 -> 3.00"));
        assert!(table.contains("Accuracy: 90.00%"));
    }

    #[test]
    fn test_report_groups() {
        let (cm, labels) = sample();
        let flat = FlatClustering {
            assignment: vec![1, 0, 0],
            n_clusters: 2,
        };
        let report =
            ReorderingReport::new(&cm, &labels, &result_for(vec![2, 1, 0]), Some(&flat)).unwrap();
        assert_eq!(report.groups, vec![vec!["c".to_string(), "b".to_string()], vec!["a".to_string()]]);
        assert_eq!(report.non_trivial_groups().count(), 1);
        // b and c confuse each other, a stands apart.
        let score = report.silhouette.unwrap();
        assert!(score > 0.0 && score <= 1.0, "score {}", score);
        assert!(report.to_string_table().contains("Silhouette:"));
        assert!(report.to_string_table().contains("Groups:"));

        let json = serde_json::to_string(&report).unwrap();
        let back: ReorderingReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.groups, report.groups);
        assert_eq!(back.permutation, vec![2, 1, 0]);
        assert_eq!(back.termination, Termination::Converged);
    }

    #[test]
    fn test_report_rejects_mismatch() {
        let (cm, _) = sample();
        let err = ReorderingReport::new(&cm, &LabelSet::numbered(2), &result_for(vec![0, 1, 2]), None);
        assert!(err.is_err());
        let flat = FlatClustering {
            assignment: vec![0, 0],
            n_clusters: 1,
        };
        let labels = LabelSet::numbered(3);
        assert!(ReorderingReport::new(&cm, &labels, &result_for(vec![0, 1, 2]), Some(&flat)).is_err());
    }
}
