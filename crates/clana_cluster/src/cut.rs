//! Flat clusterings cut from a dendrogram.

use serde::{Deserialize, Serialize};

use crate::dendrogram::Dendrogram;
use crate::error::{ClusterError, Result};

/// How to cut a dendrogram into flat groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatCut {
    /// Join labels connected by merges at distance `<= t`.
    DistanceThreshold(f64),
    /// Undo the last `k - 1` merges, leaving exactly `k` groups.
    ClusterCount(usize),
}

/// Assignment of every label to a group.
///
/// Group ids are `0..n_clusters`, numbered by first appearance in the
/// dendrogram's leaf order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatClustering {
    /// `assignment[label]` is the group of `label`.
    pub assignment: Vec<usize>,
    /// Number of groups.
    pub n_clusters: usize,
}

impl FlatClustering {
    /// Group of `label`.
    pub fn cluster_of(&self, label: usize) -> usize {
        self.assignment[label]
    }

    /// Members of each group, labels ascending.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.n_clusters];
        for (label, &c) in self.assignment.iter().enumerate() {
            groups[c].push(label);
        }
        groups
    }

    /// Groups with more than one member.
    pub fn non_trivial_groups(&self) -> Vec<Vec<usize>> {
        self.groups().into_iter().filter(|g| g.len() > 1).collect()
    }
}

impl Dendrogram {
    /// Cut the tree into flat groups.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::InvalidClusterCount`] if `k` is outside `1..=n`
    /// - [`ClusterError::InvalidConfiguration`] for a negative or non-finite
    ///   threshold
    pub fn cut(&self, cut: FlatCut) -> Result<FlatClustering> {
        let n = self.n_labels();
        let steps = match cut {
            FlatCut::ClusterCount(k) => {
                if k == 0 || k > n {
                    return Err(ClusterError::InvalidClusterCount {
                        requested: k,
                        n_labels: n,
                    });
                }
                n - k
            }
            FlatCut::DistanceThreshold(t) => {
                if !t.is_finite() || t < 0.0 {
                    return Err(ClusterError::InvalidConfiguration(format!(
                        "distance threshold {} must be finite and >= 0",
                        t
                    )));
                }
                // Merge heights never decrease for the supported linkages.
                self.merges()
                    .iter()
                    .take_while(|step| step.distance <= t)
                    .count()
            }
        };

        let roots = self.roots_after(steps);
        let mut ids: Vec<Option<usize>> = vec![None; n + self.merges().len()];
        let mut assignment = vec![0; n];
        let mut n_clusters = 0;
        for &label in self.leaf_order().as_slice() {
            let root = roots[label];
            let id = *ids[root].get_or_insert_with(|| {
                n_clusters += 1;
                n_clusters - 1
            });
            assignment[label] = id;
        }

        tracing::debug!("Cut {} labels into {} groups ({:?})", n, n_clusters, cut);
        Ok(FlatClustering {
            assignment,
            n_clusters,
        })
    }
}
