//! Agglomerative clustering of classes.
//!
//! Classic nearest-pair merging over a dense distance table with
//! Lance–Williams updates: O(N²) memory and O(N³) time, which is ample for
//! label sets of a few hundred classes.
//!
//! Ties between equally distant pairs are broken by the smallest
//! `(min_id, max_id)` of cluster ids, where leaves are `0..n` and the merge
//! at step `k` creates id `n + k`. Results are therefore deterministic.
//!
//! The left child of every merge is the one holding the smallest leaf, so
//! the leaf order keeps the input order wherever the tree allows it.

use serde::{Deserialize, Serialize};

use clana_core::{ConfusionMatrix, Permutation};

use crate::cut::{FlatClustering, FlatCut};
use crate::dendrogram::{ClusterNode, Dendrogram, MergeStep};
use crate::distance::DistanceTable;
use crate::error::{ClusterError, Result};
use crate::linkage::Linkage;

/// Clustering settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Linkage rule.
    pub linkage: Linkage,
    /// Optional flat cut applied after building the tree.
    pub cut: Option<FlatCut>,
}

impl ClusterConfig {
    /// Set the linkage rule.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Set the flat cut.
    pub fn with_cut(mut self, cut: FlatCut) -> Self {
        self.cut = Some(cut);
        self
    }

    /// Reject cuts that cannot be applied to `n_labels` labels: a cluster
    /// count outside `1..=n_labels`, or a negative or non-finite threshold.
    pub fn validate(&self, n_labels: usize) -> Result<()> {
        match self.cut {
            Some(FlatCut::DistanceThreshold(t)) if !t.is_finite() || t < 0.0 => {
                Err(ClusterError::InvalidConfiguration(format!(
                    "distance threshold {} must be finite and >= 0",
                    t
                )))
            }
            Some(FlatCut::ClusterCount(k)) if k == 0 || k > n_labels => {
                Err(ClusterError::InvalidClusterCount {
                    requested: k,
                    n_labels,
                })
            }
            _ => Ok(()),
        }
    }

    /// [`ClusterConfig::validate`] against the size of `matrix`.
    pub fn validate_for(&self, matrix: &ConfusionMatrix) -> Result<()> {
        self.validate(matrix.size())
    }

    /// Build the tree (optionally under a display ordering) and apply the
    /// configured cut.
    pub fn cluster(&self, matrix: &ConfusionMatrix, order: Option<&Permutation>) -> Result<Clustering> {
        self.validate_for(matrix)?;
        let builder = ClusterBuilder::new(self.linkage);
        let dendrogram = match order {
            Some(perm) => builder.build_permuted(matrix, perm)?,
            None => builder.build(matrix)?,
        };
        let flat = self.cut.map(|cut| dendrogram.cut(cut)).transpose()?;
        Ok(Clustering { dendrogram, flat })
    }
}

/// Tree plus the optional flat cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    /// Full merge tree.
    pub dendrogram: Dendrogram,
    /// Groups, when a cut was configured.
    pub flat: Option<FlatClustering>,
}

/// Builds dendrograms from confusion matrices.
///
/// # Example
///
/// ```rust
/// use clana_core::ConfusionMatrix;
/// use clana_cluster::{ClusterBuilder, FlatCut, Linkage};
///
/// let cm = ConfusionMatrix::from_counts(&[
///     vec![9, 6, 0, 0],
///     vec![5, 9, 0, 0],
///     vec![0, 0, 9, 7],
///     vec![0, 0, 4, 9],
/// ]).unwrap();
///
/// let tree = ClusterBuilder::new(Linkage::Average).build(&cm).unwrap();
/// let flat = tree.cut(FlatCut::ClusterCount(2)).unwrap();
/// assert_eq!(flat.groups(), vec![vec![0, 1], vec![2, 3]]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterBuilder {
    linkage: Linkage,
}

struct Slot {
    id: usize,
    min_leaf: usize,
    node: ClusterNode,
}

impl ClusterBuilder {
    /// Create a builder with the given linkage rule.
    pub fn new(linkage: Linkage) -> Self {
        Self { linkage }
    }

    /// Linkage rule in use.
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Cluster the labels of `matrix`.
    pub fn build(&self, matrix: &ConfusionMatrix) -> Result<Dendrogram> {
        let n = matrix.size();
        let table = DistanceTable::from_confusions(n, |i, j| matrix.get(i, j));
        self.agglomerate(n, table, |p| p)
    }

    /// Cluster display positions of `matrix` seen through `order`, then map
    /// leaves back to label indices.
    ///
    /// Only tie-breaking differs from [`ClusterBuilder::build`]; flat group
    /// ids then follow display order.
    pub fn build_permuted(&self, matrix: &ConfusionMatrix, order: &Permutation) -> Result<Dendrogram> {
        let view = matrix.apply(order)?;
        let n = view.size();
        let table = DistanceTable::from_confusions(n, |i, j| view.get(i, j));
        self.agglomerate(n, table, |p| view.label_at(p))
    }

    fn agglomerate<F>(&self, n: usize, mut table: DistanceTable, label_of: F) -> Result<Dendrogram>
    where
        F: Fn(usize) -> usize,
    {
        let external = |id: usize| if id < n { label_of(id) } else { id };

        let mut slots: Vec<Option<Slot>> = (0..n)
            .map(|p| {
                Some(Slot {
                    id: p,
                    min_leaf: p,
                    node: ClusterNode::Leaf { label: label_of(p) },
                })
            })
            .collect();
        let mut merges = Vec::with_capacity(n.saturating_sub(1));

        for step in 0..n.saturating_sub(1) {
            let (a, b, distance) = self.closest_pair(&slots, &table).ok_or_else(|| {
                ClusterError::InvalidConfiguration("no clusters left to merge".to_string())
            })?;

            let (slot_a, slot_b) = match (slots[a].take(), slots[b].take()) {
                (Some(x), Some(y)) => (x, y),
                _ => {
                    return Err(ClusterError::InvalidConfiguration(
                        "merge of an inactive cluster".to_string(),
                    ))
                }
            };
            let (size_a, size_b) = (slot_a.node.size(), slot_b.node.size());

            for (m, _) in slots.iter().enumerate().filter(|(_, s)| s.is_some()) {
                let d = self.linkage.update(table.get(a, m), table.get(b, m), size_a, size_b);
                table.set(a, m, d);
            }

            let (first, second) = if slot_a.min_leaf < slot_b.min_leaf {
                (slot_a, slot_b)
            } else {
                (slot_b, slot_a)
            };
            let size = size_a + size_b;
            merges.push(MergeStep {
                left: external(first.id),
                right: external(second.id),
                distance,
                size,
            });
            slots[a] = Some(Slot {
                id: n + step,
                min_leaf: first.min_leaf,
                node: ClusterNode::Merge {
                    left: Box::new(first.node),
                    right: Box::new(second.node),
                    distance,
                    size,
                },
            });
        }

        let root = slots
            .into_iter()
            .flatten()
            .next()
            .map(|slot| slot.node)
            .ok_or_else(|| ClusterError::InvalidConfiguration("empty matrix".to_string()))?;

        tracing::debug!("Built {} linkage dendrogram over {} labels", self.linkage, n);
        Dendrogram::new(n, root, merges)
    }

    /// Slots `(a, b)` with `a < b` of the closest active pair, and their
    /// distance.
    fn closest_pair(&self, slots: &[Option<Slot>], table: &DistanceTable) -> Option<(usize, usize, f64)> {
        let mut best: Option<(f64, (usize, usize), usize, usize)> = None;
        for (a, sa) in slots.iter().enumerate() {
            let Some(sa) = sa else { continue };
            for (b, sb) in slots.iter().enumerate().skip(a + 1) {
                let Some(sb) = sb else { continue };
                let d = table.get(a, b);
                let key = (sa.id.min(sb.id), sa.id.max(sb.id));
                let better = match &best {
                    None => true,
                    Some((bd, bkey, _, _)) => d < *bd || (d == *bd && key < *bkey),
                };
                if better {
                    best = Some((d, key, a, b));
                }
            }
        }
        best.map(|(d, _, a, b)| (a, b, d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blocks() -> ConfusionMatrix {
        ConfusionMatrix::from_counts(&[
            vec![10, 4, 0, 0, 0],
            vec![6, 10, 0, 0, 0],
            vec![0, 0, 10, 3, 2],
            vec![0, 0, 1, 10, 5],
            vec![0, 0, 3, 2, 10],
        ])
        .unwrap()
    }

    #[test]
    fn test_two_blocks_recovered_for_every_linkage() {
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average] {
            let tree = ClusterBuilder::new(linkage).build(&two_blocks()).unwrap();
            assert_eq!(tree.merges().len(), 4);
            let flat = tree.cut(FlatCut::ClusterCount(2)).unwrap();
            assert_eq!(flat.n_clusters, 2, "{}", linkage);
            let mut groups = flat.groups();
            groups.sort();
            assert_eq!(groups, vec![vec![0, 1], vec![2, 3, 4]], "{}", linkage);
        }
    }

    #[test]
    fn test_merge_ids_and_first_merge() {
        let tree = ClusterBuilder::new(Linkage::Average).build(&two_blocks()).unwrap();
        let first = tree.merges()[0];
        // 0 and 1 confuse each other 10 times, the tightest pair.
        assert_eq!((first.left, first.right), (0, 1));
        assert!((first.distance - 1.0 / 11.0).abs() < 1e-12);
        assert_eq!(first.size, 2);
        let last = tree.merges()[3];
        assert_eq!(last.size, 5);
        assert!(last.left >= 5 && last.right >= 5);
        assert_eq!(tree.root().size(), 5);
    }

    #[test]
    fn test_ties_broken_by_smallest_ids() {
        // No confusion at all: every pair is at distance 1.
        let cm = ConfusionMatrix::from_counts(&[vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]]).unwrap();
        let tree = ClusterBuilder::new(Linkage::Single).build(&cm).unwrap();
        let steps: Vec<_> = tree.merges().iter().map(|m| (m.left, m.right)).collect();
        assert_eq!(steps, vec![(0, 1), (3, 2)]);
        assert_eq!(tree.leaf_order().as_slice(), &[0, 1, 2]);

        let again = ClusterBuilder::new(Linkage::Single).build(&cm).unwrap();
        assert_eq!(tree, again);
    }

    #[test]
    fn test_too_many_clusters() {
        let cm = ConfusionMatrix::from_counts(&[vec![1, 2, 0], vec![0, 1, 0], vec![0, 3, 1]]).unwrap();
        let tree = ClusterBuilder::default().build(&cm).unwrap();
        let err = tree.cut(FlatCut::ClusterCount(5)).unwrap_err();
        assert!(matches!(
            err,
            ClusterError::InvalidClusterCount { requested: 5, n_labels: 3 }
        ));
        assert!(tree.cut(FlatCut::ClusterCount(0)).is_err());
        assert_eq!(tree.cut(FlatCut::ClusterCount(3)).unwrap().n_clusters, 3);
        assert_eq!(tree.cut(FlatCut::ClusterCount(1)).unwrap().assignment, vec![0, 0, 0]);
    }

    #[test]
    fn test_threshold_cut() {
        let tree = ClusterBuilder::new(Linkage::Complete).build(&two_blocks()).unwrap();
        let flat = tree.cut(FlatCut::DistanceThreshold(0.5)).unwrap();
        assert_eq!(flat.n_clusters, 2);
        assert_eq!(tree.cut(FlatCut::DistanceThreshold(0.0)).unwrap().n_clusters, 5);
        assert_eq!(tree.cut(FlatCut::DistanceThreshold(1.0)).unwrap().n_clusters, 1);
        assert!(matches!(
            tree.cut(FlatCut::DistanceThreshold(f64::NAN)),
            Err(ClusterError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_single_label() {
        let cm = ConfusionMatrix::from_counts(&[vec![3]]).unwrap();
        let tree = ClusterBuilder::default().build(&cm).unwrap();
        assert!(tree.merges().is_empty());
        assert!(tree.root().is_leaf());
        assert_eq!(tree.cut(FlatCut::ClusterCount(1)).unwrap().n_clusters, 1);
    }

    #[test]
    fn test_permuted_build_maps_back_to_labels() {
        let cm = two_blocks();
        let order = Permutation::new(vec![4, 2, 3, 1, 0]).unwrap();
        let tree = ClusterBuilder::new(Linkage::Average).build_permuted(&cm, &order).unwrap();
        let flat = tree.cut(FlatCut::ClusterCount(2)).unwrap();

        // Group ids follow display order: the block shown first gets id 0.
        assert_eq!(flat.assignment, vec![1, 1, 0, 0, 0]);

        let mut leaves = tree.leaf_order().as_slice().to_vec();
        leaves.sort();
        assert_eq!(leaves, vec![0, 1, 2, 3, 4]);

        let wrong = Permutation::identity(3);
        assert!(matches!(
            ClusterBuilder::default().build_permuted(&cm, &wrong),
            Err(ClusterError::Core(_))
        ));
    }

    #[test]
    fn test_config_cluster() {
        let config = ClusterConfig::default()
            .with_linkage(Linkage::Single)
            .with_cut(FlatCut::ClusterCount(2));
        let result = config.cluster(&two_blocks(), None).unwrap();
        assert_eq!(result.flat.unwrap().n_clusters, 2);

        let none = ClusterConfig::default().cluster(&two_blocks(), None).unwrap();
        assert!(none.flat.is_none());

        let bad = ClusterConfig::default().with_cut(FlatCut::DistanceThreshold(-1.0));
        assert!(bad.validate(5).is_err());

        let parsed: ClusterConfig =
            serde_json::from_str(r#"{"linkage": "complete", "cut": {"cluster_count": 2}}"#).unwrap();
        assert_eq!(parsed.linkage, Linkage::Complete);
        assert_eq!(parsed.cut, Some(FlatCut::ClusterCount(2)));
    }

    #[test]
    fn test_validate_checks_cluster_count_against_labels() {
        let config = ClusterConfig::default().with_cut(FlatCut::ClusterCount(5));
        assert!(matches!(
            config.validate(3),
            Err(ClusterError::InvalidClusterCount { requested: 5, n_labels: 3 })
        ));
        assert!(config.validate(5).is_ok());
        assert!(config.validate_for(&two_blocks()).is_ok());

        let zero = ClusterConfig::default().with_cut(FlatCut::ClusterCount(0));
        assert!(matches!(
            zero.validate(4),
            Err(ClusterError::InvalidClusterCount { requested: 0, n_labels: 4 })
        ));
        assert!(ClusterConfig::default().validate(0).is_ok());
    }
}
