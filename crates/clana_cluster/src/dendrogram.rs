//! Merge tree produced by agglomerative clustering.

use serde::{Deserialize, Serialize};

use clana_core::Permutation;

use crate::error::Result;

/// Node of a dendrogram. Children are owned; there are no back-references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClusterNode {
    /// A single class.
    Leaf {
        /// Original label index.
        label: usize,
    },
    /// Union of two clusters.
    Merge {
        /// Child holding the smallest leaf.
        left: Box<ClusterNode>,
        /// The other child.
        right: Box<ClusterNode>,
        /// Linkage distance at which the children were joined.
        distance: f64,
        /// Number of leaves below this node.
        size: usize,
    },
}

impl ClusterNode {
    /// Number of leaves below (and including) this node.
    pub fn size(&self) -> usize {
        match self {
            ClusterNode::Leaf { .. } => 1,
            ClusterNode::Merge { size, .. } => *size,
        }
    }

    /// Merge distance, or 0 for a leaf.
    pub fn distance(&self) -> f64 {
        match self {
            ClusterNode::Leaf { .. } => 0.0,
            ClusterNode::Merge { distance, .. } => *distance,
        }
    }

    /// True for a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, ClusterNode::Leaf { .. })
    }

    /// Labels below this node, left to right.
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.size());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                ClusterNode::Leaf { label } => out.push(*label),
                ClusterNode::Merge { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        out
    }
}

/// One agglomeration step.
///
/// Ids follow the linkage-matrix convention: labels are clusters `0..n`,
/// and the cluster created at step `k` has id `n + k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeStep {
    /// Id of the cluster that became the left child.
    pub left: usize,
    /// Id of the cluster that became the right child.
    pub right: usize,
    /// Linkage distance between them.
    pub distance: f64,
    /// Leaves in the merged cluster.
    pub size: usize,
}

/// Complete merge tree over `n_labels` classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dendrogram {
    n_labels: usize,
    root: ClusterNode,
    merges: Vec<MergeStep>,
    leaf_order: Permutation,
}

impl Dendrogram {
    /// Fails with a shape error if the leaves are not a bijection of
    /// `0..n_labels`.
    pub(crate) fn new(n_labels: usize, root: ClusterNode, merges: Vec<MergeStep>) -> Result<Self> {
        let leaf_order = Permutation::new(root.leaves())?;
        Ok(Self {
            n_labels,
            root,
            merges,
            leaf_order,
        })
    }

    /// Number of leaves.
    pub fn n_labels(&self) -> usize {
        self.n_labels
    }

    /// Root node.
    pub fn root(&self) -> &ClusterNode {
        &self.root
    }

    /// Merge history, `n_labels - 1` steps in creation order.
    pub fn merges(&self) -> &[MergeStep] {
        &self.merges
    }

    /// Left-to-right leaf sequence, usable as a display ordering.
    pub fn leaf_order(&self) -> &Permutation {
        &self.leaf_order
    }

    /// Cluster id that owns each label after applying the first `steps`
    /// merges. Ids are the linkage-matrix ids of the surviving clusters.
    pub(crate) fn roots_after(&self, steps: usize) -> Vec<usize> {
        let n = self.n_labels;
        let mut parent: Vec<usize> = (0..n + self.merges.len()).collect();
        for (k, step) in self.merges.iter().take(steps).enumerate() {
            parent[step.left] = n + k;
            parent[step.right] = n + k;
        }
        (0..n)
            .map(|label| {
                let mut id = label;
                while parent[id] != id {
                    id = parent[id];
                }
                id
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(label: usize) -> Box<ClusterNode> {
        Box::new(ClusterNode::Leaf { label })
    }

    fn sample() -> Dendrogram {
        // ((2, 0), 1)
        let inner = ClusterNode::Merge { left: leaf(2), right: leaf(0), distance: 0.1, size: 2 };
        let root = ClusterNode::Merge { left: Box::new(inner), right: leaf(1), distance: 0.5, size: 3 };
        let merges = vec![
            MergeStep { left: 0, right: 2, distance: 0.1, size: 2 },
            MergeStep { left: 1, right: 3, distance: 0.5, size: 3 },
        ];
        Dendrogram::new(3, root, merges).unwrap()
    }

    #[test]
    fn test_leaf_order() {
        let d = sample();
        assert_eq!(d.leaf_order().as_slice(), &[2, 0, 1]);
        assert_eq!(d.root().size(), 3);
        assert_eq!(d.root().distance(), 0.5);
        assert!(!d.root().is_leaf());
    }

    #[test]
    fn test_roots_after() {
        let d = sample();
        assert_eq!(d.roots_after(0), vec![0, 1, 2]);
        assert_eq!(d.roots_after(1), vec![3, 1, 3]);
        assert_eq!(d.roots_after(2), vec![4, 4, 4]);
    }
}
