//! Silhouette score of a flat grouping of classes.
//!
//! Classes are compared with the same confusion distance the dendrogram is
//! built on, so a grouping that keeps heavily confused classes together and
//! separates the rest scores close to 1.

use clana_cluster::{confusion_distance, FlatClustering};
use clana_core::ConfusionMatrix;

/// Mean silhouette coefficient of `clustering` over all labels.
///
/// For label `i` in group `A`, `a` is the mean distance to the other members
/// of `A` and `b` the smallest mean distance to another group; the
/// coefficient is `(b - a) / max(a, b)`, and 0 for a label alone in its
/// group.
///
/// Returns `None` unless there are between 2 and `n - 1` groups, or when
/// the clustering does not cover the matrix.
pub fn silhouette(matrix: &ConfusionMatrix, clustering: &FlatClustering) -> Option<f64> {
    let n = matrix.size();
    let k = clustering.n_clusters;
    if clustering.assignment.len() != n || k < 2 || k + 1 > n {
        return None;
    }

    let sizes = clustering.groups().iter().map(Vec::len).collect::<Vec<_>>();
    let mut total = 0.0;
    let mut sums = vec![0.0; k];

    for i in 0..n {
        let own = clustering.cluster_of(i);
        if sizes[own] < 2 {
            continue;
        }

        sums.iter_mut().for_each(|s| *s = 0.0);
        for j in (0..n).filter(|&j| j != i) {
            sums[clustering.cluster_of(j)] += confusion_distance(matrix.get(i, j), matrix.get(j, i));
        }

        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Some(total / n as f64)
}
