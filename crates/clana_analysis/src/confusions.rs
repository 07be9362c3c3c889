//! Largest off-diagonal cells.

use serde::{Deserialize, Serialize};

use clana_core::ConfusionMatrix;

/// One off-diagonal cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confusion {
    /// True label index.
    pub target: usize,
    /// Predicted label index.
    pub pred: usize,
    /// Cell value.
    pub count: f64,
}

/// Get the top confusions (off-diagonal cells with the largest values).
///
/// Sorted by count descending, then by `(target, pred)` ascending. Empty
/// cells are skipped, so fewer than `k` entries may come back.
pub fn top_confusions(matrix: &ConfusionMatrix, k: usize) -> Vec<Confusion> {
    let n = matrix.size();
    let mut cells: Vec<Confusion> = (0..n)
        .flat_map(|target| (0..n).map(move |pred| (target, pred)))
        .filter(|&(target, pred)| target != pred)
        .map(|(target, pred)| Confusion {
            target,
            pred,
            count: matrix.get(target, pred),
        })
        .filter(|c| c.count > 0.0)
        .collect();

    // Stable sort keeps the row-major (target, pred) order among equal counts.
    cells.sort_by(|a, b| b.count.total_cmp(&a.count));
    cells.truncate(k);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_confusions() {
        let cm = ConfusionMatrix::from_counts(&[
            vec![9, 2, 4],
            vec![4, 8, 0],
            vec![1, 7, 5],
        ])
        .unwrap();

        let top = top_confusions(&cm, 3);
        assert_eq!(top.len(), 3);
        assert_eq!((top[0].target, top[0].pred, top[0].count), (2, 1, 7.0));
        // Tie at 4: (0, 2) before (1, 0).
        assert_eq!((top[1].target, top[1].pred), (0, 2));
        assert_eq!((top[2].target, top[2].pred), (1, 0));

        assert_eq!(top_confusions(&cm, 100).len(), 5);
        assert!(top_confusions(&cm, 0).is_empty());
    }
}
