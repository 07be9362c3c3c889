//! Confusion-derived dissimilarity between classes.

/// Distance between two classes that confuse each other `m_ij + m_ji` times.
///
/// Lies in (0, 1]: classes that are never confused sit at distance 1 and
/// heavy mutual confusion pulls the distance toward 0.
#[inline]
pub fn confusion_distance(m_ij: f64, m_ji: f64) -> f64 {
    1.0 / (1.0 + m_ij + m_ji)
}

/// Dense symmetric distance table between `n` items.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DistanceTable {
    n: usize,
    data: Vec<f64>,
}

impl DistanceTable {
    /// Build from a cell accessor `value(i, j)` of an `n`×`n` matrix.
    pub(crate) fn from_confusions<F>(n: usize, value: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = confusion_distance(value(i, j), value(j, i));
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Self { n, data }
    }

    #[inline]
    pub(crate) fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub(crate) fn set(&mut self, i: usize, j: usize, d: f64) {
        self.data[i * self.n + j] = d;
        self.data[j * self.n + i] = d;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_distance() {
        assert_eq!(confusion_distance(0.0, 0.0), 1.0);
        assert_eq!(confusion_distance(2.0, 1.0), 0.25);
    }

    #[test]
    fn test_table_is_symmetric_with_zero_diagonal() {
        let m = [[5.0, 1.0, 0.0], [3.0, 4.0, 9.0], [0.0, 0.0, 2.0]];
        let t = DistanceTable::from_confusions(3, |i, j| m[i][j]);
        for i in 0..3 {
            assert_eq!(t.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(t.get(i, j), t.get(j, i));
            }
        }
        assert_eq!(t.get(0, 1), 0.2);
        assert_eq!(t.get(0, 2), 1.0);
        assert_eq!(t.get(1, 2), 0.1);
    }
}
