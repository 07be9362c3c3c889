//! Linkage rules for agglomerative clustering.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClusterError;

/// Inter-cluster distance policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Minimum distance between members.
    Single,
    /// Maximum distance between members.
    Complete,
    /// Unweighted mean distance between members (UPGMA).
    #[default]
    Average,
}

impl Linkage {
    /// Lance–Williams update: distance from the union of clusters `i` and
    /// `j` (sizes `n_i`, `n_j`) to a third cluster, given its distances
    /// `d_i` and `d_j` to each of them.
    #[inline]
    pub fn update(&self, d_i: f64, d_j: f64, n_i: usize, n_j: usize) -> f64 {
        match self {
            Linkage::Single => d_i.min(d_j),
            Linkage::Complete => d_i.max(d_j),
            Linkage::Average => {
                let (n_i, n_j) = (n_i as f64, n_j as f64);
                (n_i * d_i + n_j * d_j) / (n_i + n_j)
            }
        }
    }
}

impl FromStr for Linkage {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            other => Err(ClusterError::InvalidConfiguration(format!(
                "unknown linkage '{}', expected single, complete or average",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Linkage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Linkage::Single => write!(f, "single"),
            Linkage::Complete => write!(f, "complete"),
            Linkage::Average => write!(f, "average"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("single".parse::<Linkage>().unwrap(), Linkage::Single);
        assert_eq!("Complete".parse::<Linkage>().unwrap(), Linkage::Complete);
        assert_eq!(" AVERAGE ".parse::<Linkage>().unwrap(), Linkage::Average);
        assert!(matches!(
            "ward".parse::<Linkage>(),
            Err(ClusterError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_update_rules() {
        assert_eq!(Linkage::Single.update(0.2, 0.5, 1, 3), 0.2);
        assert_eq!(Linkage::Complete.update(0.2, 0.5, 1, 3), 0.5);
        assert!((Linkage::Average.update(0.2, 0.6, 1, 3) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Linkage::Single).unwrap(), "\"single\"");
        let l: Linkage = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(l, Linkage::Complete);
    }
}
