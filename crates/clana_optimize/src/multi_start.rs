//! Independent restarts run in parallel.

use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use clana_core::{ConfusionMatrix, Permutation};

use crate::config::OptimizerConfig;
use crate::error::{OptimizeError, Result};
use crate::optimizer::{OptimizationResult, Optimizer};

/// Outcome of [`optimize_multi_start`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiStartResult {
    /// Lowest-cost run.
    pub best: OptimizationResult,
    /// Index of the restart that produced `best`.
    pub best_restart: usize,
    /// Final cost of every restart, by index.
    pub costs: Vec<f64>,
}

/// Run `restarts` independent searches from the identity ordering and keep
/// the cheapest.
///
/// See [`optimize_multi_start_from`].
pub fn optimize_multi_start(
    matrix: &ConfusionMatrix,
    config: &OptimizerConfig,
    restarts: usize,
) -> Result<MultiStartResult> {
    optimize_multi_start_from(matrix, config, restarts, &Permutation::identity(matrix.size()))
}

/// Run `restarts` independent searches and keep the cheapest.
///
/// Restart `k` draws from `config.seed.derive("restart-{k}")`. Restart 0
/// starts from `start`; the others start from a shuffle of it drawn from
/// their own stream. Ties in final cost go to the smallest restart index,
/// so the result does not depend on thread scheduling.
pub fn optimize_multi_start_from(
    matrix: &ConfusionMatrix,
    config: &OptimizerConfig,
    restarts: usize,
    start: &Permutation,
) -> Result<MultiStartResult> {
    if restarts == 0 {
        return Err(OptimizeError::InvalidConfiguration(
            "restarts must be at least 1".to_string(),
        ));
    }
    // Surface config and shape errors once, before spawning work.
    Optimizer::with_start(matrix, config.clone(), start.clone())?;

    let runs: Vec<OptimizationResult> = (0..restarts)
        .into_par_iter()
        .map(|k| -> Result<OptimizationResult> {
            let seed = config.seed.derive(&format!("restart-{}", k));
            let mut rng = seed.to_rng();
            let mut order = start.as_slice().to_vec();
            if k > 0 {
                order.shuffle(&mut rng);
            }
            let start = Permutation::new(order)?;
            let run = Optimizer::with_start(matrix, config.clone(), start)?.run(&mut rng);
            tracing::debug!(
                "Restart {} {} after {} iterations with score {:.2}",
                k,
                run.termination,
                run.iterations,
                run.cost
            );
            Ok(run)
        })
        .collect::<Result<_>>()?;

    let costs: Vec<f64> = runs.iter().map(|r| r.cost).collect();
    let best_restart = costs
        .iter()
        .enumerate()
        .min_by(|(i, a), (j, b)| a.total_cmp(b).then(i.cmp(j)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let best = runs.into_iter().nth(best_restart).ok_or_else(|| {
        OptimizeError::InvalidConfiguration("multi-start produced no runs".to_string())
    })?;

    tracing::info!(
        "Best of {} restarts: #{} with score {:.2}",
        restarts,
        best_restart,
        best.cost
    );

    Ok(MultiStartResult {
        best,
        best_restart,
        costs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks() -> ConfusionMatrix {
        ConfusionMatrix::from_counts(&[
            vec![9, 0, 4, 0, 0, 1],
            vec![0, 8, 0, 0, 3, 0],
            vec![5, 0, 7, 0, 0, 0],
            vec![0, 0, 0, 9, 0, 2],
            vec![0, 4, 0, 0, 6, 0],
            vec![1, 0, 0, 3, 0, 8],
        ])
        .unwrap()
    }

    #[test]
    fn test_best_is_minimum_of_restarts() {
        let config = OptimizerConfig::default()
            .with_seed(5)
            .with_max_stale_iterations(500);
        let result = optimize_multi_start(&blocks(), &config, 4).unwrap();

        assert_eq!(result.costs.len(), 4);
        assert!(result.costs.iter().all(|&c| result.best.cost <= c));
        assert_eq!(result.best.cost, result.costs[result.best_restart]);
        let first_min = result
            .costs
            .iter()
            .position(|&c| c == result.best.cost)
            .unwrap();
        assert_eq!(first_min, result.best_restart);
    }

    #[test]
    fn test_deterministic() {
        let config = OptimizerConfig::default()
            .with_seed(11)
            .with_max_iterations(3_000);
        let a = optimize_multi_start(&blocks(), &config, 3).unwrap();
        let b = optimize_multi_start(&blocks(), &config, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_restart_matches_plain_run() {
        let config = OptimizerConfig::default()
            .with_seed(2)
            .with_max_iterations(2_000);
        let multi = optimize_multi_start(&blocks(), &config, 1).unwrap();
        let mut rng = config.seed.derive("restart-0").to_rng();
        let single = Optimizer::new(&blocks(), config).unwrap().run(&mut rng);
        assert_eq!(multi.best, single);
    }

    #[test]
    fn test_rejects_zero_restarts() {
        let err = optimize_multi_start(&blocks(), &OptimizerConfig::default(), 0).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidConfiguration(_)));
    }
}
