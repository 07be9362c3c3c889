//! Optimizer configuration.

use std::time::Duration;

use clana_core::Seed;
use serde::{Deserialize, Serialize};

use crate::error::{OptimizeError, Result};
use crate::schedule::TemperatureSchedule;

/// Relative probabilities of the move kinds.
///
/// Weights need not sum to one; they are normalized when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveWeights {
    /// Weight of pairwise swaps.
    pub swap: f64,
    /// Weight of block reversals.
    pub reverse: f64,
    /// Weight of block relocations.
    pub relocate: f64,
}

impl Default for MoveWeights {
    fn default() -> Self {
        Self {
            swap: 0.5,
            reverse: 0.0,
            relocate: 0.5,
        }
    }
}

impl MoveWeights {
    /// Only pairwise swaps.
    pub fn swaps_only() -> Self {
        Self {
            swap: 1.0,
            reverse: 0.0,
            relocate: 0.0,
        }
    }

    /// Reject negative or non-finite weights and an all-zero mix.
    pub fn validate(&self) -> Result<()> {
        for (name, w) in [("swap", self.swap), ("reverse", self.reverse), ("relocate", self.relocate)] {
            if !w.is_finite() || w < 0.0 {
                return Err(OptimizeError::InvalidConfiguration(format!(
                    "move weight {}={} must be finite and >= 0",
                    name, w
                )));
            }
        }
        if self.swap + self.reverse + self.relocate <= 0.0 {
            return Err(OptimizeError::InvalidConfiguration(
                "at least one move weight must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for [`crate::Optimizer`].
///
/// # Example
///
/// ```rust
/// use clana_optimize::{OptimizerConfig, TemperatureSchedule};
///
/// let config = OptimizerConfig::default()
///     .with_seed(7)
///     .with_max_iterations(50_000)
///     .with_temperature(TemperatureSchedule::new(100.0, 0.999));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Seed of the random source for a run.
    pub seed: Seed,
    /// Hard cap on iterations; reaching it ends in `BudgetExhausted`.
    pub max_iterations: usize,
    /// Consecutive iterations without a new best before `Converged`.
    pub max_stale_iterations: usize,
    /// Annealing schedule; `None` accepts strict improvements only.
    pub temperature: Option<TemperatureSchedule>,
    /// Move kind mix.
    pub move_weights: MoveWeights,
    /// Optional wall-clock budget in milliseconds.
    pub time_budget_ms: Option<u64>,
    /// Accepted moves between full cost recomputations.
    pub resync_interval: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            seed: Seed::default(),
            max_iterations: 200_000,
            max_stale_iterations: 20_000,
            temperature: None,
            move_weights: MoveWeights::default(),
            time_budget_ms: None,
            resync_interval: 1_000,
        }
    }
}

impl OptimizerConfig {
    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Seed::new(seed);
        self
    }

    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence patience.
    pub fn with_max_stale_iterations(mut self, max_stale_iterations: usize) -> Self {
        self.max_stale_iterations = max_stale_iterations;
        self
    }

    /// Enable simulated annealing.
    pub fn with_temperature(mut self, schedule: TemperatureSchedule) -> Self {
        self.temperature = Some(schedule);
        self
    }

    /// Set the move kind mix.
    pub fn with_move_weights(mut self, weights: MoveWeights) -> Self {
        self.move_weights = weights;
        self
    }

    /// Bound the run by wall-clock time.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = Some(budget.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Wall-clock budget, if any.
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    /// Fail fast on settings that cannot drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(OptimizeError::InvalidConfiguration(
                "max_iterations must be positive".to_string(),
            ));
        }
        if self.max_stale_iterations == 0 {
            return Err(OptimizeError::InvalidConfiguration(
                "max_stale_iterations must be positive".to_string(),
            ));
        }
        if self.resync_interval == 0 {
            return Err(OptimizeError::InvalidConfiguration(
                "resync_interval must be positive".to_string(),
            ));
        }
        if self.time_budget_ms == Some(0) {
            return Err(OptimizeError::InvalidConfiguration(
                "time_budget_ms must be positive".to_string(),
            ));
        }
        if let Some(schedule) = &self.temperature {
            schedule.validate()?;
        }
        self.move_weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(OptimizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_budgets() {
        let c = OptimizerConfig::default().with_max_iterations(0);
        assert!(matches!(c.validate(), Err(OptimizeError::InvalidConfiguration(_))));

        let c = OptimizerConfig::default().with_max_stale_iterations(0);
        assert!(matches!(c.validate(), Err(OptimizeError::InvalidConfiguration(_))));

        let c = OptimizerConfig { time_budget_ms: Some(0), ..Default::default() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_weights_and_schedule() {
        let c = OptimizerConfig::default()
            .with_move_weights(MoveWeights { swap: 0.0, reverse: 0.0, relocate: 0.0 });
        assert!(c.validate().is_err());

        let c = OptimizerConfig::default()
            .with_move_weights(MoveWeights { swap: -1.0, reverse: 1.0, relocate: 0.0 });
        assert!(c.validate().is_err());

        let c = OptimizerConfig::default().with_temperature(TemperatureSchedule::new(10.0, 2.0));
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c: OptimizerConfig =
            serde_json::from_str(r#"{"seed": 3, "max_iterations": 10, "move_weights": {"swap": 1.0}}"#)
                .unwrap();
        assert_eq!(c.seed, Seed::new(3));
        assert_eq!(c.max_iterations, 10);
        assert_eq!(c.max_stale_iterations, 20_000);
        assert_eq!(c.move_weights.swap, 1.0);
        assert_eq!(c.move_weights.relocate, 0.5);
        assert!(c.temperature.is_none());
    }

    #[test]
    fn test_time_budget_in_milliseconds() {
        let c = OptimizerConfig::default().with_time_budget(Duration::from_millis(1_500));
        assert_eq!(c.time_budget_ms, Some(1_500));
        assert_eq!(c.time_budget(), Some(Duration::from_millis(1_500)));
        assert!(OptimizerConfig::default().time_budget().is_none());

        let c: OptimizerConfig = serde_json::from_str(r#"{"time_budget_ms": 250}"#).unwrap();
        assert_eq!(c.time_budget(), Some(Duration::from_millis(250)));
    }
}
