//! Observer hooks for optimization runs.
//!
//! Observers see scalars only (iteration counts and costs); the permutation
//! under search stays private to the optimizer until the run ends.

use crate::moves::MoveKind;
use crate::optimizer::Termination;

/// Trait for optimization observers.
pub trait OptimizationObserver {
    /// Called once before the first iteration.
    fn on_start(&mut self, _n_labels: usize, _initial_cost: f64) {}

    /// Called whenever the best cost seen so far drops.
    fn on_improvement(&mut self, _iteration: usize, _best_cost: f64, _kind: MoveKind) {}

    /// Called once after the run terminates.
    fn on_finish(&mut self, _termination: Termination, _iterations: usize, _best_cost: f64) {}

    /// Get the observer name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl OptimizationObserver for NoopObserver {
    fn name(&self) -> &str {
        "NoopObserver"
    }
}

/// Reports progress through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    initial_cost: f64,
    log_every_improvement: bool,
}

impl LoggingObserver {
    /// Create a logging observer. With `log_every_improvement` each new best
    /// is logged at INFO, otherwise at DEBUG.
    pub fn new(log_every_improvement: bool) -> Self {
        Self {
            initial_cost: 0.0,
            log_every_improvement,
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new(false)
    }
}

impl OptimizationObserver for LoggingObserver {
    fn on_start(&mut self, n_labels: usize, initial_cost: f64) {
        self.initial_cost = initial_cost;
        tracing::info!("Optimizing order of {} labels, starting score: {:.2}", n_labels, initial_cost);
    }

    fn on_improvement(&mut self, iteration: usize, best_cost: f64, kind: MoveKind) {
        if self.log_every_improvement {
            tracing::info!("Current best: {:.2} (step={}, move={})", best_cost, iteration, kind);
        } else {
            tracing::debug!("Current best: {:.2} (step={}, move={})", best_cost, iteration, kind);
        }
    }

    fn on_finish(&mut self, termination: Termination, iterations: usize, best_cost: f64) {
        tracing::info!(
            "Optimization {} after {} iterations: score {:.2} -> {:.2}",
            termination,
            iterations,
            self.initial_cost,
            best_cost
        );
    }

    fn name(&self) -> &str {
        "LoggingObserver"
    }
}

/// Records the best-cost trajectory of a run.
#[derive(Debug, Default, Clone)]
pub struct BestCostRecorder {
    /// `(iteration, best_cost)` pairs; the start is recorded at iteration 0.
    pub history: Vec<(usize, f64)>,
    /// How the run ended, once finished.
    pub termination: Option<Termination>,
}

impl BestCostRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the recorded best cost never increased.
    pub fn is_monotonic(&self) -> bool {
        self.history.windows(2).all(|w| w[1].1 <= w[0].1)
    }
}

impl OptimizationObserver for BestCostRecorder {
    fn on_start(&mut self, _n_labels: usize, initial_cost: f64) {
        self.history.clear();
        self.history.push((0, initial_cost));
    }

    fn on_improvement(&mut self, iteration: usize, best_cost: f64, _kind: MoveKind) {
        self.history.push((iteration, best_cost));
    }

    fn on_finish(&mut self, termination: Termination, _iterations: usize, _best_cost: f64) {
        self.termination = Some(termination);
    }

    fn name(&self) -> &str {
        "BestCostRecorder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_monotonic() {
        let mut rec = BestCostRecorder::new();
        rec.on_start(4, 10.0);
        rec.on_improvement(3, 8.0, MoveKind::Swap);
        rec.on_improvement(9, 5.5, MoveKind::Relocate);
        rec.on_finish(Termination::Converged, 20, 5.5);

        assert!(rec.is_monotonic());
        assert_eq!(rec.history.len(), 3);
        assert_eq!(rec.termination, Some(Termination::Converged));

        rec.history.push((30, 6.0));
        assert!(!rec.is_monotonic());
    }
}
