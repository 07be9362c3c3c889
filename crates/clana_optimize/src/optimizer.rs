//! Stochastic local search over label orderings.
//!
//! # State machine
//!
//! ```text
//! Initialized ──run──> Running ──no new best for max_stale_iterations──> Converged
//!                         └──────max_iterations / time budget─────────> BudgetExhausted
//! ```
//!
//! Each iteration proposes one move, evaluates its cost delta incrementally
//! and either commits it (updating the running cost) or drops it. Without a
//! temperature schedule only strict improvements are accepted; with one,
//! worsening moves pass the Metropolis test and the temperature decays
//! every iteration. The best ordering seen is what the run returns.

use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};

use clana_core::{ConfusionMatrix, CoreError, Permutation};

use crate::config::OptimizerConfig;
use crate::cost::DisorderCost;
use crate::error::Result;
use crate::moves::{Move, MoveGenerator};
use crate::observer::{LoggingObserver, NoopObserver, OptimizationObserver};
use crate::schedule::metropolis;

/// Relative tolerance below which a cost change counts as no change.
const IMPROVEMENT_EPS: f64 = 1e-12;

/// Lifecycle of an [`Optimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerState {
    /// Constructed, initial cost known, no iteration run yet.
    Initialized,
    /// Inside the search loop.
    Running,
    /// No new best within `max_stale_iterations` (or no move exists).
    Converged,
    /// Iteration or time budget hit first.
    BudgetExhausted,
}

/// Terminal state of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Local optimum under the move set.
    Converged,
    /// Budget hit; the result is the best seen so far.
    BudgetExhausted,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Converged => write!(f, "converged"),
            Termination::BudgetExhausted => write!(f, "exhausted its budget"),
        }
    }
}

impl From<Termination> for OptimizerState {
    fn from(t: Termination) -> Self {
        match t {
            Termination::Converged => OptimizerState::Converged,
            Termination::BudgetExhausted => OptimizerState::BudgetExhausted,
        }
    }
}

/// Outcome of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best ordering found (display position -> label index).
    pub permutation: Permutation,
    /// Disorder score of `permutation`, fully recomputed.
    pub cost: f64,
    /// Disorder score of the starting ordering.
    pub initial_cost: f64,
    /// How the run ended.
    pub termination: Termination,
    /// Iterations executed.
    pub iterations: usize,
    /// Moves committed.
    pub accepted_moves: usize,
    /// Times the best cost dropped.
    pub improvements: usize,
}

/// Single-threaded reordering search over one confusion matrix.
///
/// # Example
///
/// ```rust
/// use clana_core::{ConfusionMatrix, Permutation, Seed};
/// use clana_optimize::{Optimizer, OptimizerConfig, OptimizerState};
///
/// let cm = ConfusionMatrix::from_counts(&[vec![10, 0, 0], vec![0, 8, 2], vec![0, 1, 9]]).unwrap();
/// let config = OptimizerConfig::default().with_max_stale_iterations(100);
/// let start = Permutation::new(vec![1, 0, 2]).unwrap();
///
/// let optimizer = Optimizer::with_start(&cm, config, start).unwrap();
/// assert_eq!(optimizer.state(), OptimizerState::Initialized);
///
/// let result = optimizer.run(&mut Seed::new(1).to_rng());
/// assert!(result.cost <= 3.0);
/// ```
#[derive(Debug)]
pub struct Optimizer {
    cost: DisorderCost,
    config: OptimizerConfig,
    generator: MoveGenerator,
    state: OptimizerState,
    perm: Permutation,
    /// Label index -> display position for `perm`.
    inverse: Vec<usize>,
    current_cost: f64,
    best: Permutation,
    best_cost: f64,
    initial_cost: f64,
    temperature: Option<f64>,
    iterations: usize,
    accepted: usize,
    improvements: usize,
    stale: usize,
    since_resync: usize,
}

impl Optimizer {
    /// Start from the identity ordering.
    pub fn new(matrix: &ConfusionMatrix, config: OptimizerConfig) -> Result<Self> {
        Self::with_start(matrix, config, Permutation::identity(matrix.size()))
    }

    /// Start from a caller-supplied ordering.
    ///
    /// Fails with a shape error if `start` has the wrong length, and with
    /// `InvalidConfiguration` before any work if `config` is invalid.
    pub fn with_start(matrix: &ConfusionMatrix, config: OptimizerConfig, start: Permutation) -> Result<Self> {
        config.validate()?;
        if start.len() != matrix.size() {
            return Err(CoreError::Shape(format!(
                "start permutation has length {}, matrix is {} x {}",
                start.len(),
                matrix.size(),
                matrix.size()
            ))
            .into());
        }

        let generator = MoveGenerator::new(&config.move_weights)?;
        let cost = DisorderCost::new(matrix);
        let initial_cost = cost.cost(&start);
        let inverse = start.inverse().into_vec();
        let temperature = config.temperature.map(|s| s.initial_temp);

        Ok(Self {
            cost,
            config,
            generator,
            state: OptimizerState::Initialized,
            best: start.clone(),
            perm: start,
            inverse,
            current_cost: initial_cost,
            best_cost: initial_cost,
            initial_cost,
            temperature,
            iterations: 0,
            accepted: 0,
            improvements: 0,
            stale: 0,
            since_resync: 0,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OptimizerState {
        self.state
    }

    /// Cost of the starting ordering.
    pub fn initial_cost(&self) -> f64 {
        self.initial_cost
    }

    /// Run to termination.
    pub fn run<R: Rng + ?Sized>(self, rng: &mut R) -> OptimizationResult {
        self.run_with_observer(rng, &mut NoopObserver)
    }

    /// Run to termination, reporting progress to `observer`.
    pub fn run_with_observer<R, O>(mut self, rng: &mut R, observer: &mut O) -> OptimizationResult
    where
        R: Rng + ?Sized,
        O: OptimizationObserver + ?Sized,
    {
        let n = self.perm.len();
        let started = Instant::now();
        let time_budget = self.config.time_budget();

        self.state = OptimizerState::Running;
        observer.on_start(n, self.initial_cost);

        let termination = loop {
            if self.iterations >= self.config.max_iterations {
                break Termination::BudgetExhausted;
            }
            if let Some(budget) = time_budget {
                if started.elapsed() >= budget {
                    break Termination::BudgetExhausted;
                }
            }
            if self.stale >= self.config.max_stale_iterations {
                break Termination::Converged;
            }
            let Some(mv) = self.generator.propose(n, rng) else {
                break Termination::Converged;
            };

            self.iterations += 1;
            self.step(mv, rng, observer);
        };

        self.state = termination.into();
        let cost = self.cost.cost(&self.best);
        observer.on_finish(termination, self.iterations, cost);

        OptimizationResult {
            permutation: self.best,
            cost,
            initial_cost: self.initial_cost,
            termination,
            iterations: self.iterations,
            accepted_moves: self.accepted,
            improvements: self.improvements,
        }
    }

    fn step<R, O>(&mut self, mv: Move, rng: &mut R, observer: &mut O)
    where
        R: Rng + ?Sized,
        O: OptimizationObserver + ?Sized,
    {
        let delta = self
            .cost
            .move_delta(self.perm.as_slice(), &self.inverse, &mv);

        let improving = delta < -tolerance(self.current_cost);
        let accept = match self.temperature {
            None => improving,
            Some(t) => improving || metropolis(delta, t, rng),
        };
        if let (Some(t), Some(schedule)) = (self.temperature.as_mut(), self.config.temperature) {
            *t *= schedule.decay_rate;
        }

        if accept {
            self.commit(&mv, delta);
        }

        if self.current_cost < self.best_cost - tolerance(self.best_cost) {
            self.best.clone_from(&self.perm);
            self.best_cost = self.current_cost;
            self.improvements += 1;
            self.stale = 0;
            observer.on_improvement(self.iterations, self.best_cost, mv.kind());
        } else {
            self.stale += 1;
        }
    }

    fn commit(&mut self, mv: &Move, delta: f64) {
        mv.apply(&mut self.perm);
        match *mv {
            Move::Swap { i, j } => {
                self.inverse[self.perm.get(i)] = i;
                self.inverse[self.perm.get(j)] = j;
            }
            _ => {
                let (lo, hi) = mv.touched_range();
                for p in lo..=hi {
                    self.inverse[self.perm.get(p)] = p;
                }
            }
        }

        self.accepted += 1;
        self.since_resync += 1;
        if self.since_resync >= self.config.resync_interval {
            self.current_cost = self.cost.cost(&self.perm);
            self.since_resync = 0;
        } else {
            self.current_cost += delta;
        }
    }
}

#[inline]
fn tolerance(reference: f64) -> f64 {
    IMPROVEMENT_EPS * reference.abs().max(1.0)
}

/// Optimize from the identity ordering using an RNG seeded by `config.seed`.
pub fn optimize(matrix: &ConfusionMatrix, config: &OptimizerConfig) -> Result<OptimizationResult> {
    let mut rng = config.seed.to_rng();
    let optimizer = Optimizer::new(matrix, config.clone())?;
    Ok(optimizer.run_with_observer(&mut rng, &mut LoggingObserver::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MoveWeights;
    use crate::observer::BestCostRecorder;
    use crate::schedule::TemperatureSchedule;
    use crate::OptimizeError;
    use clana_core::Seed;

    fn example() -> ConfusionMatrix {
        ConfusionMatrix::from_counts(&[vec![10, 0, 0], vec![0, 8, 2], vec![0, 1, 9]]).unwrap()
    }

    fn adjacent(perm: &Permutation, a: usize, b: usize) -> bool {
        let inv = perm.inverse();
        inv.get(a).abs_diff(inv.get(b)) == 1
    }

    #[test]
    fn test_example_converges_to_adjacent_pair() {
        let cm = example();
        let config = OptimizerConfig::default().with_max_stale_iterations(200);
        let start = Permutation::new(vec![1, 0, 2]).unwrap();
        let optimizer = Optimizer::with_start(&cm, config, start).unwrap();
        assert_eq!(optimizer.initial_cost(), 6.0);

        let result = optimizer.run(&mut Seed::new(0).to_rng());

        assert_eq!(result.termination, Termination::Converged);
        assert!(adjacent(&result.permutation, 1, 2));
        assert!(result.cost <= 3.0);
        assert!(result.improvements >= 1);
    }

    #[test]
    fn test_budget_exhaustion_returns_best_so_far() {
        let cm = example();
        let config = OptimizerConfig::default()
            .with_max_iterations(1)
            .with_max_stale_iterations(1_000);
        let start = Permutation::new(vec![1, 0, 2]).unwrap();
        let result = Optimizer::with_start(&cm, config, start)
            .unwrap()
            .run(&mut Seed::new(3).to_rng());

        assert_eq!(result.termination, Termination::BudgetExhausted);
        assert_eq!(result.iterations, 1);
        assert!(result.cost <= result.initial_cost);
    }

    #[test]
    fn test_single_label_converges_immediately() {
        let cm = ConfusionMatrix::from_counts(&[vec![4]]).unwrap();
        let result = optimize(&cm, &OptimizerConfig::default()).unwrap();
        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.permutation, Permutation::identity(1));
        assert_eq!(result.cost, 0.0);
    }

    #[test]
    fn test_rejects_bad_start_and_config() {
        let cm = example();
        let err = Optimizer::with_start(&cm, OptimizerConfig::default(), Permutation::identity(2)).unwrap_err();
        assert!(matches!(err, OptimizeError::Core(CoreError::Shape(_))));

        let err = Optimizer::new(&cm, OptimizerConfig::default().with_max_iterations(0)).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let cm = ConfusionMatrix::from_counts(&[
            vec![9, 0, 3, 0, 1],
            vec![0, 7, 0, 4, 0],
            vec![2, 0, 8, 0, 0],
            vec![0, 5, 0, 6, 1],
            vec![1, 0, 0, 2, 9],
        ])
        .unwrap();
        let config = OptimizerConfig::default()
            .with_seed(17)
            .with_max_iterations(2_000)
            .with_temperature(TemperatureSchedule::new(5.0, 0.995))
            .with_move_weights(MoveWeights { swap: 1.0, reverse: 1.0, relocate: 1.0 });

        let a = optimize(&cm, &config).unwrap();
        let b = optimize(&cm, &config).unwrap();
        assert_eq!(a.permutation, b.permutation);
        assert_eq!(a.cost.to_bits(), b.cost.to_bits());
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_annealing_best_is_monotonic() {
        let cm = ConfusionMatrix::from_counts(&[
            vec![5, 3, 0, 0, 0, 1],
            vec![2, 6, 0, 0, 1, 0],
            vec![0, 0, 7, 4, 0, 0],
            vec![0, 0, 3, 8, 0, 0],
            vec![0, 1, 0, 0, 9, 2],
            vec![1, 0, 0, 0, 3, 6],
        ])
        .unwrap();
        let config = OptimizerConfig::default()
            .with_max_iterations(5_000)
            .with_temperature(TemperatureSchedule::new(20.0, 0.999));
        let start = Permutation::new(vec![0, 2, 4, 1, 3, 5]).unwrap();
        let mut recorder = BestCostRecorder::new();
        let result = Optimizer::with_start(&cm, config, start)
            .unwrap()
            .run_with_observer(&mut Seed::new(8).to_rng(), &mut recorder);

        assert!(recorder.is_monotonic());
        assert_eq!(recorder.termination, Some(result.termination));
        let last = recorder.history.last().unwrap().1;
        assert!((last - result.cost).abs() <= 1e-9 * last.max(1.0));
    }

    #[test]
    fn test_resync_keeps_cost_exact() {
        let cm = ConfusionMatrix::from_rows(&[
            vec![1.0, 0.1, 0.7, 0.0],
            vec![0.3, 1.0, 0.0, 0.9],
            vec![0.2, 0.0, 1.0, 0.05],
            vec![0.0, 0.6, 0.4, 1.0],
        ])
        .unwrap();
        let config = OptimizerConfig { resync_interval: 1, ..Default::default() }
            .with_max_iterations(500)
            .with_temperature(TemperatureSchedule::new(1.0, 0.99));
        let result = optimize(&cm, &config).unwrap();
        let full = DisorderCost::new(&cm).cost(&result.permutation);
        assert_eq!(result.cost, full);
    }
}
