//! Temperature schedule for simulated-annealing acceptance.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{OptimizeError, Result};

/// Exponential cooling: `T(step) = initial_temp · decay_rate^step`.
///
/// Without a schedule the optimizer only accepts strict improvements
/// (annealing at temperature zero).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSchedule {
    /// Starting temperature, > 0.
    pub initial_temp: f64,
    /// Multiplicative decay per iteration, in (0, 1].
    pub decay_rate: f64,
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        Self {
            initial_temp: 100.0,
            decay_rate: 0.99,
        }
    }
}

impl TemperatureSchedule {
    /// Create a schedule.
    pub fn new(initial_temp: f64, decay_rate: f64) -> Self {
        Self { initial_temp, decay_rate }
    }

    /// Reject non-positive temperatures and decay rates outside (0, 1].
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_temp.is_finite() && self.initial_temp > 0.0) {
            return Err(OptimizeError::InvalidConfiguration(format!(
                "initial_temp={} needs to be positive",
                self.initial_temp
            )));
        }
        if !(self.decay_rate > 0.0 && self.decay_rate <= 1.0) {
            return Err(OptimizeError::InvalidConfiguration(format!(
                "decay_rate={} needs to be in the interval (0, 1]",
                self.decay_rate
            )));
        }
        Ok(())
    }

    /// Temperature after `step` decays.
    pub fn temperature_at(&self, step: usize) -> f64 {
        self.initial_temp * self.decay_rate.powi(step.min(i32::MAX as usize) as i32)
    }
}

/// Metropolis criterion: a worsening move of size `delta > 0` passes with
/// probability `exp(-delta / temperature)`.
pub(crate) fn metropolis<R: Rng + ?Sized>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if temperature <= 0.0 || !temperature.is_finite() {
        return false;
    }
    let threshold = (-delta / temperature).exp();
    rng.gen::<f64>() < threshold
}
