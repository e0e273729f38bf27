//! Common types for the plant environment abstraction.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tick rate of the simulation clock.
///
/// Rates below 1 Hz are raised to 1 Hz, so `dt` never exceeds one second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRate {
    hz: f64,
}

impl TickRate {
    /// Default rate: 50 Hz, i.e. dt = 0.02 s.
    pub const DEFAULT_HZ: f64 = 50.0;

    /// Creates a tick rate from a frequency in Hz.
    pub fn from_hz(hz: f64) -> Result<Self, EnvError> {
        if !hz.is_finite() {
            return Err(EnvError::InvalidRate(hz));
        }
        Ok(Self { hz: hz.max(1.0) })
    }

    /// Returns the (floored) frequency in Hz.
    pub fn hz(&self) -> f64 {
        self.hz
    }

    /// Returns the simulated time step in seconds.
    pub fn dt_secs(&self) -> f64 {
        1.0 / self.hz
    }

    /// Returns the wall-clock timer period.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.dt_secs())
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self {
            hz: Self::DEFAULT_HZ,
        }
    }
}

impl std::fmt::Display for TickRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz", self.hz)
    }
}
