//! Manual tick clock for deterministic runs.

use plant_env::{TickCallback, TickClock};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct ManualState {
    period: Option<Duration>,
    callback: Option<TickCallback>,
    running: bool,
    fired: u64,
}

/// Clock that only fires when told to.
///
/// Implements `TickClock` with no wall-clock dependency: `advance(n)` runs
/// the programmed callback `n` times back to back, exactly as a wall-clock
/// driver would over `n` periods. Clones share the same state, so a test
/// can hand one clone to a `Simulation` and drive it with another.
#[derive(Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    /// Creates a stopped clock.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fires up to `ticks` periods. Returns how many actually fired.
    ///
    /// Stops early if the clock is stopped, including from inside the
    /// callback. The callback runs without this clock's lock held, so it
    /// may itself call `start`/`stop`.
    pub fn advance(&self, ticks: u64) -> u64 {
        let mut fired = 0;
        for _ in 0..ticks {
            let mut callback = {
                let mut state = self.lock();
                if !state.running {
                    break;
                }
                match state.callback.take() {
                    Some(callback) => callback,
                    None => break,
                }
            };

            callback();
            fired += 1;

            let mut state = self.lock();
            state.fired += 1;
            // Keep the callback unless it was stopped or re-programmed meanwhile
            if state.running && state.callback.is_none() {
                state.callback = Some(callback);
            }
        }
        fired
    }

    /// Fires as many whole periods as fit into `elapsed`.
    pub fn advance_by(&self, elapsed: Duration) -> u64 {
        let period = match self.period() {
            Some(period) if !period.is_zero() => period,
            _ => return 0,
        };
        let ticks = elapsed.as_nanos() / period.as_nanos();
        self.advance(u64::try_from(ticks).unwrap_or(u64::MAX))
    }

    /// Period programmed by the last `start`, if any.
    pub fn period(&self) -> Option<Duration> {
        self.lock().period
    }

    /// Total callbacks fired over the clock's lifetime.
    pub fn fired(&self) -> u64 {
        self.lock().fired
    }
}

impl TickClock for ManualClock {
    fn start(&self, period: Duration, on_tick: TickCallback) {
        let mut state = self.lock();
        state.period = Some(period);
        state.callback = Some(on_tick);
        state.running = true;
    }

    fn stop(&self) {
        let mut state = self.lock();
        state.running = false;
        state.callback = None;
    }

    fn is_running(&self) -> bool {
        self.lock().running
    }
}
