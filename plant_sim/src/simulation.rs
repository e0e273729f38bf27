//! Simulation - a `SimCore` driven by a `TickClock`.

use crate::world::{FrameReady, SimCore};

use plant_core::Registry;
use plant_env::{EnvError, TickClock, TickRate};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::info;

/// Owns the core behind a mutex and the clock that ticks it.
///
/// Each tick runs entirely under the core lock, so [`Simulation::with_core`]
/// and [`Simulation::snapshot`] always observe a whole number of ticks.
/// Do not advance a synchronous clock from inside `with_core`: the tick
/// callback takes the same lock.
pub struct Simulation {
    core: Arc<Mutex<SimCore>>,
    clock: Box<dyn TickClock>,
}

fn lock(core: &Mutex<SimCore>) -> MutexGuard<'_, SimCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Simulation {
    pub fn new(core: SimCore, clock: impl TickClock) -> Self {
        Self {
            core: Arc::new(Mutex::new(core)),
            clock: Box::new(clock),
        }
    }

    /// Starts ticking at `rate_hz` (floored at 1 Hz).
    ///
    /// Sets the core's dt to match and re-programs the clock if it is
    /// already running.
    pub fn start(&self, rate_hz: f64) -> Result<TickRate, EnvError> {
        let rate = TickRate::from_hz(rate_hz)?;
        lock(&self.core).set_rate(rate);

        let core = Arc::clone(&self.core);
        self.clock.start(
            rate.period(),
            Box::new(move || {
                lock(&core).tick();
            }),
        );
        info!("Simulation clock started at {}", rate);
        Ok(rate)
    }

    /// Stops ticking. A no-op when already stopped.
    pub fn stop(&self) {
        if self.clock.is_running() {
            self.clock.stop();
            info!("Simulation clock stopped at step {}", self.step());
        }
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Runs `f` against the core between ticks.
    pub fn with_core<R>(&self, f: impl FnOnce(&SimCore) -> R) -> R {
        f(&lock(&self.core))
    }

    /// Runs `f` with mutable access to the core between ticks.
    pub fn with_core_mut<R>(&self, f: impl FnOnce(&mut SimCore) -> R) -> R {
        f(&mut lock(&self.core))
    }

    /// Copy of the store as of the last completed tick.
    pub fn snapshot(&self) -> Registry {
        self.with_core(|core| core.registry().clone())
    }

    pub fn step(&self) -> u64 {
        self.with_core(SimCore::step)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FrameReady> {
        self.with_core(SimCore::subscribe)
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.clock.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use plant_core::Tank;
    use std::time::Duration;

    fn manual() -> (Simulation, ManualClock) {
        let clock = ManualClock::new();
        let mut core = SimCore::default();
        core.load_default_scenario();
        (Simulation::new(core, clock.clone()), clock)
    }

    #[test]
    fn test_not_running_until_started() {
        let (sim, clock) = manual();
        assert!(!sim.is_running());
        assert_eq!(clock.advance(5), 0);
        assert_eq!(sim.step(), 0);
    }

    #[test]
    fn test_start_programs_period_and_dt() {
        let (sim, clock) = manual();
        let rate = sim.start(20.0).unwrap();

        assert_eq!(rate.hz(), 20.0);
        assert_eq!(clock.period(), Some(Duration::from_millis(50)));
        assert!((sim.with_core(SimCore::dt) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_rate_floored_at_one_hz() {
        let (sim, clock) = manual();
        sim.start(0.0).unwrap();
        assert_eq!(clock.period(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_invalid_rate_leaves_clock_stopped() {
        let (sim, _clock) = manual();
        assert_eq!(sim.start(f64::INFINITY), Err(EnvError::InvalidRate(f64::INFINITY)));
        assert!(!sim.is_running());
    }

    #[test]
    fn test_ticks_follow_clock() {
        let (sim, clock) = manual();
        sim.start(50.0).unwrap();

        clock.advance(25);
        assert_eq!(sim.step(), 25);
        assert!((sim.with_core(SimCore::elapsed_secs) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stop_halts_and_is_idempotent() {
        let (sim, clock) = manual();
        sim.start(50.0).unwrap();
        clock.advance(3);

        sim.stop();
        sim.stop();
        clock.advance(10);
        assert_eq!(sim.step(), 3);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_restart_continues_step_counter() {
        let (sim, clock) = manual();
        sim.start(50.0).unwrap();
        clock.advance(4);
        sim.start(10.0).unwrap();
        clock.advance(1);

        assert_eq!(sim.step(), 5);
        assert!((sim.with_core(SimCore::elapsed_secs) - (4.0 * 0.02 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_subscribers_see_every_frame() {
        let (sim, clock) = manual();
        let mut rx = sim.subscribe();
        sim.start(50.0).unwrap();
        clock.advance(3);

        let mut frames = 0;
        while rx.try_recv().is_ok() {
            frames += 1;
        }
        assert_eq!(frames, 3);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let (sim, clock) = manual();
        sim.start(50.0).unwrap();
        clock.advance(10);

        let snapshot = sim.snapshot();
        clock.advance(10);
        let later = sim.snapshot();

        let level = |reg: &Registry| reg.view::<Tank>().next().map(|(_, t)| t.level);
        assert!(level(&later) > level(&snapshot));
    }

    #[tokio::test]
    async fn test_tokio_clock_drives_ticks() {
        let clock = plant_env::TokioClock::current().unwrap();
        let mut core = SimCore::default();
        core.load_default_scenario();
        let sim = Simulation::new(core, clock);
        let mut rx = sim.subscribe();

        sim.start(200.0).unwrap();
        for _ in 0..3 {
            rx.recv().await.unwrap();
        }
        sim.stop();

        assert!(sim.step() >= 3);
        assert!(!sim.is_running());
    }
}
