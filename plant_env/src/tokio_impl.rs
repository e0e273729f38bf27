//! Production implementation of TickClock using Tokio.

use crate::clock::{TickCallback, TickClock};
use crate::error::EnvError;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Smallest period accepted by the interval timer.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Wall-clock tick driver backed by a tokio `interval` task.
///
/// The callback is invoked synchronously from the task, so cancellation
/// (which only happens at an `.await`) always lands between two ticks.
pub struct TokioClock {
    /// Runtime the interval task is spawned on
    handle: Handle,

    /// Currently running interval task, if any
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TokioClock {
    /// Creates a clock that spawns onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            task: Mutex::new(None),
        }
    }

    /// Creates a clock on the runtime of the calling context.
    pub fn current() -> Result<Self, EnvError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(EnvError::no_runtime)
    }
}

impl TickClock for TokioClock {
    fn start(&self, period: Duration, mut on_tick: TickCallback) {
        let period = period.max(MIN_PERIOD);
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = task.take() {
            previous.abort();
        }

        *task = Some(self.handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; wait one full period.
            interval.tick().await;
            loop {
                interval.tick().await;
                on_tick();
            }
        }));
    }

    fn stop(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = task.take() {
            running.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TokioClock {
    fn drop(&mut self) {
        self.stop();
    }
}
