//! Core tick clock trait for the plant simulator.

use std::time::Duration;

/// Work performed on every clock period.
///
/// The callback runs to completion before the clock waits for the next
/// period, so a tick can never be split or interleaved with another.
pub type TickCallback = Box<dyn FnMut() + Send + 'static>;

/// The central interface for driving the simulation in time.
///
/// # Implementations
///
/// - **Production**: `TokioClock` - wraps `tokio::time::interval`
/// - **Simulation**: `ManualClock` - fires only on explicit `advance()`
///
/// # Control semantics
///
/// Both operations are idempotent and safe to call at any time:
/// starting a running clock replaces its period and callback, and stopping
/// a stopped clock does nothing. Stopping never interrupts a callback that
/// is already executing; it only prevents the next one.
pub trait TickClock: Send + Sync + 'static {
    /// Programs the clock to call `on_tick` once every `period`.
    ///
    /// If the clock is already running it is re-programmed in place.
    fn start(&self, period: Duration, on_tick: TickCallback);

    /// Halts the clock. No-op if already stopped.
    fn stop(&self);

    /// Returns true while the clock is programmed to fire.
    fn is_running(&self) -> bool;
}
