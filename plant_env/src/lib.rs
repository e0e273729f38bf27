//! Plant Simulator Environment Abstraction Layer
//!
//! The simulation core never owns a timer. It is driven from outside by a
//! [`TickClock`], which fires one callback per period until stopped:
//!
//! - **Production**: [`TokioClock`] - a tokio `interval` task on a runtime handle
//! - **Simulation**: a manual clock (see `plant_sim`) that fires only when told to
//!
//! Swapping the clock is the only difference between a wall-clock run and a
//! fully deterministic test run; the tick body is identical.
//!
//! # Example
//!
//! ```ignore
//! use plant_env::{TickClock, TickRate, TokioClock};
//!
//! let clock = TokioClock::current()?;
//! let rate = TickRate::from_hz(50.0)?;
//! clock.start(rate.period(), Box::new(move || core.lock().unwrap().tick()));
//! // ...
//! clock.stop();
//! ```

mod clock;
mod error;
mod tokio_impl;
mod types;

pub use clock::{TickCallback, TickClock};
pub use error::EnvError;
pub use tokio_impl::TokioClock;
pub use types::TickRate;
