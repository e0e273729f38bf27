//! Plant Simulation Shell
//!
//! Wraps the synchronous `plant_core` pipeline in everything needed to run
//! it: a tick counter and frame notifications ([`SimCore`]), a clock-driven
//! scheduler ([`Simulation`]), JSON scenario ingestion, built-in scenarios,
//! a display push surface, frame export and runners.
//!
//! # Architecture
//!
//! ```text
//!  scenario.json ──► ScenarioDocument ──validate──► SimCore ◄── DisplayModel
//!                         ▲                           │  ▲      (push_to_display)
//!  ScenarioId::document ──┘                  FrameReady  │
//!                                                     ▼  │ tick()
//!                                                Simulation ◄── TickClock
//!                                                          (TokioClock | ManualClock)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use plant_sim::{HeadlessRunner, SimConfig, SimCore, ScenarioId};
//!
//! let mut core = SimCore::default();
//! core.load_scenario(ScenarioId::HighLevelTrip)?;
//!
//! let result = HeadlessRunner::new(SimConfig::default()).run("trip", core)?;
//! println!("{:?}", result.kpi);
//! ```

mod clock;
mod display;
mod error;
mod exporter;
mod loader;
mod runner;
pub mod scenarios;
mod simulation;
mod world;

pub use clock::ManualClock;
pub use display::{DisplayModel, DisplayNode};
pub use error::ScenarioError;
pub use exporter::{AlarmSample, FrameExport, PlantFrame, PumpSample, TankSample};
pub use loader::{ComponentRecord, ParamValue, ScenarioDocument};
pub use runner::{run_realtime, HeadlessRunner, RunResult};
pub use scenarios::ScenarioId;
pub use simulation::Simulation;
pub use world::{FrameReady, SimConfig, SimCore};
