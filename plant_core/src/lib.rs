//! Plant Core - Deterministic Industrial Plant Simulation
//!
//! A small plant (pumps, valves, tanks, heat exchangers, alarms, operators)
//! modeled as entities carrying plain-data components, advanced by a fixed
//! pipeline of stateless systems:
//!
//! ```text
//! Control → Actuator → Hydraulics → HeatExchanger
//!   → UtilityBalance → Boiler → Refrigeration      (extension points)
//!   → Alarm → HumanFactors → Response → Analytics
//! ```
//!
//! # Critical Invariants
//!
//! 1. Tank level, valve position and PID output stay in [0, 1]
//! 2. Valve travel per tick never exceeds `speed * dt`
//! 3. An alarm latch is only cleared by a completed repair
//! 4. `SiteKpi::alarms_active` never goes negative
//! 5. Identical snapshot + identical dt sequence = identical result

pub mod components;
pub mod entity;
pub mod error;
pub mod kpi;
pub mod registry;
pub mod systems;

// Re-export key types for convenience
pub use components::{
    AlarmResponse, Alarmable, ComponentKind, HeatExchanger, HumanFactors, Pid, Pipe, Pump,
    ResponseState, SiteKpi, Tank, ValveActuator,
};
pub use entity::Entity;
pub use error::CoreError;
pub use kpi::KpiSummary;
pub use registry::{join, Component, Registry, Storage};
pub use systems::{run_tick, AutoCancelPolicy, PipelineConfig, Stage, PIPELINE};
