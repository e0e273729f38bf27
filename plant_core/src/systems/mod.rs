//! The tick pipeline.
//!
//! Systems are stateless passes over the [`Registry`]. They never call each
//! other; data flows only through shared components. The order in
//! [`PIPELINE`] is load-bearing: control reads the level measured on the
//! previous tick, and the response pass reads the reaction multiplier
//! computed just before it.

pub mod actuator;
pub mod alarm;
pub mod control;
pub mod heat_exchanger;
pub mod human_factors;
pub mod hydraulics;
pub mod response;
pub mod stubs;

pub use response::AutoCancelPolicy;

use crate::registry::Registry;
use serde::{Deserialize, Serialize};

/// One pass of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Control,
    Actuator,
    Hydraulics,
    HeatExchanger,
    UtilityBalance,
    Boiler,
    Refrigeration,
    Alarm,
    HumanFactors,
    Response,
    Analytics,
}

/// Fixed execution order of one tick.
pub const PIPELINE: [Stage; 11] = [
    Stage::Control,
    Stage::Actuator,
    Stage::Hydraulics,
    Stage::HeatExchanger,
    Stage::UtilityBalance,
    Stage::Boiler,
    Stage::Refrigeration,
    Stage::Alarm,
    Stage::HumanFactors,
    Stage::Response,
    Stage::Analytics,
];

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Control => "control",
            Stage::Actuator => "actuator",
            Stage::Hydraulics => "hydraulics",
            Stage::HeatExchanger => "heat_exchanger",
            Stage::UtilityBalance => "utility_balance",
            Stage::Boiler => "boiler",
            Stage::Refrigeration => "refrigeration",
            Stage::Alarm => "alarm",
            Stage::HumanFactors => "human_factors",
            Stage::Response => "response",
            Stage::Analytics => "analytics",
        }
    }

    /// True for declared extension points that do not mutate anything yet.
    pub fn is_stub(&self) -> bool {
        matches!(
            self,
            Stage::UtilityBalance | Stage::Boiler | Stage::Refrigeration | Stage::Analytics
        )
    }

    /// Runs this pass once over the registry.
    pub fn run(&self, reg: &mut Registry, dt: f64, config: &PipelineConfig) {
        match self {
            Stage::Control => control::run(reg, dt),
            Stage::Actuator => actuator::run(reg, dt),
            Stage::Hydraulics => hydraulics::run(reg, dt),
            Stage::HeatExchanger => heat_exchanger::run(reg, dt),
            Stage::UtilityBalance => stubs::utility_balance(reg, dt),
            Stage::Boiler => stubs::boiler(reg, dt),
            Stage::Refrigeration => stubs::refrigeration(reg, dt),
            Stage::Alarm => alarm::run(reg),
            Stage::HumanFactors => human_factors::run(reg),
            Stage::Response => response::run(reg, dt, config.auto_cancel),
            Stage::Analytics => stubs::analytics(reg, dt),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Policy knobs carried into every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// What an auto-cancelled alarm does to `alarms_raised`
    pub auto_cancel: AutoCancelPolicy,
}

/// Executes one full tick: every stage of [`PIPELINE`], in order.
pub fn run_tick(reg: &mut Registry, dt: f64, config: &PipelineConfig) {
    for stage in PIPELINE {
        stage.run(reg, dt, config);
    }
}
