//! Plain-data component records.
//!
//! Components carry no behavior; every update lives in a system. Defaults
//! match the values a scenario record gets for any omitted parameter.

use serde::{Deserialize, Serialize};

/// Centrifugal pump. `flow` is derived every tick by the hydraulics pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pump {
    pub running: bool,
    /// Nominal pressure rise (arbitrary units, >= 0)
    pub nominal_dp: f64,
    pub flow: f64,
}

impl Default for Pump {
    fn default() -> Self {
        Self {
            running: true,
            nominal_dp: 1.8,
            flow: 0.0,
        }
    }
}

/// Valve with a rate-limited actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValveActuator {
    /// Commanded opening in [0, 1]
    pub command: f64,
    /// Actual opening in [0, 1]
    pub position: f64,
    /// Travel speed in fraction per second (> 0)
    pub speed: f64,
    /// Air-to-close failure mode; informational only
    pub fail_closed: bool,
}

impl Default for ValveActuator {
    fn default() -> Self {
        Self {
            command: 0.0,
            position: 0.0,
            speed: 0.6,
            fail_closed: true,
        }
    }
}

/// Open tank with a normalized level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    /// Fill fraction, always in [0, 1]
    pub level: f64,
    /// Cross-section area (> 0)
    pub area: f64,
    pub inflow: f64,
    pub outflow: f64,
}

impl Default for Tank {
    fn default() -> Self {
        Self {
            level: 0.30,
            area: 2.0,
            inflow: 0.0,
            outflow: 0.0,
        }
    }
}

/// Line resistance between pump and tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub resistance: f64,
}

impl Default for Pipe {
    fn default() -> Self {
        Self { resistance: 1.0 }
    }
}

/// PI(D) loop. The derivative term is reserved: `kd` is carried but unused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pid {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    /// Process variable fed back by the hydraulics pass
    pub measured: f64,
    /// Normalized actuator command in [0, 1]
    pub output: f64,
    /// Accumulated error; no anti-windup
    pub integral: f64,
}

impl Default for Pid {
    fn default() -> Self {
        Self {
            kp: 2.0,
            ki: 0.5,
            kd: 0.0,
            setpoint: 0.60,
            measured: 0.30,
            output: 0.0,
            integral: 0.0,
        }
    }
}

/// Threshold alarm on a tank level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarmable {
    /// Instantaneous high condition
    pub hi: bool,
    /// Instantaneous low condition
    pub lo: bool,
    /// Sticky flag, cleared only when a repair completes
    pub latched: bool,
    pub hi_threshold: f64,
    pub lo_threshold: f64,
}

impl Alarmable {
    /// True while either threshold is currently crossed.
    pub fn condition(&self) -> bool {
        self.hi || self.lo
    }
}

impl Default for Alarmable {
    fn default() -> Self {
        Self {
            hi: false,
            lo: false,
            latched: false,
            hi_threshold: 0.90,
            lo_threshold: 0.10,
        }
    }
}

/// Heat exchanger modeled as a first-order lag on a composition stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatExchanger {
    pub powered: bool,
    pub inlet_stream: f64,
    pub outlet_stream: f64,
    pub flow_rate: f64,
    /// Base time constant in seconds
    pub time_constant: f64,
    /// Informational; not integrated
    pub temperature: f64,
    /// Informational; not integrated
    pub pressure: f64,
}

impl Default for HeatExchanger {
    fn default() -> Self {
        Self {
            powered: true,
            inlet_stream: 1.0,
            outlet_stream: 1.0,
            flow_rate: 1.0,
            time_constant: 5.0,
            temperature: 70.0,
            pressure: 1.0,
        }
    }
}

/// Operator crew state at site scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanFactors {
    pub training: f64,
    pub fatigue: f64,
    pub shift_hours: f64,
    pub staff_on_shift: u32,
    /// Derived every tick, clamped to [0.5, 2.0]
    pub reaction_multiplier: f64,
}

impl Default for HumanFactors {
    fn default() -> Self {
        Self {
            training: 0.5,
            fatigue: 0.2,
            shift_hours: 8.0,
            staff_on_shift: 3,
            reaction_multiplier: 1.0,
        }
    }
}

/// Lifecycle state of an [`AlarmResponse`], derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseState {
    Idle,
    Unacknowledged,
    Repairing,
}

/// Operator response to one alarm: acknowledge, then repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmResponse {
    pub active: bool,
    pub acknowledged: bool,
    /// Seconds left until acknowledgment
    pub ack_timer: f64,
    /// Seconds left until repair completes
    pub repair_timer: f64,
    /// Nominal acknowledgment time before human-factors scaling
    pub ack_target: f64,
    /// Nominal repair time before human-factors scaling
    pub repair_target: f64,
}

impl AlarmResponse {
    pub fn state(&self) -> ResponseState {
        match (self.active, self.acknowledged) {
            (false, _) => ResponseState::Idle,
            (true, false) => ResponseState::Unacknowledged,
            (true, true) => ResponseState::Repairing,
        }
    }
}

impl Default for AlarmResponse {
    fn default() -> Self {
        Self {
            active: false,
            acknowledged: false,
            ack_timer: 0.0,
            repair_timer: 0.0,
            ack_target: 5.0,
            repair_target: 20.0,
        }
    }
}

/// Site-wide alarm and downtime counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteKpi {
    pub alarms_raised: u64,
    /// Unsigned; decrements saturate at zero
    pub alarms_active: u64,
    pub downtime_seconds: f64,
}

/// The component kinds known to the store, with their scenario type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Pump,
    ValveActuator,
    Tank,
    Pipe,
    Pid,
    Alarmable,
    HeatExchanger,
    HumanFactors,
    AlarmResponse,
    SiteKpi,
}

impl ComponentKind {
    /// Returns all kinds in declaration order.
    pub fn all() -> [ComponentKind; 10] {
        [
            ComponentKind::Pump,
            ComponentKind::ValveActuator,
            ComponentKind::Tank,
            ComponentKind::Pipe,
            ComponentKind::Pid,
            ComponentKind::Alarmable,
            ComponentKind::HeatExchanger,
            ComponentKind::HumanFactors,
            ComponentKind::AlarmResponse,
            ComponentKind::SiteKpi,
        ]
    }

    /// Returns the scenario type tag.
    pub fn tag(&self) -> &'static str {
        match self {
            ComponentKind::Pump => "Pump",
            ComponentKind::ValveActuator => "ValveActuator",
            ComponentKind::Tank => "Tank",
            ComponentKind::Pipe => "Pipe",
            ComponentKind::Pid => "PID",
            ComponentKind::Alarmable => "Alarmable",
            ComponentKind::HeatExchanger => "HeatExchanger",
            ComponentKind::HumanFactors => "HumanFactors",
            ComponentKind::AlarmResponse => "AlarmResponse",
            ComponentKind::SiteKpi => "SiteKPI",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl std::str::FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::all()
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown component type: {}", s))
    }
}
