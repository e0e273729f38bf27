//! Built-in plant scenarios.
//!
//! Each scenario is an in-memory [`ScenarioDocument`], so built-ins and
//! JSON files go through the same ingestion path.

use crate::loader::{ComponentRecord, ScenarioDocument};
use plant_core::ComponentKind;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Pump, valve, tank, pipe, level controller and alarm on one item
    DefaultLoop,

    /// Level setpoint above the high alarm so the response lifecycle runs
    HighLevelTrip,

    /// Default loop plus a valve-modulated heat exchanger
    HeatExchanger,

    /// High-alarm loop worked by a tired, thin night crew
    NightShift,
}

/// Id of the level-control item in every built-in scenario.
pub const LOOP_ID: &str = "LIC-101";
/// Id of the site item carrying crew and KPI state.
pub const SITE_ID: &str = "SITE";
/// Id of the exchanger item in [`ScenarioId::HeatExchanger`].
pub const EXCHANGER_ID: &str = "E-201";

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::DefaultLoop,
            ScenarioId::HighLevelTrip,
            ScenarioId::HeatExchanger,
            ScenarioId::NightShift,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::DefaultLoop => "default_loop",
            ScenarioId::HighLevelTrip => "high_level_trip",
            ScenarioId::HeatExchanger => "heat_exchanger",
            ScenarioId::NightShift => "night_shift",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::DefaultLoop => "Level loop at setpoint 0.6 with site KPI and crew",
            ScenarioId::HighLevelTrip => "Setpoint 0.95 drives the tank past the high alarm",
            ScenarioId::HeatExchanger => "Level loop plus exchanger lag on a throttled valve",
            ScenarioId::NightShift => "High-level trip with fatigue 0.9, 12 h shift, 2 staff",
        }
    }

    /// Builds the scenario's component records.
    pub fn document(&self) -> ScenarioDocument {
        match self {
            ScenarioId::DefaultLoop => with_site(level_loop(0.6, 5.0, 20.0), day_crew()),
            ScenarioId::HighLevelTrip => with_site(level_loop(0.95, 2.0, 5.0), day_crew()),
            ScenarioId::HeatExchanger => {
                let mut doc = with_site(level_loop(0.6, 5.0, 20.0), day_crew());
                doc.components.extend(exchanger());
                doc
            }
            ScenarioId::NightShift => with_site(
                level_loop(0.95, 2.0, 5.0),
                ComponentRecord::new(SITE_ID, ComponentKind::HumanFactors)
                    .param("training", 0.2)
                    .param("fatigue", 0.9)
                    .param("shift_hours", 12.0)
                    .param("staff_on_shift", 2.0),
            ),
        }
    }
}

fn level_loop(setpoint: f64, ack_target: f64, repair_target: f64) -> ScenarioDocument {
    ScenarioDocument::new()
        .with(
            ComponentRecord::new(LOOP_ID, ComponentKind::Pump)
                .param("running", true)
                .param("dp_nominal", 1.8)
                .output(LOOP_ID),
        )
        .with(ComponentRecord::new(LOOP_ID, ComponentKind::ValveActuator).param("speed", 0.6))
        .with(
            ComponentRecord::new(LOOP_ID, ComponentKind::Tank)
                .param("level", 0.3)
                .param("area", 2.0),
        )
        .with(ComponentRecord::new(LOOP_ID, ComponentKind::Pipe).param("k", 1.0))
        .with(
            ComponentRecord::new(LOOP_ID, ComponentKind::Pid)
                .param("kp", 2.0)
                .param("ki", 0.5)
                .param("kd", 0.0)
                .param("sp", setpoint),
        )
        .with(
            ComponentRecord::new(LOOP_ID, ComponentKind::Alarmable)
                .param("hi_sp", 0.9)
                .param("lo_sp", 0.1),
        )
        .with(
            ComponentRecord::new(LOOP_ID, ComponentKind::AlarmResponse)
                .param("ack_target", ack_target)
                .param("repair_target", repair_target),
        )
}

fn day_crew() -> ComponentRecord {
    ComponentRecord::new(SITE_ID, ComponentKind::HumanFactors)
}

fn with_site(doc: ScenarioDocument, crew: ComponentRecord) -> ScenarioDocument {
    doc.with(crew)
        .with(ComponentRecord::new(SITE_ID, ComponentKind::SiteKpi))
}

fn exchanger() -> Vec<ComponentRecord> {
    vec![
        ComponentRecord::new(EXCHANGER_ID, ComponentKind::HeatExchanger)
            .param("comp_inlet_stream", 1.0)
            .param("comp_outlet_stream", 0.2)
            .param("flow_rate", 1.0)
            .param("tau_s", 5.0),
        ComponentRecord::new(EXCHANGER_ID, ComponentKind::ValveActuator)
            .param("cmd", 0.7)
            .param("pos", 0.7),
    ]
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "default_loop" | "default" => Ok(ScenarioId::DefaultLoop),
            "high_level_trip" | "trip" => Ok(ScenarioId::HighLevelTrip),
            "heat_exchanger" | "hx" => Ok(ScenarioId::HeatExchanger),
            "night_shift" => Ok(ScenarioId::NightShift),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plant_core::{
        run_tick, HeatExchanger, HumanFactors, PipelineConfig, Registry, SiteKpi,
    };
    use std::collections::BTreeMap;

    fn install(id: ScenarioId) -> (Registry, BTreeMap<String, plant_core::Entity>) {
        let mut reg = Registry::new();
        let mut ids = BTreeMap::new();
        id.document().apply(&mut reg, &mut ids).unwrap();
        (reg, ids)
    }

    fn run_secs(reg: &mut Registry, secs: f64) {
        let dt = 0.02;
        for _ in 0..(secs / dt).round() as u64 {
            run_tick(reg, dt, &PipelineConfig::default());
        }
    }

    #[test]
    fn test_names_parse_back() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>(), Ok(id));
            assert_eq!(id.to_string(), id.name());
        }
        assert!("boiler_room".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_every_builtin_is_valid() {
        for id in ScenarioId::all() {
            let (reg, ids) = install(id);
            assert!(ids.contains_key(LOOP_ID), "{} lacks the loop", id);
            assert_eq!(reg.count::<SiteKpi>(), 1, "{} lacks a site KPI", id);
            assert_eq!(reg.count::<HumanFactors>(), 1);
        }
    }

    #[test]
    fn test_high_level_trip_raises_alarm() {
        let (mut reg, _) = install(ScenarioId::HighLevelTrip);
        run_secs(&mut reg, 10.0);

        let site = reg.unique::<SiteKpi>().unwrap();
        assert!(reg.get::<SiteKpi>(site).unwrap().alarms_raised >= 1);
    }

    #[test]
    fn test_night_shift_crew_is_slow() {
        let (mut reg, ids) = install(ScenarioId::NightShift);
        run_tick(&mut reg, 0.02, &PipelineConfig::default());

        let crew = reg.get::<HumanFactors>(ids[SITE_ID]).unwrap();
        assert!(crew.reaction_multiplier > 1.0);
    }

    #[test]
    fn test_exchanger_outlet_moves_toward_target() {
        let (mut reg, ids) = install(ScenarioId::HeatExchanger);
        run_secs(&mut reg, 1.0);

        let hx = reg.get::<HeatExchanger>(ids[EXCHANGER_ID]).unwrap();
        assert!(hx.outlet_stream > 0.2 && hx.outlet_stream < 0.7);
    }
}
