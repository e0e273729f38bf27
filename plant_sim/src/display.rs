//! Display model fed by the simulation.
//!
//! A flat, id-keyed view of the plant for an HMI: one node per scenario
//! item with its numeric and boolean values plus downstream links. The
//! simulation writes into it with `SimCore::push_to_display`; it never
//! reads from it.

use crate::loader::{ParamValue, ScenarioDocument};
use plant_core::{
    AlarmResponse, Alarmable, ComponentKind, Entity, HeatExchanger, HumanFactors, Pid, Pipe,
    Pump, Registry, SiteKpi, Tank, ValveActuator,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One plant item as seen by a display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayNode {
    pub id: String,
    /// Kind of the item's first record
    pub kind: Option<ComponentKind>,
    pub numbers: BTreeMap<String, f64>,
    pub flags: BTreeMap<String, bool>,
    /// Downstream item ids
    pub outputs: Vec<String>,
}

impl DisplayNode {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.numbers.get(key).copied()
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }

    fn set(&mut self, key: &str, value: f64) {
        self.numbers.insert(key.to_string(), value);
    }

    fn set_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }
}

/// Id-keyed collection of display nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayModel {
    nodes: BTreeMap<String, DisplayNode>,
}

impl DisplayModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one node per distinct id, seeded with the authored params.
    ///
    /// Records without an id have no stable handle and are left out.
    pub fn from_document(doc: &ScenarioDocument) -> Self {
        let mut model = Self::new();
        for record in doc.components.iter().filter(|r| !r.id.is_empty()) {
            let node = model
                .nodes
                .entry(record.id.clone())
                .or_insert_with(|| DisplayNode::new(&record.id));
            if node.kind.is_none() {
                node.kind = record.kind.parse().ok();
            }
            for (key, value) in &record.params {
                match value {
                    ParamValue::Number(n) => node.set(key, *n),
                    ParamValue::Bool(b) => node.set_flag(key, *b),
                }
            }
            for output in &record.outputs {
                if !node.outputs.contains(output) {
                    node.outputs.push(output.clone());
                }
            }
        }
        model
    }

    pub fn insert(&mut self, node: DisplayNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn node(&self, id: &str) -> Option<&DisplayNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DisplayNode> + '_ {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut DisplayNode> + '_ {
        self.nodes.values_mut()
    }

    /// All `(from, to)` topology edges.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.nodes
            .values()
            .flat_map(|node| {
                node.outputs
                    .iter()
                    .map(move |to| (node.id.as_str(), to.as_str()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Writes every component present on `entity` into `node`.
pub(crate) fn write_entity(reg: &Registry, entity: Entity, node: &mut DisplayNode) {
    if let Some(pump) = reg.get::<Pump>(entity) {
        node.set_flag("running", pump.running);
        node.set("dp_nominal", pump.nominal_dp);
        node.set("flow", pump.flow);
    }
    if let Some(valve) = reg.get::<ValveActuator>(entity) {
        node.set("cmd", valve.command);
        node.set("position", valve.position);
        node.set("speed", valve.speed);
        node.set_flag("fail_closed", valve.fail_closed);
    }
    if let Some(tank) = reg.get::<Tank>(entity) {
        node.set("level", tank.level);
        node.set("area", tank.area);
        node.set("inflow", tank.inflow);
        node.set("outflow", tank.outflow);
    }
    if let Some(pipe) = reg.get::<Pipe>(entity) {
        node.set("k", pipe.resistance);
    }
    if let Some(pid) = reg.get::<Pid>(entity) {
        node.set("sp", pid.setpoint);
        node.set("pv", pid.measured);
        node.set("out", pid.output);
        node.set("integral", pid.integral);
    }
    if let Some(alarm) = reg.get::<Alarmable>(entity) {
        node.set_flag("hi", alarm.hi);
        node.set_flag("lo", alarm.lo);
        node.set_flag("latched", alarm.latched);
        node.set("hi_sp", alarm.hi_threshold);
        node.set("lo_sp", alarm.lo_threshold);
    }
    if let Some(hx) = reg.get::<HeatExchanger>(entity) {
        node.set_flag("power_on", hx.powered);
        node.set("inlet_stream", hx.inlet_stream);
        node.set("outlet_stream", hx.outlet_stream);
        node.set("flow_rate", hx.flow_rate);
        node.set("temp", hx.temperature);
        node.set("pressure", hx.pressure);
    }
    if let Some(hf) = reg.get::<HumanFactors>(entity) {
        node.set("fatigue", hf.fatigue);
        node.set("training", hf.training);
        node.set("reaction_multiplier", hf.reaction_multiplier);
    }
    if let Some(response) = reg.get::<AlarmResponse>(entity) {
        node.set_flag("active", response.active);
        node.set_flag("acknowledged", response.acknowledged);
        node.set("ack_timer", response.ack_timer);
        node.set("repair_timer", response.repair_timer);
    }
    if let Some(kpi) = reg.get::<SiteKpi>(entity) {
        node.set("alarms_raised", kpi.alarms_raised as f64);
        node.set("alarms_active", kpi.alarms_active as f64);
        node.set("downtime_seconds", kpi.downtime_seconds);
    }
}
