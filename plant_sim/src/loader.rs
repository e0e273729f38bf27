//! JSON scenario ingestion.
//!
//! A scenario is a flat list of component records. Records that share an
//! `id` describe one plant item and land on the same entity:
//!
//! ```json
//! { "components": [
//!     { "id": "LIC-101", "type": "Tank", "params": { "level": 0.4 } },
//!     { "id": "LIC-101", "type": "PID",  "params": { "sp": 0.6 }, "outputs": ["FV-101"] }
//! ] }
//! ```
//!
//! Loading happens in two phases. Every record is first converted into a
//! typed component with its parameters checked; only when the whole
//! document is valid are entities created and components attached.

use crate::error::ScenarioError;
use plant_core::{
    AlarmResponse, Alarmable, ComponentKind, Entity, HeatExchanger, HumanFactors, Pid, Pipe,
    Pump, Registry, SiteKpi, Tank, ValveActuator,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// A scalar scenario parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

/// One component record of a scenario document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Plant item id; records with the same id share an entity
    #[serde(default)]
    pub id: String,

    /// Component type tag (`Pump`, `PID`, `SiteKPI`, ...)
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ParamValue>,

    /// Downstream item ids; display topology only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
}

impl ComponentRecord {
    pub fn new(id: &str, kind: ComponentKind) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.tag().to_string(),
            params: BTreeMap::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets a parameter.
    pub fn param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Adds a downstream connection.
    pub fn output(mut self, id: &str) -> Self {
        self.outputs.push(id.to_string());
        self
    }
}

/// A parsed scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDocument {
    pub components: Vec<ComponentRecord>,
}

#[derive(Deserialize)]
struct RawDocument {
    components: Option<Vec<ComponentRecord>>,
}

impl ScenarioDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn with(mut self, record: ComponentRecord) -> Self {
        self.components.push(record);
        self
    }

    /// Parses a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        let raw: RawDocument = serde_json::from_str(text)?;
        raw.components
            .map(|components| Self { components })
            .ok_or(ScenarioError::MissingComponents)
    }

    /// Reads and parses a document from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Serializes the document as pretty JSON.
    pub fn to_json(&self) -> Result<String, ScenarioError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every record without touching any store.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.build().map(|_| ())
    }

    fn build(&self) -> Result<Vec<(&str, Built)>, ScenarioError> {
        self.components
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let kind: ComponentKind =
                    record
                        .kind
                        .parse()
                        .map_err(|_| ScenarioError::UnknownType {
                            index,
                            kind: record.kind.clone(),
                        })?;
                Ok((record.id.as_str(), Built::from_record(kind, record)?))
            })
            .collect()
    }

    /// Attaches the document's components to `reg`.
    ///
    /// Ids already present in `ids` and still alive reuse their entity;
    /// other ids get a fresh one and are recorded in `ids`. Returns the
    /// number of entities created. On error nothing is modified.
    pub fn apply(
        &self,
        reg: &mut Registry,
        ids: &mut BTreeMap<String, Entity>,
    ) -> Result<usize, ScenarioError> {
        let staged = self.build()?;

        let mut created = 0;
        for (id, component) in staged {
            let entity = match ids.get(id) {
                Some(&entity) if reg.is_alive(entity) => entity,
                _ => {
                    let entity = reg.create();
                    created += 1;
                    if !id.is_empty() {
                        ids.insert(id.to_string(), entity);
                    }
                    entity
                }
            };
            let kind = component.kind();
            if component.attach(reg, entity)? {
                warn!("Item {:?} lists {} twice; the later record wins", id, kind);
            }
        }

        warn_duplicate_singleton(ComponentKind::HumanFactors, reg.count::<HumanFactors>());
        warn_duplicate_singleton(ComponentKind::SiteKpi, reg.count::<SiteKpi>());

        debug!(
            "Applied {} records ({} new entities)",
            self.components.len(),
            created
        );
        Ok(created)
    }
}

fn warn_duplicate_singleton(kind: ComponentKind, owners: usize) {
    if owners > 1 {
        warn!(
            "{} {} components present; only the first in entity order is used",
            owners, kind
        );
    }
}

/// A validated component, ready to attach.
#[derive(Debug, Clone, PartialEq)]
enum Built {
    Pump(Pump),
    Valve(ValveActuator),
    Tank(Tank),
    Pipe(Pipe),
    Pid(Pid),
    Alarm(Alarmable),
    HeatExchanger(HeatExchanger),
    HumanFactors(HumanFactors),
    Response(AlarmResponse),
    SiteKpi(SiteKpi),
}

impl Built {
    fn from_record(kind: ComponentKind, record: &ComponentRecord) -> Result<Self, ScenarioError> {
        let p = Params {
            id: &record.id,
            values: &record.params,
        };
        let built = match kind {
            ComponentKind::Pump => {
                let d = Pump::default();
                Built::Pump(Pump {
                    running: p.flag("running", d.running)?,
                    nominal_dp: p.non_negative("dp_nominal", d.nominal_dp)?,
                    ..d
                })
            }
            ComponentKind::ValveActuator => {
                let d = ValveActuator::default();
                Built::Valve(ValveActuator {
                    command: p.fraction("cmd", d.command)?,
                    position: p.fraction("pos", d.position)?,
                    speed: p.positive("speed", d.speed)?,
                    fail_closed: p.flag("fail_closed", d.fail_closed)?,
                })
            }
            ComponentKind::Tank => {
                let d = Tank::default();
                Built::Tank(Tank {
                    level: p.fraction("level", d.level)?,
                    area: p.positive("area", d.area)?,
                    ..d
                })
            }
            ComponentKind::Pipe => Built::Pipe(Pipe {
                resistance: p.non_negative("k", Pipe::default().resistance)?,
            }),
            ComponentKind::Pid => {
                let d = Pid::default();
                Built::Pid(Pid {
                    kp: p.number("kp", d.kp)?,
                    ki: p.number("ki", d.ki)?,
                    kd: p.number("kd", d.kd)?,
                    setpoint: p.number("sp", d.setpoint)?,
                    measured: p.number("pv", d.measured)?,
                    ..d
                })
            }
            ComponentKind::Alarmable => {
                let d = Alarmable::default();
                Built::Alarm(Alarmable {
                    hi_threshold: p.number("hi_sp", d.hi_threshold)?,
                    lo_threshold: p.number("lo_sp", d.lo_threshold)?,
                    ..d
                })
            }
            ComponentKind::HeatExchanger => {
                let d = HeatExchanger::default();
                Built::HeatExchanger(HeatExchanger {
                    powered: p.flag("power_on", d.powered)?,
                    inlet_stream: p.number("comp_inlet_stream", d.inlet_stream)?,
                    outlet_stream: p.number("comp_outlet_stream", d.outlet_stream)?,
                    flow_rate: p.positive("flow_rate", d.flow_rate)?,
                    time_constant: p.positive("tau_s", d.time_constant)?,
                    temperature: p.number("temp", d.temperature)?,
                    pressure: p.number("pressure", d.pressure)?,
                })
            }
            ComponentKind::HumanFactors => {
                let d = HumanFactors::default();
                let staff = p.non_negative("staff_on_shift", f64::from(d.staff_on_shift))?;
                Built::HumanFactors(HumanFactors {
                    training: p.number("training", d.training)?,
                    fatigue: p.number("fatigue", d.fatigue)?,
                    shift_hours: p.non_negative("shift_hours", d.shift_hours)?,
                    staff_on_shift: staff.round().min(f64::from(u32::MAX)) as u32,
                    ..d
                })
            }
            ComponentKind::AlarmResponse => {
                let d = AlarmResponse::default();
                Built::Response(AlarmResponse {
                    ack_target: p.non_negative("ack_target", d.ack_target)?,
                    repair_target: p.non_negative("repair_target", d.repair_target)?,
                    ..d
                })
            }
            ComponentKind::SiteKpi => {
                let raised = p.non_negative("alarms_raised", 0.0)?;
                let active = p.non_negative("alarms_active", 0.0)?;
                Built::SiteKpi(SiteKpi {
                    alarms_raised: raised.round() as u64,
                    alarms_active: active.round() as u64,
                    downtime_seconds: p.non_negative("downtime_seconds", 0.0)?,
                })
            }
        };
        Ok(built)
    }

    fn kind(&self) -> ComponentKind {
        match self {
            Built::Pump(_) => ComponentKind::Pump,
            Built::Valve(_) => ComponentKind::ValveActuator,
            Built::Tank(_) => ComponentKind::Tank,
            Built::Pipe(_) => ComponentKind::Pipe,
            Built::Pid(_) => ComponentKind::Pid,
            Built::Alarm(_) => ComponentKind::Alarmable,
            Built::HeatExchanger(_) => ComponentKind::HeatExchanger,
            Built::HumanFactors(_) => ComponentKind::HumanFactors,
            Built::Response(_) => ComponentKind::AlarmResponse,
            Built::SiteKpi(_) => ComponentKind::SiteKpi,
        }
    }

    /// Inserts the component. Returns true if it replaced an existing one.
    fn attach(self, reg: &mut Registry, entity: Entity) -> Result<bool, ScenarioError> {
        let replaced = match self {
            Built::Pump(c) => reg.insert(entity, c)?.is_some(),
            Built::Valve(c) => reg.insert(entity, c)?.is_some(),
            Built::Tank(c) => reg.insert(entity, c)?.is_some(),
            Built::Pipe(c) => reg.insert(entity, c)?.is_some(),
            Built::Pid(c) => reg.insert(entity, c)?.is_some(),
            Built::Alarm(c) => reg.insert(entity, c)?.is_some(),
            Built::HeatExchanger(c) => reg.insert(entity, c)?.is_some(),
            Built::HumanFactors(c) => reg.insert(entity, c)?.is_some(),
            Built::Response(c) => reg.insert(entity, c)?.is_some(),
            Built::SiteKpi(c) => reg.insert(entity, c)?.is_some(),
        };
        Ok(replaced)
    }
}

/// Typed access to one record's parameters.
struct Params<'a> {
    id: &'a str,
    values: &'a BTreeMap<String, ParamValue>,
}

impl Params<'_> {
    fn number(&self, key: &str, default: f64) -> Result<f64, ScenarioError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Number(n)) if n.is_finite() => Ok(*n),
            Some(ParamValue::Number(_)) => {
                Err(ScenarioError::invalid_param(self.id, key, "must be finite"))
            }
            Some(ParamValue::Bool(_)) => Err(ScenarioError::invalid_param(
                self.id,
                key,
                "must be a number, not a boolean",
            )),
        }
    }

    fn non_negative(&self, key: &str, default: f64) -> Result<f64, ScenarioError> {
        let value = self.number(key, default)?;
        if value < 0.0 {
            return Err(ScenarioError::invalid_param(
                self.id,
                key,
                format!("must not be negative (got {})", value),
            ));
        }
        Ok(value)
    }

    fn positive(&self, key: &str, default: f64) -> Result<f64, ScenarioError> {
        let value = self.number(key, default)?;
        if value <= 0.0 {
            return Err(ScenarioError::invalid_param(
                self.id,
                key,
                format!("must be positive (got {})", value),
            ));
        }
        Ok(value)
    }

    /// A normalized quantity; authored values outside [0, 1] are clamped.
    fn fraction(&self, key: &str, default: f64) -> Result<f64, ScenarioError> {
        Ok(self.number(key, default)?.clamp(0.0, 1.0))
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ScenarioError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Bool(b)) => Ok(*b),
            Some(ParamValue::Number(_)) => Err(ScenarioError::invalid_param(
                self.id,
                key,
                "must be a boolean, not a number",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOP: &str = r#"{
        "components": [
            { "id": "LIC-101", "type": "Pump", "params": { "dp_nominal": 2.5 } },
            { "id": "LIC-101", "type": "Tank", "params": { "level": 0.45, "area": 3.0 } },
            { "id": "LIC-101", "type": "PID", "params": { "sp": 0.7 }, "outputs": ["FV-101"] },
            { "id": "SITE", "type": "SiteKPI" }
        ]
    }"#;

    fn load(text: &str) -> Result<(Registry, BTreeMap<String, Entity>, usize), ScenarioError> {
        let mut reg = Registry::new();
        let mut ids = BTreeMap::new();
        let created = ScenarioDocument::from_json(text)?.apply(&mut reg, &mut ids)?;
        Ok((reg, ids, created))
    }

    #[test]
    fn test_shared_id_shares_entity() {
        let (reg, ids, created) = load(LOOP).unwrap();
        assert_eq!(created, 2);
        assert_eq!(reg.len(), 2);

        let e = ids["LIC-101"];
        assert_eq!(reg.get::<Pump>(e).unwrap().nominal_dp, 2.5);
        assert_eq!(reg.get::<Tank>(e).unwrap().level, 0.45);
        assert_eq!(reg.get::<Tank>(e).unwrap().area, 3.0);
        assert_eq!(reg.get::<Pid>(e).unwrap().setpoint, 0.7);
        assert!(reg.has::<SiteKpi>(ids["SITE"]));
    }

    #[test]
    fn test_omitted_params_take_defaults() {
        let (reg, ids, _) = load(r#"{"components":[
            {"id":"A","type":"ValveActuator"},
            {"id":"A","type":"HeatExchanger"},
            {"id":"A","type":"HumanFactors"},
            {"id":"A","type":"AlarmResponse"},
            {"id":"A","type":"Alarmable"},
            {"id":"A","type":"Pipe"}
        ]}"#)
        .unwrap();

        let e = ids["A"];
        assert_eq!(reg.get::<ValveActuator>(e), Some(&ValveActuator::default()));
        assert_eq!(reg.get::<HeatExchanger>(e), Some(&HeatExchanger::default()));
        assert_eq!(reg.get::<HumanFactors>(e), Some(&HumanFactors::default()));
        assert_eq!(reg.get::<AlarmResponse>(e), Some(&AlarmResponse::default()));
        assert_eq!(reg.get::<Alarmable>(e), Some(&Alarmable::default()));
        assert_eq!(reg.get::<Pipe>(e), Some(&Pipe::default()));
    }

    #[test]
    fn test_records_without_id_get_fresh_entities() {
        let (reg, ids, created) = load(r#"{"components":[
            {"type":"Tank"}, {"type":"Tank"}
        ]}"#)
        .unwrap();
        assert_eq!(created, 2);
        assert_eq!(reg.count::<Tank>(), 2);
        assert!(ids.is_empty());
    }

    #[test]
    fn test_type_tags_are_case_insensitive() {
        let (reg, _, _) = load(r#"{"components":[{"id":"C","type":"pid"}]}"#).unwrap();
        assert_eq!(reg.count::<Pid>(), 1);
    }

    #[test]
    fn test_fractions_are_clamped() {
        let (reg, ids, _) = load(r#"{"components":[
            {"id":"T","type":"Tank","params":{"level":1.7}},
            {"id":"T","type":"ValveActuator","params":{"cmd":-0.2,"pos":3}}
        ]}"#)
        .unwrap();
        let e = ids["T"];
        assert_eq!(reg.get::<Tank>(e).unwrap().level, 1.0);
        assert_eq!(reg.get::<ValveActuator>(e).unwrap().command, 0.0);
        assert_eq!(reg.get::<ValveActuator>(e).unwrap().position, 1.0);
    }

    #[test]
    fn test_missing_components_array() {
        assert!(matches!(
            ScenarioDocument::from_json(r#"{"items":[]}"#),
            Err(ScenarioError::MissingComponents)
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ScenarioDocument::from_json("{\"components\": ["),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_type_rejects_whole_document() {
        let mut reg = Registry::new();
        let mut ids = BTreeMap::new();
        let doc = ScenarioDocument::from_json(r#"{"components":[
            {"id":"A","type":"Tank"},
            {"id":"B","type":"Boiler"}
        ]}"#)
        .unwrap();

        let err = doc.apply(&mut reg, &mut ids).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownType { index: 1, .. }));
        assert!(reg.is_empty());
        assert!(ids.is_empty());
    }

    #[test]
    fn test_wrong_typed_param_rejected() {
        let err = load(r#"{"components":[{"id":"P","type":"Pump","params":{"running":1}}]}"#)
            .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidParam { ref key, .. } if key == "running"));

        let err = load(r#"{"components":[{"id":"T","type":"Tank","params":{"area":true}}]}"#)
            .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidParam { ref key, .. } if key == "area"));
    }

    #[test]
    fn test_negative_physical_param_rejected() {
        let err = load(r#"{"components":[{"id":"T","type":"Tank","params":{"area":-2}}]}"#)
            .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidParam { .. }));
    }

    #[test]
    fn test_zero_rate_and_size_params_rejected() {
        for (kind, key) in [
            ("ValveActuator", "speed"),
            ("Tank", "area"),
            ("HeatExchanger", "flow_rate"),
            ("HeatExchanger", "tau_s"),
        ] {
            let text = format!(
                r#"{{"components":[{{"id":"X","type":"{}","params":{{"{}":0}}}}]}}"#,
                kind, key
            );
            let err = load(&text).unwrap_err();
            assert!(
                matches!(err, ScenarioError::InvalidParam { key: ref k, .. } if k == key),
                "{}.{} = 0 was accepted",
                kind,
                key
            );
        }
    }

    #[test]
    fn test_zero_pipe_resistance_allowed() {
        let (reg, ids, _) =
            load(r#"{"components":[{"id":"L","type":"Pipe","params":{"k":0}}]}"#).unwrap();
        assert_eq!(reg.get::<Pipe>(ids["L"]).unwrap().resistance, 0.0);
    }

    #[test]
    fn test_string_param_is_parse_error() {
        let err = load(r#"{"components":[{"id":"T","type":"Tank","params":{"level":"high"}}]}"#)
            .unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn test_second_load_reuses_known_ids() {
        let mut reg = Registry::new();
        let mut ids = BTreeMap::new();
        ScenarioDocument::from_json(LOOP)
            .unwrap()
            .apply(&mut reg, &mut ids)
            .unwrap();

        let extra = ScenarioDocument::new()
            .with(ComponentRecord::new("LIC-101", ComponentKind::Alarmable))
            .with(ComponentRecord::new("E-201", ComponentKind::HeatExchanger));
        let created = extra.apply(&mut reg, &mut ids).unwrap();

        assert_eq!(created, 1);
        assert!(reg.has::<Alarmable>(ids["LIC-101"]));
        assert!(reg.has::<Tank>(ids["LIC-101"]));
    }

    #[test]
    fn test_builder_round_trips_through_json() {
        let doc = ScenarioDocument::new().with(
            ComponentRecord::new("FV-101", ComponentKind::ValveActuator)
                .param("speed", 0.25)
                .param("fail_closed", false)
                .output("T-101"),
        );
        let parsed = ScenarioDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_staff_count_rounds() {
        let (reg, ids, _) = load(r#"{"components":[
            {"id":"S","type":"HumanFactors","params":{"staff_on_shift":2.6}}
        ]}"#)
        .unwrap();
        assert_eq!(reg.get::<HumanFactors>(ids["S"]).unwrap().staff_on_shift, 3);
    }
}
