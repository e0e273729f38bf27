//! JSON frame exporter.
//!
//! Exports periodic plant frames as pretty JSON for offline plotting.

use crate::world::SimCore;

use plant_core::{Alarmable, AlarmResponse, KpiSummary, Pump, ResponseState, Tank};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single frame of simulation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantFrame {
    pub step: u64,

    /// Simulation time in seconds
    pub time_sec: f64,

    pub tanks: Vec<TankSample>,

    pub pumps: Vec<PumpSample>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alarms: Vec<AlarmSample>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kpi: Option<KpiSummary>,
}

/// Tank state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankSample {
    pub id: String,
    pub level: f64,
    pub inflow: f64,
}

/// Pump state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpSample {
    pub id: String,
    pub running: bool,
    pub flow: f64,
}

/// Alarm and response state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSample {
    pub id: String,
    pub hi: bool,
    pub lo: bool,
    pub latched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseState>,
}

impl PlantFrame {
    /// Captures the core's current state.
    pub fn capture(core: &SimCore) -> Self {
        let reg = core.registry();
        Self {
            step: core.step(),
            time_sec: core.elapsed_secs(),
            tanks: reg
                .view::<Tank>()
                .map(|(e, tank)| TankSample {
                    id: core.label(e),
                    level: tank.level,
                    inflow: tank.inflow,
                })
                .collect(),
            pumps: reg
                .view::<Pump>()
                .map(|(e, pump)| PumpSample {
                    id: core.label(e),
                    running: pump.running,
                    flow: pump.flow,
                })
                .collect(),
            alarms: reg
                .view::<Alarmable>()
                .map(|(e, alarm)| AlarmSample {
                    id: core.label(e),
                    hi: alarm.hi,
                    lo: alarm.lo,
                    latched: alarm.latched,
                    response: reg.get::<AlarmResponse>(e).map(AlarmResponse::state),
                })
                .collect(),
            kpi: core.kpi_summary(),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameExport {
    /// Scenario name or file path
    pub scenario: String,

    pub tick_rate_hz: f64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<PlantFrame>,

    /// Final KPI digest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_kpi: Option<KpiSummary>,
}

impl FrameExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, tick_rate_hz: f64) -> Self {
        Self {
            scenario: scenario.to_string(),
            tick_rate_hz,
            duration_sec: 0.0,
            frames: Vec::new(),
            final_kpi: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: PlantFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, kpi: Option<KpiSummary>) {
        self.final_kpi = kpi;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
