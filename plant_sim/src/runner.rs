//! Scenario runners - headless (manual clock) and real-time (tokio clock).

use crate::clock::ManualClock;
use crate::exporter::{FrameExport, PlantFrame};
use crate::simulation::Simulation;
use crate::world::{SimConfig, SimCore};

use plant_core::KpiSummary;
use plant_env::{EnvError, TickRate, TokioClock};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

/// Results from running a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    /// Scenario name or file path
    pub scenario: String,

    /// Total ticks executed
    pub steps: u64,

    /// Final simulation time in seconds
    pub sim_time_secs: f64,

    /// Live entities at the end of the run
    pub entity_count: usize,

    /// KPI digest at the end of the run
    pub kpi: Option<KpiSummary>,

    /// Recorded frames, when enabled
    #[serde(skip)]
    pub export: Option<FrameExport>,
}

impl RunResult {
    fn collect(scenario: &str, sim: &Simulation, export: Option<FrameExport>) -> Self {
        sim.with_core(|core| {
            let kpi = core.kpi_summary();
            let export = export.map(|mut export| {
                export.finalize(kpi.clone());
                export
            });
            Self {
                scenario: scenario.to_string(),
                steps: core.step(),
                sim_time_secs: core.elapsed_secs(),
                entity_count: core.registry().len(),
                kpi,
                export,
            }
        })
    }
}

/// Ticks a core as fast as possible through a [`ManualClock`].
pub struct HeadlessRunner {
    config: SimConfig,
    record_frames: bool,
}

impl HeadlessRunner {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            record_frames: false,
        }
    }

    /// Records a frame every `export_interval` steps.
    pub fn with_frames(mut self, enabled: bool) -> Self {
        self.record_frames = enabled;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs `core` for the configured duration and returns the result.
    pub fn run(&self, scenario: &str, mut core: SimCore) -> Result<RunResult, EnvError> {
        let rate = self.config.rate()?;
        let total = self.config.total_ticks()?;
        info!(
            "Running {} headless: {} ticks at {} ({:.1}s)",
            scenario, total, rate, self.config.duration_secs
        );

        core.set_pipeline(self.config.pipeline);
        let clock = ManualClock::new();
        let sim = Simulation::new(core, clock.clone());
        sim.start(rate.hz())?;

        let mut export = self
            .record_frames
            .then(|| FrameExport::new(scenario, rate.hz()));
        let interval = self.config.export_interval.max(1);
        let progress_every = progress_interval(rate);

        let mut done = 0;
        while done < total {
            let fired = clock.advance(interval.min(total - done));
            if fired == 0 {
                break;
            }
            done += fired;

            if let Some(export) = export.as_mut() {
                export.add_frame(sim.with_core(PlantFrame::capture));
            }
            if done % progress_every < fired {
                sim.with_core(log_progress);
            }
        }
        sim.stop();

        Ok(RunResult::collect(scenario, &sim, export))
    }
}

/// Ticks a core on the wall clock for `config.duration_secs` real seconds.
///
/// Must be called inside a tokio runtime.
pub async fn run_realtime(
    scenario: &str,
    mut core: SimCore,
    config: &SimConfig,
    record_frames: bool,
) -> Result<RunResult, EnvError> {
    let rate = config.rate()?;
    let duration = config.duration()?;
    info!(
        "Running {} in real time at {} for {:.1}s",
        scenario, rate, config.duration_secs
    );

    core.set_pipeline(config.pipeline);
    let sim = Simulation::new(core, TokioClock::current()?);
    let mut frames = sim.subscribe();
    sim.start(rate.hz())?;

    let mut export = record_frames.then(|| FrameExport::new(scenario, rate.hz()));
    let interval = config.export_interval.max(1);
    let progress_every = progress_interval(rate);

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            frame = frames.recv() => match frame {
                Ok(_) => {
                    let step = sim.step();
                    if step % interval == 0 {
                        if let Some(export) = export.as_mut() {
                            export.add_frame(sim.with_core(PlantFrame::capture));
                        }
                    }
                    if step % progress_every == 0 {
                        sim.with_core(log_progress);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!("Frame listener lagged by {} ticks", missed);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    sim.stop();

    Ok(RunResult::collect(scenario, &sim, export))
}

/// About one progress line per simulated second.
fn progress_interval(rate: TickRate) -> u64 {
    (rate.hz().round() as u64).max(1)
}

fn log_progress(core: &SimCore) {
    match core.kpi_summary() {
        Some(kpi) => debug!(
            "  t={:.1}s | step={} | raised={} active={} downtime={:.1}s",
            core.elapsed_secs(),
            core.step(),
            kpi.alarms_raised,
            kpi.alarms_active,
            kpi.downtime_seconds
        ),
        None => debug!("  t={:.1}s | step={}", core.elapsed_secs(), core.step()),
    }
}
