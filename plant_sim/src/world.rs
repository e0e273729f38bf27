//! SimCore - the plant store plus its tick bookkeeping.

use crate::display::{self, DisplayModel};
use crate::error::ScenarioError;
use crate::loader::ScenarioDocument;
use crate::scenarios::ScenarioId;

use plant_core::{run_tick, Entity, KpiSummary, PipelineConfig, Registry};
use plant_env::{EnvError, TickRate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Buffered frame notifications per subscriber before it starts lagging.
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Tick rate in Hz (floored at 1)
    pub tick_rate_hz: f64,

    /// Simulated duration in seconds
    pub duration_secs: f64,

    /// Per-tick system options
    pub pipeline: PipelineConfig,

    /// Record an export frame every N steps
    pub export_interval: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: TickRate::DEFAULT_HZ,
            duration_secs: 10.0,
            pipeline: PipelineConfig::default(),
            export_interval: 25,
        }
    }
}

impl SimConfig {
    /// Validated tick rate.
    pub fn rate(&self) -> Result<TickRate, EnvError> {
        TickRate::from_hz(self.tick_rate_hz)
    }

    /// Validated run duration. Finite negative durations count as zero.
    pub fn duration(&self) -> Result<Duration, EnvError> {
        if !self.duration_secs.is_finite() {
            return Err(EnvError::InvalidDuration(self.duration_secs));
        }
        Duration::try_from_secs_f64(self.duration_secs.max(0.0))
            .map_err(|_| EnvError::InvalidDuration(self.duration_secs))
    }

    /// Whole ticks needed to cover `duration_secs` at the configured rate.
    pub fn total_ticks(&self) -> Result<u64, EnvError> {
        let rate = self.rate()?;
        let ticks = (self.duration()?.as_secs_f64() * rate.hz()).round();
        if ticks >= u64::MAX as f64 {
            return Err(EnvError::InvalidDuration(self.duration_secs));
        }
        Ok(ticks as u64)
    }
}

/// Emitted after every completed tick. Carries nothing; readers pull the
/// state they need from the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReady;

/// The plant store, the scenario id map and the tick counters.
///
/// `SimCore` is synchronous and knows nothing about clocks; something else
/// (a [`crate::Simulation`] or the headless runner) decides when to call
/// [`SimCore::tick`].
pub struct SimCore {
    registry: Registry,
    entity_from_id: BTreeMap<String, Entity>,
    loaded: ScenarioDocument,
    rate: TickRate,
    pipeline: PipelineConfig,
    step: u64,
    elapsed_secs: f64,
    frames: broadcast::Sender<FrameReady>,
}

impl SimCore {
    /// Creates an empty core at the default rate.
    pub fn new(pipeline: PipelineConfig) -> Self {
        let (frames, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        Self {
            registry: Registry::new(),
            entity_from_id: BTreeMap::new(),
            loaded: ScenarioDocument::new(),
            rate: TickRate::default(),
            pipeline,
            step: 0,
            elapsed_secs: 0.0,
            frames,
        }
    }

    /// Creates an empty core from a run configuration.
    pub fn from_config(config: &SimConfig) -> Result<Self, EnvError> {
        let mut core = Self::new(config.pipeline);
        core.set_rate(config.rate()?);
        Ok(core)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Direct store access for tests and tools. Systems never see this.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Completed ticks since creation.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Simulated seconds since creation.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn rate(&self) -> TickRate {
        self.rate
    }

    pub fn dt(&self) -> f64 {
        self.rate.dt_secs()
    }

    pub fn set_rate(&mut self, rate: TickRate) {
        self.rate = rate;
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    pub fn set_pipeline(&mut self, pipeline: PipelineConfig) {
        self.pipeline = pipeline;
    }

    /// Runs the whole pipeline once and notifies subscribers.
    pub fn tick(&mut self) {
        run_tick(&mut self.registry, self.rate.dt_secs(), &self.pipeline);
        self.step += 1;
        self.elapsed_secs += self.rate.dt_secs();
        // No subscribers is normal for headless runs
        let _ = self.frames.send(FrameReady);
    }

    /// Subscribes to per-tick notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<FrameReady> {
        self.frames.subscribe()
    }

    /// Live entity for a scenario id.
    pub fn entity(&self, id: &str) -> Option<Entity> {
        self.entity_from_id
            .get(id)
            .copied()
            .filter(|&entity| self.registry.is_alive(entity))
    }

    /// Scenario id of an entity, or its handle when it has none.
    pub fn label(&self, entity: Entity) -> String {
        self.entity_from_id
            .iter()
            .find(|(_, &e)| e == entity)
            .map(|(id, _)| id.clone())
            .unwrap_or_else(|| entity.to_string())
    }

    /// Known scenario ids and their entities.
    pub fn ids(&self) -> impl Iterator<Item = (&str, Entity)> + '_ {
        self.entity_from_id.iter().map(|(id, &e)| (id.as_str(), e))
    }

    /// Applies a parsed document. Returns the number of entities created.
    pub fn load_document(&mut self, doc: &ScenarioDocument) -> Result<usize, ScenarioError> {
        let created = doc.apply(&mut self.registry, &mut self.entity_from_id)?;
        self.loaded.components.extend(doc.components.iter().cloned());
        Ok(created)
    }

    /// Loads a JSON scenario from text.
    pub fn load_scenario_str(&mut self, text: &str) -> Result<usize, ScenarioError> {
        let doc = ScenarioDocument::from_json(text)?;
        self.load_document(&doc)
    }

    /// Loads a JSON scenario file.
    pub fn load_scenario_file(&mut self, path: impl AsRef<Path>) -> Result<usize, ScenarioError> {
        let path = path.as_ref();
        let doc = ScenarioDocument::from_file(path)?;
        let created = self.load_document(&doc)?;
        info!(
            "Loaded scenario {} ({} records, {} entities)",
            path.display(),
            doc.components.len(),
            created
        );
        Ok(created)
    }

    /// Installs a built-in scenario.
    pub fn load_scenario(&mut self, id: ScenarioId) -> Result<usize, ScenarioError> {
        let created = self.load_document(&id.document())?;
        info!("Loaded built-in scenario {} ({} entities)", id, created);
        Ok(created)
    }

    /// Installs the built-in default plant.
    pub fn load_default_scenario(&mut self) -> usize {
        self.load_scenario(ScenarioId::DefaultLoop)
            .unwrap_or_else(|e| {
                warn!("Default scenario rejected: {}", e);
                0
            })
    }

    /// Loads a scenario file, falling back to the default plant on failure.
    pub fn load_scenario_file_or_default(&mut self, path: impl AsRef<Path>) -> usize {
        match self.load_scenario_file(path.as_ref()) {
            Ok(created) => created,
            Err(e) => {
                warn!("{}; falling back to the default scenario", e);
                self.load_default_scenario()
            }
        }
    }

    /// A display model for everything loaded so far, filled with current values.
    pub fn display_model(&self) -> DisplayModel {
        let mut model = DisplayModel::from_document(&self.loaded);
        self.push_to_display(&mut model);
        model
    }

    /// Writes current component values into every node mapped to a live
    /// entity. Returns the number of nodes updated.
    pub fn push_to_display(&self, model: &mut DisplayModel) -> usize {
        let mut updated = 0;
        for node in model.nodes_mut() {
            if let Some(entity) = self.entity(&node.id) {
                display::write_entity(&self.registry, entity, node);
                updated += 1;
            }
        }
        updated
    }

    /// KPI digest at the current simulated time, if a site KPI exists.
    pub fn kpi_summary(&self) -> Option<KpiSummary> {
        KpiSummary::from_registry(&self.registry, self.elapsed_secs)
    }
}

impl Default for SimCore {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayNode;
    use crate::scenarios::{LOOP_ID, SITE_ID};
    use plant_core::{AutoCancelPolicy, Tank};

    #[test]
    fn test_tick_advances_counters() {
        let mut core = SimCore::default();
        core.load_default_scenario();

        for _ in 0..50 {
            core.tick();
        }
        assert_eq!(core.step(), 50);
        assert!((core.elapsed_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_notifies_subscribers() {
        let mut core = SimCore::default();
        let mut rx = core.subscribe();

        core.tick();
        core.tick();
        assert_eq!(rx.try_recv(), Ok(FrameReady));
        assert_eq!(rx.try_recv(), Ok(FrameReady));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_rate_sets_dt() {
        let config = SimConfig {
            tick_rate_hz: 10.0,
            ..SimConfig::default()
        };
        let core = SimCore::from_config(&config).unwrap();
        assert!((core.dt() - 0.1).abs() < 1e-12);
        assert_eq!(config.total_ticks(), Ok(100));
    }

    #[test]
    fn test_unrepresentable_duration_rejected() {
        for duration_secs in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN, 1e20] {
            let config = SimConfig {
                duration_secs,
                ..SimConfig::default()
            };
            assert!(matches!(config.duration(), Err(EnvError::InvalidDuration(_))));
            assert!(matches!(config.total_ticks(), Err(EnvError::InvalidDuration(_))));
        }
    }

    #[test]
    fn test_negative_duration_is_zero() {
        let config = SimConfig {
            duration_secs: -3.0,
            ..SimConfig::default()
        };
        assert_eq!(config.duration(), Ok(Duration::ZERO));
        assert_eq!(config.total_ticks(), Ok(0));
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let config = SimConfig {
            tick_rate_hz: f64::NAN,
            ..SimConfig::default()
        };
        assert!(SimCore::from_config(&config).is_err());
    }

    #[test]
    fn test_failed_load_leaves_store_untouched() {
        let mut core = SimCore::default();
        core.load_default_scenario();
        let before = core.registry().clone();

        let err = core
            .load_scenario_str(r#"{"components":[{"id":"X","type":"Tank"},{"type":"Nope"}]}"#);
        assert!(err.is_err());
        assert_eq!(core.registry(), &before);
        assert!(core.entity("X").is_none());
    }

    #[test]
    fn test_file_fallback_to_default() {
        let mut core = SimCore::default();
        let created = core.load_scenario_file_or_default("/nonexistent/plant.json");
        assert!(created > 0);
        assert!(core.entity(LOOP_ID).is_some());
    }

    #[test]
    fn test_push_to_display_skips_unknown_ids() {
        let mut core = SimCore::default();
        core.load_default_scenario();
        core.tick();

        let mut model = core.display_model();
        model.insert(DisplayNode::new("GHOST"));
        let updated = core.push_to_display(&mut model);

        assert_eq!(updated, 2);
        let tank = model.node(LOOP_ID).unwrap();
        let level = core
            .registry()
            .get::<Tank>(core.entity(LOOP_ID).unwrap())
            .unwrap()
            .level;
        assert_eq!(tank.number("level"), Some(level));
        assert!(model.node(SITE_ID).unwrap().number("alarms_raised").is_some());
        assert!(model.node("GHOST").unwrap().numbers.is_empty());
    }

    #[test]
    fn test_destroyed_entity_not_pushed() {
        let mut core = SimCore::default();
        core.load_default_scenario();
        let mut model = core.display_model();

        let site = core.entity(SITE_ID).unwrap();
        core.registry_mut().destroy(site);

        assert!(core.entity(SITE_ID).is_none());
        assert_eq!(core.push_to_display(&mut model), 1);
    }

    #[test]
    fn test_kpi_summary_tracks_elapsed() {
        let mut core = SimCore::new(PipelineConfig {
            auto_cancel: AutoCancelPolicy::RetractRaised,
        });
        core.load_default_scenario();
        assert_eq!(core.pipeline().auto_cancel, AutoCancelPolicy::RetractRaised);

        core.tick();
        let summary = core.kpi_summary().unwrap();
        assert!(summary.availability <= 1.0);
    }

    #[test]
    fn test_label_prefers_scenario_id() {
        let mut core = SimCore::default();
        core.load_default_scenario();
        let e = core.entity(LOOP_ID).unwrap();
        assert_eq!(core.label(e), LOOP_ID);

        let anonymous = core.registry_mut().create();
        assert_eq!(core.label(anonymous), anonymous.to_string());
    }
}
