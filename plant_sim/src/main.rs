//! Plant Simulator CLI
//!
//! Run built-in or JSON-defined plant scenarios headless or on the wall clock.

use clap::Parser;
use plant_core::{AutoCancelPolicy, PipelineConfig};
use plant_sim::{run_realtime, HeadlessRunner, RunResult, ScenarioId, SimConfig, SimCore};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Plant simulator CLI
#[derive(Parser, Debug)]
#[command(name = "plant-sim")]
#[command(about = "Run deterministic industrial plant simulations", long_about = None)]
struct Args {
    /// Built-in scenario (default_loop, high_level_trip, heat_exchanger, night_shift, all)
    #[arg(short = 'S', long, default_value = "default_loop")]
    scenario: String,

    /// JSON scenario file; overrides --scenario and falls back to the default plant on error
    #[arg(short, long)]
    file: Option<String>,

    /// Tick rate in Hz (floored at 1)
    #[arg(short, long, default_value = "50")]
    rate: f64,

    /// Simulated duration in seconds
    #[arg(short, long, default_value = "10")]
    duration: f64,

    /// Tick on the wall clock instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Auto-cancelled alarms also retract their raise count
    #[arg(long)]
    retract_raised: bool,

    /// Export frames to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// JSON summary output
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// What a single run loads.
enum Source {
    Builtin(ScenarioId),
    File(String),
}

impl Source {
    fn name(&self) -> String {
        match self {
            Source::Builtin(id) => id.name().to_string(),
            Source::File(path) => path.clone(),
        }
    }

    fn load(&self, core: &mut SimCore) {
        match self {
            Source::Builtin(id) => {
                if let Err(e) = core.load_scenario(*id) {
                    warn!("{}: {}; falling back to the default scenario", id, e);
                    core.load_default_scenario();
                }
            }
            Source::File(path) => {
                core.load_scenario_file_or_default(path);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("Plant Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let sources: Vec<Source> = match &args.file {
        Some(path) => vec![Source::File(path.clone())],
        None if args.scenario == "all" => {
            ScenarioId::all().into_iter().map(Source::Builtin).collect()
        }
        None => vec![Source::Builtin(args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            let names: Vec<&str> = ScenarioId::all().iter().map(ScenarioId::name).collect();
            eprintln!("Available scenarios: {}, all", names.join(", "));
            std::process::exit(1);
        }))],
    };

    if args.export.is_some() && sources.len() > 1 {
        eprintln!("Error: --export only supports a single scenario, not 'all'");
        std::process::exit(1);
    }

    let config = SimConfig {
        tick_rate_hz: args.rate,
        duration_secs: args.duration,
        pipeline: PipelineConfig {
            auto_cancel: if args.retract_raised {
                AutoCancelPolicy::RetractRaised
            } else {
                AutoCancelPolicy::KeepRaised
            },
        },
        ..SimConfig::default()
    };
    if let Err(e) = config.rate().and_then(|_| config.total_ticks()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    let record_frames = args.export.is_some();

    let mut results: Vec<RunResult> = Vec::new();
    for source in &sources {
        let mut core = match SimCore::from_config(&config) {
            Ok(core) => core,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        source.load(&mut core);

        let name = source.name();
        let outcome = if args.realtime {
            run_realtime(&name, core, &config, record_frames).await
        } else {
            HeadlessRunner::new(config.clone())
                .with_frames(record_frames)
                .run(&name, core)
        };

        match outcome {
            Ok(result) => {
                if !args.json {
                    report(&result);
                }
                results.push(result);
            }
            Err(e) => {
                error!("✗ {} could not run: {}", name, e);
                std::process::exit(1);
            }
        }
    }

    if let Some(path) = &args.export {
        if let Some(export) = results.first().and_then(|r| r.export.as_ref()) {
            match export.write_to_file(path) {
                Ok(()) => info!("Exported {} frames to {}", export.frames.len(), path),
                Err(e) => error!("Failed to write export: {:?}", e),
            }
        }
    }

    if args.json {
        let summary = serde_json::json!({
            "tick_rate_hz": config.tick_rate_hz,
            "duration_secs": config.duration_secs,
            "auto_cancel": format!("{:?}", config.pipeline.auto_cancel),
            "results": results,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("✅ {} scenario run(s) complete", results.len());
    }
}

fn report(result: &RunResult) {
    info!(
        "✓ {} | steps={} | t={:.1}s | entities={}",
        result.scenario, result.steps, result.sim_time_secs, result.entity_count
    );
    if let Some(kpi) = &result.kpi {
        info!(
            "    raised={} active={} downtime={:.1}s availability={:.1}%",
            kpi.alarms_raised,
            kpi.alarms_active,
            kpi.downtime_seconds,
            kpi.availability * 100.0
        );
    }
}
