// src/main.rs
//
// Replay driver: feeds recorded SignalFrames through the decision core and
// prints one JSON line per tick.
//
//   drive-planner [config.yaml] <frames.jsonl>
//
// Each input line is a SignalFrame; an optional "dt" field overrides the
// nominal model tick period for that frame.

use anyhow::{bail, Context, Result};
use drive_planner::longitudinal::{KinematicSolver, DT_MDL};
use drive_planner::settings::FileSettings;
use drive_planner::{Config, DrivingCore, SignalFrame};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config.yaml";

#[derive(Deserialize)]
struct ReplayLine {
    #[serde(flatten)]
    frame: SignalFrame,
    dt: Option<f32>,
}

fn parse_args() -> Result<(Option<String>, String)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [frames] => Ok((None, frames.clone())),
        [config, frames] => Ok((Some(config.clone()), frames.clone())),
        _ => bail!("usage: drive-planner [config.yaml] <frames.jsonl>"),
    }
}

fn load_config(path: Option<&str>) -> Result<(Config, String)> {
    match path {
        Some(path) => Ok((Config::load(path)?, path.to_string())),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            Ok((Config::load(DEFAULT_CONFIG)?, DEFAULT_CONFIG.to_string()))
        }
        None => Ok((Config::default(), DEFAULT_CONFIG.to_string())),
    }
}

fn main() -> Result<()> {
    let (config_path, frames_path) = parse_args()?;
    let (config, settings_path) = load_config(config_path.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚗 Drive planner replay starting");
    info!(
        "✓ Configuration loaded (nudgeless={}, conditional={}, personal_tune={})",
        config.lane_change.nudgeless, config.conditional.enabled, config.vehicle.personal_tune
    );

    let contents = fs::read_to_string(&frames_path)
        .with_context(|| format!("Failed to read frames {frames_path}"))?;

    let mut core = DrivingCore::new(
        &config,
        KinematicSolver::new(),
        FileSettings::new(settings_path),
    );

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let replay: ReplayLine = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse frame on line {}", idx + 1))?;

        let dt = match replay.dt {
            Some(dt) if dt > 0.0 => dt,
            Some(dt) => {
                warn!("⚠️ Line {}: non-positive dt {:.3}s, using {:.2}s", idx + 1, dt, DT_MDL);
                DT_MDL
            }
            None => DT_MDL,
        };

        let output = core.tick(&replay.frame, dt);
        println!("{}", serde_json::to_string(&output)?);
    }

    let summary = core.metrics().summary();
    info!("📊 Replay summary: {}", serde_json::to_string(&summary)?);
    Ok(())
}
