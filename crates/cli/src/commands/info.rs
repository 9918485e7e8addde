//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{AdasConfig, AudioCue};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    simulator: SimulatorInfo,
    ego_blueprint: String,
    cameras: CameraInfo,
    detection: DetectionInfo,
    warning_clear_time: f64,
    target_fps: u32,
    audio: Vec<CueInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SimulatorInfo {
    host: String,
    port: u16,
    fixed_delta_seconds: f64,
    traffic_vehicles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct CameraInfo {
    width: u32,
    height: u32,
    fov: f64,
    frequency_hz: f64,
}

#[derive(Serialize)]
struct DetectionInfo {
    skip_frames: u32,
    confidence_threshold: f32,
    vehicle_keywords: Vec<String>,
}

#[derive(Serialize)]
struct CueInfo {
    cue: &'static str,
    path: String,
    available: bool,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn cue_infos(config: &AdasConfig) -> Vec<CueInfo> {
    AudioCue::ALL
        .into_iter()
        .map(|cue| {
            let path = config.audio.cue_path(cue);
            CueInfo {
                cue: cue.as_str(),
                available: config.audio.enabled && path.is_file(),
                path: path.display().to_string(),
            }
        })
        .collect()
}

fn build_config_info(config: &AdasConfig) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        simulator: SimulatorInfo {
            host: config.simulator.host.clone(),
            port: config.simulator.port,
            fixed_delta_seconds: config.simulator.fixed_delta_seconds,
            traffic_vehicles: config.simulator.traffic_vehicles,
            seed: config.simulator.seed,
        },
        ego_blueprint: config.ego.blueprint.clone(),
        cameras: CameraInfo {
            width: config.cameras.width,
            height: config.cameras.height,
            fov: config.cameras.fov,
            frequency_hz: config.cameras.frequency_hz,
        },
        detection: DetectionInfo {
            skip_frames: config.detection.skip_frames,
            confidence_threshold: config.detection.confidence_threshold,
            vehicle_keywords: config.detection.vehicle_keywords.clone(),
        },
        warning_clear_time: config.alerts.warning_clear_time,
        target_fps: config.main_loop.target_fps,
        audio: cue_infos(config),
        sinks: config
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect(),
    }
}

fn print_config_info(config: &AdasConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                ADAS Dashboard Configuration                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let sim = &config.simulator;
    println!("🌐 Simulator");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Server: {}:{}", sim.host, sim.port);
    println!(
        "   ├─ Step: {}s (synchronous: {})",
        sim.fixed_delta_seconds, sim.synchronous_mode
    );
    println!("   ├─ Traffic: {} vehicles", sim.traffic_vehicles);
    match sim.seed {
        Some(seed) => println!("   └─ Seed: {}", seed),
        None => println!("   └─ Seed: (random)"),
    }

    println!("\n🚗 Ego: {}", config.ego.blueprint);
    println!(
        "   └─ 📷 Cameras: {}x{}, fov {}°, {} Hz",
        config.cameras.width, config.cameras.height, config.cameras.fov, config.cameras.frequency_hz
    );

    println!("\n⚙️  Alerts");
    println!("   ├─ Detection every {} ticks", config.detection.skip_frames);
    println!(
        "   ├─ Confidence threshold: {}",
        config.detection.confidence_threshold
    );
    println!("   ├─ Vehicle keywords: {:?}", config.detection.vehicle_keywords);
    println!(
        "   ├─ Warning clear time: {}s",
        config.alerts.warning_clear_time
    );
    println!("   └─ Target FPS: {}", config.main_loop.target_fps);

    let cues = cue_infos(config);
    println!(
        "\n🔊 Audio ({})",
        if config.audio.enabled { "enabled" } else { "disabled" }
    );
    for (i, cue) in cues.iter().enumerate() {
        let prefix = if i == cues.len() - 1 { "└─" } else { "├─" };
        let mark = if cue.available { "✓" } else { "✗" };
        println!("   {} {} {} ({})", prefix, mark, cue.cue, cue.path);
    }

    if !config.sinks.is_empty() {
        println!("\n📤 Sinks ({})", config.sinks.len());
        for (i, sink) in config.sinks.iter().enumerate() {
            let prefix = if i == config.sinks.len() - 1 { "└─" } else { "├─" };
            println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);
        }
    }

    println!();
}
