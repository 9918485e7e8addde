//! `run` command implementation.

use std::sync::Arc;

use actor_factory::{GroundTruthClassifier, MockConfig, MockSimulator};
use anyhow::{Context, Result};
use contracts::AdasConfig;
use dispatcher::{CueRegistry, LoggingAudioSink};
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::session::{Collaborators, CruiseControl, LogRenderer, Session, SessionConfig};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let simulator = MockSimulator::with_config(MockConfig {
        seed: config.simulator.seed,
        ..Default::default()
    });
    info!("Running against the built-in simulated world");

    let registry = CueRegistry::discover(&config.audio);
    if config.audio.enabled && registry.is_empty() {
        info!("Run `adas-dashboard assets` to generate the warning sounds");
    }
    let collaborators = Collaborators {
        classifier: Arc::new(GroundTruthClassifier::new(
            simulator.world(),
            config.cameras.fov,
        )),
        available_cues: registry.available(),
        audio: Box::new(LoggingAudioSink::new(registry)),
        renderer: Box::new(LogRenderer::new(u64::from(config.main_loop.target_fps))),
        control: Box::new(CruiseControl::new(args.throttle)),
    };

    let max_ticks = (args.max_ticks != 0)
        .then_some(args.max_ticks)
        .or(config.main_loop.max_ticks);
    let session_config = SessionConfig {
        config,
        max_ticks,
        record_queue: 1024,
    };

    info!("Starting session...");
    let stats = Session::new(session_config, simulator)
        .run(collaborators)
        .await
        .context("Session failed")?;

    stats.print_summary();
    info!("ADAS Dashboard finished");
    Ok(())
}

/// Load the file, apply CLI overrides, re-validate.
fn load_config(args: &RunArgs) -> Result<AdasConfig> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding simulator host from CLI");
        config.simulator.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding simulator port from CLI");
        config.simulator.port = port;
    }
    if let Some(fps) = args.target_fps {
        info!(target_fps = fps, "Overriding target FPS from CLI");
        config.main_loop.target_fps = fps;
    }
    if let Some(seed) = args.seed {
        config.simulator.seed = Some(seed);
    }

    config_loader::ConfigLoader::validate(&config).context("Invalid configuration after CLI overrides")?;

    info!(
        host = %config.simulator.host,
        port = config.simulator.port,
        target_fps = config.main_loop.target_fps,
        skip_frames = config.detection.skip_frames,
        sinks = config.sinks.len(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &AdasConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!(
        "Simulator: {}:{} (dt {}s, {} traffic vehicles)",
        config.simulator.host,
        config.simulator.port,
        config.simulator.fixed_delta_seconds,
        config.simulator.traffic_vehicles
    );
    println!("Ego: {}", config.ego.blueprint);
    println!(
        "Detection: every {} ticks, keywords {:?}",
        config.detection.skip_frames, config.detection.vehicle_keywords
    );
    println!(
        "Loop: {} FPS, warning clear time {}s",
        config.main_loop.target_fps, config.alerts.warning_clear_time
    );

    if !config.sinks.is_empty() {
        println!("\nSinks ({}):", config.sinks.len());
        for sink in &config.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(config: PathBuf) -> RunArgs {
        RunArgs {
            config,
            host: None,
            port: None,
            max_ticks: 0,
            target_fps: None,
            seed: None,
            metrics_port: 0,
            dry_run: true,
            throttle: 0.5,
        }
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_config(&args(PathBuf::from("/nonexistent/adas.toml"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_overrides_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adas.toml");
        std::fs::write(&path, "[loop]\ntarget_fps = 20\n").unwrap();

        let mut run_args = args(path);
        run_args.port = Some(2100);
        run_args.seed = Some(3);
        let config = load_config(&run_args).unwrap();
        assert_eq!(config.simulator.port, 2100);
        assert_eq!(config.simulator.seed, Some(3));
        assert_eq!(config.main_loop.target_fps, 20);

        run_args.target_fps = Some(0);
        assert!(load_config(&run_args).is_err());
    }

    #[tokio::test]
    async fn test_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adas.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(run_session(&args(path)).await.is_ok());
    }
}
