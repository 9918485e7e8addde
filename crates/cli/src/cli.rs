//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ADAS Dashboard - blind-spot, proximity and lane alerts for a simulated ego vehicle
#[derive(Parser, Debug)]
#[command(
    name = "adas-dashboard",
    author,
    version,
    about = "ADAS alert dashboard for a simulated ego vehicle",
    long_about = "Spawns an ego vehicle with four cameras and a lane sensor in the simulator,\n\
                  fuses blind-spot detections, nearest-vehicle distance and lane crossings\n\
                  into debounced alerts, plays audio cues and logs every observation."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ADAS_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ADAS_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a dashboard session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Generate the warning sound files into the assets directory
    Assets(AssetsArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "ADAS_CONFIG")]
    pub config: PathBuf,

    /// Override simulator host from configuration
    #[arg(long, env = "ADAS_SIM_HOST")]
    pub host: Option<String>,

    /// Override simulator port from configuration
    #[arg(long, env = "ADAS_SIM_PORT")]
    pub port: Option<u16>,

    /// Stop after this many ticks (0 = loop.max_ticks, else until quit)
    #[arg(long, default_value = "0", env = "ADAS_MAX_TICKS")]
    pub max_ticks: u64,

    /// Override loop.target_fps
    #[arg(long, env = "TARGET_FPS")]
    pub target_fps: Option<u32>,

    /// Traffic RNG seed
    #[arg(long, env = "ADAS_SEED")]
    pub seed: Option<u64>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ADAS_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Constant throttle applied by the built-in driver (0..=1)
    #[arg(long, default_value = "0.5")]
    pub throttle: f32,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `assets` command
#[derive(Parser, Debug)]
pub struct AssetsArgs {
    /// Configuration file naming the sound paths (defaults apply if missing)
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Write into this directory instead of audio.assets_dir
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Overwrite existing sound files
    #[arg(short, long)]
    pub force: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "adas-dashboard",
            "-vv",
            "run",
            "-c",
            "demo.toml",
            "--max-ticks",
            "100",
            "--target-fps",
            "20",
            "--seed",
            "7",
            "--dry-run",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("demo.toml"));
        assert_eq!(args.max_ticks, 100);
        assert_eq!(args.target_fps, Some(20));
        assert_eq!(args.seed, Some(7));
        assert!(args.dry_run);
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["adas-dashboard", "-q", "-v", "info"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_json() {
        let cli = Cli::parse_from(["adas-dashboard", "validate", "--json"]);
        assert!(matches!(cli.command, Commands::Validate(ValidateArgs { json: true, .. })));
    }

    #[test]
    fn test_parse_assets() {
        let cli = Cli::parse_from(["adas-dashboard", "assets", "--dir", "sounds", "-f"]);
        let Commands::Assets(args) = cli.command else {
            panic!("expected assets");
        };
        assert_eq!(args.dir, Some(PathBuf::from("sounds")));
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(args.force);
    }
}
