//! `assets` command implementation.

use anyhow::{Context, Result};
use contracts::{AdasConfig, AudioConfig};
use dispatcher::{GeneratedAssets, TonePattern, generate_cue_assets};
use tracing::info;

use crate::cli::AssetsArgs;

/// Execute the `assets` command
pub fn run_assets(args: &AssetsArgs) -> Result<()> {
    let audio = audio_config(args)?;
    info!(assets_dir = %audio.assets_dir.display(), "Generating warning sounds");

    let generated = generate_cue_assets(&audio, args.force)
        .with_context(|| format!("Failed to write sounds into {}", audio.assets_dir.display()))?;
    print_generated(&audio, &generated);
    Ok(())
}

/// Audio section of the config file, or defaults when there is none yet
fn audio_config(args: &AssetsArgs) -> Result<AudioConfig> {
    let mut audio = if args.config.exists() {
        config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
            .audio
    } else {
        info!(config = %args.config.display(), "No config file, using default sound paths");
        AdasConfig::default().audio
    };

    if let Some(ref dir) = args.dir {
        audio.assets_dir = dir.clone();
    }
    Ok(audio)
}

fn describe(pattern: TonePattern) -> String {
    match pattern {
        TonePattern::Single {
            freq_hz,
            duration_ms,
        } => format!("{freq_hz}Hz tone, {duration_ms}ms"),
        TonePattern::DoubleBeep {
            freq_hz,
            beep_ms,
            gap_ms,
        } => format!("{freq_hz}Hz double beep, {beep_ms}ms + {gap_ms}ms gap"),
    }
}

fn print_generated(audio: &AudioConfig, generated: &GeneratedAssets) {
    println!("🔊 Warning sounds in {}", audio.assets_dir.display());
    for (cue, path) in &generated.written {
        println!(
            "  ✓ {:<10} {} ({})",
            cue.as_str(),
            path.display(),
            describe(TonePattern::for_cue(*cue))
        );
    }
    for (cue, path) in &generated.skipped {
        println!("  - {:<10} {} (exists, use --force)", cue.as_str(), path.display());
    }
    if !audio.enabled {
        println!("\n⚠ audio.enabled is false - cues stay muted until it is turned on");
    }
}
