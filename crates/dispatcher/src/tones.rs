//! Warning tone synthesis
//!
//! Each cue gets its own sine pattern so the driver can tell them apart by
//! ear: blind spot is a short high beep, proximity a double beep, lane a
//! longer low tone. Files are 16-bit mono PCM.

use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};

use contracts::{AudioConfig, AudioCue};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info, instrument};

use crate::error::DispatcherError;

pub const SAMPLE_RATE: u32 = 44_100;

const AMPLITUDE: f64 = 32_767.0;

/// Sine pattern written for one cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TonePattern {
    /// One continuous tone
    Single { freq_hz: u32, duration_ms: u32 },
    /// beep, silence, beep
    DoubleBeep {
        freq_hz: u32,
        beep_ms: u32,
        gap_ms: u32,
    },
}

impl TonePattern {
    pub fn for_cue(cue: AudioCue) -> Self {
        match cue {
            AudioCue::Blindspot => Self::Single {
                freq_hz: 1200,
                duration_ms: 200,
            },
            AudioCue::Proximity => Self::DoubleBeep {
                freq_hz: 800,
                beep_ms: 150,
                gap_ms: 80,
            },
            AudioCue::Lane => Self::Single {
                freq_hz: 600,
                duration_ms: 350,
            },
        }
    }

    /// Total length in samples at [`SAMPLE_RATE`]
    pub fn sample_count(&self) -> u32 {
        match *self {
            Self::Single { duration_ms, .. } => samples_for(duration_ms),
            Self::DoubleBeep {
                beep_ms, gap_ms, ..
            } => 2 * samples_for(beep_ms) + samples_for(gap_ms),
        }
    }

    fn samples(&self) -> Vec<i16> {
        match *self {
            Self::Single {
                freq_hz,
                duration_ms,
            } => sine(freq_hz, samples_for(duration_ms)).collect(),
            Self::DoubleBeep {
                freq_hz,
                beep_ms,
                gap_ms,
            } => {
                let beep = samples_for(beep_ms);
                sine(freq_hz, beep)
                    .chain(std::iter::repeat(0).take(samples_for(gap_ms) as usize))
                    .chain(sine(freq_hz, beep))
                    .collect()
            }
        }
    }
}

fn samples_for(ms: u32) -> u32 {
    SAMPLE_RATE * ms / 1000
}

fn sine(freq_hz: u32, count: u32) -> impl Iterator<Item = i16> {
    let step = TAU * f64::from(freq_hz) / f64::from(SAMPLE_RATE);
    (0..count).map(move |i| (AMPLITUDE * (step * f64::from(i)).sin()) as i16)
}

/// Write `pattern` to `path` as a WAV file.
pub fn write_tone(path: &Path, pattern: TonePattern) -> Result<(), DispatcherError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer =
        WavWriter::create(path, spec).map_err(|e| DispatcherError::tone_write(path, e))?;
    for sample in pattern.samples() {
        writer
            .write_sample(sample)
            .map_err(|e| DispatcherError::tone_write(path, e))?;
    }
    writer
        .finalize()
        .map_err(|e| DispatcherError::tone_write(path, e))
}

/// Outcome of [`generate_cue_assets`]
#[derive(Debug, Default)]
pub struct GeneratedAssets {
    pub written: Vec<(AudioCue, PathBuf)>,
    pub skipped: Vec<(AudioCue, PathBuf)>,
}

/// Write every cue file named by `config` into its assets directory.
///
/// Existing files are left alone unless `overwrite` is set.
#[instrument(
    name = "generate_cue_assets",
    skip(config),
    fields(assets_dir = %config.assets_dir.display())
)]
pub fn generate_cue_assets(
    config: &AudioConfig,
    overwrite: bool,
) -> Result<GeneratedAssets, DispatcherError> {
    fs::create_dir_all(&config.assets_dir)
        .map_err(|e| DispatcherError::assets_dir(&config.assets_dir, e))?;

    let mut generated = GeneratedAssets::default();
    for cue in AudioCue::ALL {
        let path = config.cue_path(cue);
        if path.is_file() && !overwrite {
            debug!(cue = %cue, path = %path.display(), "Cue file exists, skipping");
            generated.skipped.push((cue, path));
            continue;
        }

        let pattern = TonePattern::for_cue(cue);
        write_tone(&path, pattern)?;
        debug!(cue = %cue, path = %path.display(), ?pattern, "Wrote cue file");
        generated.written.push((cue, path));
    }

    info!(
        written = generated.written.len(),
        skipped = generated.skipped.len(),
        "Warning sounds ready"
    );
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CueRegistry;
    use hound::WavReader;

    fn config(dir: &Path) -> AudioConfig {
        AudioConfig {
            assets_dir: dir.to_path_buf(),
            ..AudioConfig::default()
        }
    }

    #[test]
    fn test_generated_assets_enable_every_cue() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir.path().join("assets"));
        assert!(CueRegistry::discover(&config).is_empty());

        let generated = generate_cue_assets(&config, false).unwrap();
        assert_eq!(generated.written.len(), 3);

        let registry = CueRegistry::discover(&config);
        assert_eq!(registry.available(), AudioCue::ALL.to_vec());
    }

    #[test]
    fn test_patterns_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        generate_cue_assets(&config, false).unwrap();

        let lengths: Vec<u32> = AudioCue::ALL
            .into_iter()
            .map(|cue| {
                let reader = WavReader::open(config.cue_path(cue)).unwrap();
                let spec = reader.spec();
                assert_eq!(spec.channels, 1);
                assert_eq!(spec.sample_rate, SAMPLE_RATE);
                assert_eq!(spec.bits_per_sample, 16);
                assert_eq!(reader.duration(), TonePattern::for_cue(cue).sample_count());
                reader.duration()
            })
            .collect();

        assert_eq!(lengths, vec![8_820, 16_758, 15_435]);
    }

    #[test]
    fn test_double_beep_has_silent_gap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beep.wav");
        write_tone(&path, TonePattern::for_cue(AudioCue::Proximity)).unwrap();

        let samples: Vec<i16> = WavReader::open(&path)
            .unwrap()
            .samples::<i16>()
            .map(Result::unwrap)
            .collect();
        let gap = &samples[6_615..6_615 + 3_528];
        assert!(gap.iter().all(|s| *s == 0));
        assert!(samples[..6_615].iter().any(|s| s.unsigned_abs() > 30_000));
    }

    #[test]
    fn test_existing_files_kept_unless_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let lane = config.cue_path(AudioCue::Lane);
        fs::write(&lane, b"custom").unwrap();

        let generated = generate_cue_assets(&config, false).unwrap();
        assert_eq!(generated.skipped, vec![(AudioCue::Lane, lane.clone())]);
        assert_eq!(fs::read(&lane).unwrap(), b"custom");

        let generated = generate_cue_assets(&config, true).unwrap();
        assert_eq!(generated.written.len(), 3);
        assert!(WavReader::open(&lane).is_ok());
    }
}
