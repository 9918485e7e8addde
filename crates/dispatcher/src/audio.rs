//! Audio cue output
//!
//! A cue is only playable when its asset file exists; missing files disable
//! that cue for the whole session.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{AudioConfig, AudioCue, AudioSink};
use tracing::{info, warn};

/// Cues whose asset files were found at startup
#[derive(Debug, Clone, Default)]
pub struct CueRegistry {
    cues: Vec<(AudioCue, PathBuf)>,
}

impl CueRegistry {
    /// Look up the configured asset files.
    pub fn discover(config: &AudioConfig) -> Self {
        if !config.enabled {
            info!("Audio alerts disabled by configuration");
            return Self::default();
        }

        let cues: Vec<(AudioCue, PathBuf)> = AudioCue::ALL
            .into_iter()
            .map(|cue| (cue, config.cue_path(cue)))
            .filter(|(_, path)| path.is_file())
            .collect();

        if cues.is_empty() {
            warn!(
                assets_dir = %config.assets_dir.display(),
                expected = ?AudioCue::ALL.map(|cue| config.cue_path(cue)),
                "Audio alerts disabled, no warning sound files found"
            );
        } else {
            info!(
                loaded = cues.len(),
                total = AudioCue::ALL.len(),
                "Audio alerts enabled"
            );
        }
        Self { cues }
    }

    /// Playable cues, in [`AudioCue::ALL`] order
    pub fn available(&self) -> Vec<AudioCue> {
        self.cues.iter().map(|(cue, _)| *cue).collect()
    }

    pub fn is_available(&self, cue: AudioCue) -> bool {
        self.path(cue).is_some()
    }

    pub fn path(&self, cue: AudioCue) -> Option<&PathBuf> {
        self.cues.iter().find(|(c, _)| *c == cue).map(|(_, p)| p)
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Audio sink that announces cues in the log
#[derive(Debug, Default)]
pub struct LoggingAudioSink {
    registry: CueRegistry,
    played: AtomicU64,
}

impl LoggingAudioSink {
    pub fn new(registry: CueRegistry) -> Self {
        Self {
            registry,
            played: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &CueRegistry {
        &self.registry
    }

    /// Cues actually played
    pub fn played(&self) -> u64 {
        self.played.load(Ordering::Relaxed)
    }
}

impl AudioSink for LoggingAudioSink {
    fn play(&self, cue: AudioCue) {
        let Some(path) = self.registry.path(cue) else {
            return;
        };
        self.played.fetch_add(1, Ordering::Relaxed);
        info!(cue = %cue, file = %path.display(), "Playing audio cue");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> AudioConfig {
        AudioConfig {
            assets_dir: dir.to_path_buf(),
            ..AudioConfig::default()
        }
    }

    #[test]
    fn test_only_existing_files_available() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        std::fs::write(config.cue_path(AudioCue::Lane), b"RIFF").unwrap();

        let registry = CueRegistry::discover(&config);
        assert_eq!(registry.available(), vec![AudioCue::Lane]);
        assert!(!registry.is_available(AudioCue::Blindspot));
    }

    #[test]
    fn test_disabled_has_no_cues() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        for cue in AudioCue::ALL {
            std::fs::write(config.cue_path(cue), b"RIFF").unwrap();
        }
        assert_eq!(CueRegistry::discover(&config).available().len(), 3);

        config.enabled = false;
        assert!(CueRegistry::discover(&config).is_empty());
    }

    #[test]
    fn test_sink_skips_unavailable_cues() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        std::fs::write(config.cue_path(AudioCue::Proximity), b"RIFF").unwrap();

        let sink = LoggingAudioSink::new(CueRegistry::discover(&config));
        sink.play(AudioCue::Proximity);
        sink.play(AudioCue::Blindspot);
        sink.play(AudioCue::Proximity);
        assert_eq!(sink.played(), 2);
    }
}
