//! Session statistics.

use std::time::Duration;

use actor_factory::TeardownReport;
use contracts::Channel;
use ingestion::MetricsSnapshot;
use observability::{AlertMetricsAggregator, TickSample};

/// Statistics from one dashboard session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Wall-clock duration of the main loop
    pub duration: Duration,

    /// Why the loop ended
    pub exit: String,

    /// Per-channel alert time, cues and distance statistics
    pub alerts: AlertMetricsAggregator,

    /// Frame and lane-event counters from ingestion
    pub ingestion: MetricsSnapshot,

    /// Sensors that delivered through a subscription
    pub active_sensors: usize,

    /// Rows dropped at the dispatcher input
    pub records_dropped: u64,

    pub teardown: TeardownReport,
}

impl SessionStats {
    pub fn record_tick(&mut self, sample: &TickSample<'_>) {
        self.alerts.update(sample);
    }

    pub fn ticks(&self) -> u64 {
        self.alerts.total_ticks
    }

    /// Effective loop rate
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        let summary = self.alerts.summary();

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Session Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Exit: {}", self.exit);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", summary.total_ticks);
        println!("   ├─ Simulated: {:.2}s", summary.sim_seconds);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   └─ Active sensors: {}", self.active_sensors);

        println!("\n🚨 Alerts");
        println!("   ├─ Detector invocations: {}", summary.detector_invocations);
        println!("   ├─ Audio cues: {}", self.alerts.total_audio_cues());
        for (cue, count) in &summary.audio_cues {
            println!("   │   └─ {cue}: {count}");
        }
        for channel in Channel::ALL {
            let time = self.alerts.channel(channel);
            println!(
                "   ├─ {channel}: near {:.1}s, warn {:.1}s",
                time.near_secs, time.warn_secs
            );
        }
        println!("   └─ Nearest distance (m): {}", summary.nearest_distance_m);

        println!("\n📥 Ingestion");
        println!("   ├─ Frames received: {}", self.ingestion.frames_received);
        println!("   ├─ Frames overwritten: {}", self.ingestion.frames_overwritten);
        println!("   ├─ Lane events: {}", self.ingestion.lane_events);
        println!("   └─ Invalid packets: {}", self.ingestion.invalid_packets);

        println!("\n📤 Log");
        println!("   ├─ Rows: {}", summary.records);
        println!("   └─ Rows dropped: {}", self.records_dropped);

        if !self.teardown.is_clean() {
            println!("\n⚠️  Teardown");
            println!("   ├─ Destroyed: {}", self.teardown.destroyed);
            println!("   └─ Failed: {:?}", self.teardown.failed);
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps() {
        let mut stats = SessionStats::default();
        assert_eq!(stats.fps(), 0.0);

        for _ in 0..30 {
            stats.record_tick(&TickSample {
                dt: 0.05,
                ..Default::default()
            });
        }
        stats.duration = Duration::from_secs(2);
        assert_eq!(stats.ticks(), 30);
        assert!((stats.fps() - 15.0).abs() < 1e-9);
    }
}
