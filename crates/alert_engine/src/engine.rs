//! Per-tick alert engine.
//!
//! Order within a tick: proximity scan → detection (if scheduled) →
//! debounce → aggregation.

use std::sync::Arc;

use contracts::{
    AgentState, AlertEngineConfig, AlertLevel, AlertSnapshot, AudioCue, Channel, Classifier,
    FrameStore, LaneEvent, ObservationRecord, Side,
};
use tracing::{debug, instrument};

use crate::aggregator::collect_cues;
use crate::debouncer::{ChannelDebouncer, ChannelUpdate};
use crate::detection::DetectionAdapter;
use crate::proximity::{self, ProximityObservation};
use crate::scheduler::FrameScheduler;

/// Everything the engine needs from one simulation tick
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    /// Simulation time (seconds), the debounce clock
    pub now: f64,
    pub ego: &'a AgentState,
    /// Live agents, may include the ego
    pub agents: &'a [AgentState],
    /// Lane crossings received since the previous tick
    pub lane_events: &'a [LaneEvent],
}

/// Engine output for one tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub tick: u64,
    pub snapshot: AlertSnapshot,
    /// Cues to play, each at most once
    pub audio_cues: Vec<AudioCue>,
    /// Log rows, in production order
    pub records: Vec<ObservationRecord>,
    pub proximity: ProximityObservation,
    /// Classifier invocations this tick
    pub detections_run: usize,
}

/// Alert-state aggregation engine
pub struct AlertEngine {
    adapter: DetectionAdapter,
    scheduler: FrameScheduler,
    debouncer: ChannelDebouncer,
}

impl AlertEngine {
    pub fn new(config: AlertEngineConfig, classifier: Arc<dyn Classifier>) -> Self {
        debug!(
            classifier = classifier.name(),
            skip_frames = config.skip_frames,
            warning_clear_time = config.warning_clear_time,
            cues = ?config.enabled_cues,
            "alert engine created"
        );
        Self {
            adapter: DetectionAdapter::new(classifier, &config),
            scheduler: FrameScheduler::new(config.skip_frames),
            debouncer: ChannelDebouncer::new(config.warning_clear_time, config.enabled_cues),
        }
    }

    /// Current stabilized levels
    pub fn snapshot(&self) -> AlertSnapshot {
        self.debouncer.snapshot()
    }

    /// Advance the engine by one tick.
    #[instrument(
        level = "trace",
        name = "alert_engine_tick",
        skip(self, input, frames),
        fields(tick = self.scheduler.tick(), now = input.now)
    )]
    pub fn tick(&mut self, input: TickInput<'_>, frames: &dyn FrameStore) -> TickOutcome {
        let tick = self.scheduler.tick();
        let now = input.now;
        let mut records = Vec::new();

        // 1. proximity
        let proximity = proximity::scan(input.agents, input.ego);
        if let Some(nearest) = proximity.nearest {
            records.push(ObservationRecord::proximity(
                now,
                nearest.distance_m,
                nearest.rel_speed_mps,
            ));
            ::metrics::histogram!("adas_nearest_distance_m").record(nearest.distance_m);
        }

        // 2. detection
        let planned = self.scheduler.plan(frames);
        let detections_run = planned.len();
        let mut side_levels: [Option<AlertLevel>; 2] = [None, None];
        for (side, frame) in planned {
            let result = self.adapter.detect(&frame, side);
            ::metrics::counter!("adas_detector_invocations_total", "side" => side.as_str())
                .increment(1);
            for zoned in &result.detections {
                records.push(ObservationRecord::detection(
                    now,
                    zoned.detection.label.clone(),
                    zoned.detection.confidence,
                    side,
                    zoned.level,
                ));
            }
            side_levels[side_index(side)] = Some(result.level);
        }

        // 3. debounce; skipped sides only age
        let lane_raws = vec![AlertLevel::Warn; input.lane_events.len()];
        let updates: [ChannelUpdate; 4] = [
            self.debouncer.update(Channel::Proximity, proximity.level, now),
            self.debouncer.update(
                Channel::LeftBlindSpot,
                side_levels[side_index(Side::Left)].unwrap_or(AlertLevel::Clear),
                now,
            ),
            self.debouncer.update(
                Channel::RightBlindSpot,
                side_levels[side_index(Side::Right)].unwrap_or(AlertLevel::Clear),
                now,
            ),
            if lane_raws.is_empty() {
                self.debouncer.update(Channel::Lane, AlertLevel::Clear, now)
            } else {
                records.push(ObservationRecord::lane(now));
                self.debouncer.update_batch(Channel::Lane, &lane_raws, now)
            },
        ];

        // 4. aggregate
        let snapshot = self.debouncer.snapshot();
        let audio_cues = collect_cues(&updates);
        for cue in &audio_cues {
            ::metrics::counter!("adas_audio_cues_total", "cue" => cue.as_str()).increment(1);
        }
        ::metrics::gauge!("adas_alert_level", "channel" => "overall")
            .set(level_value(snapshot.overall));
        for update in &updates {
            ::metrics::gauge!("adas_alert_level", "channel" => update.channel.as_str())
                .set(level_value(update.level));
        }

        TickOutcome {
            tick,
            snapshot,
            audio_cues,
            records,
            proximity,
            detections_run,
        }
    }
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

fn level_value(level: AlertLevel) -> f64 {
    match level {
        AlertLevel::Clear => 0.0,
        AlertLevel::Near => 1.0,
        AlertLevel::Warn => 2.0,
    }
}
