//! 告警会话指标
//!
//! Prometheus 上报 + 内存聚合，会话结束时输出摘要。

use std::collections::BTreeMap;

use contracts::{AlertLevel, AlertSnapshot, AudioCue, Channel};
use metrics::{counter, histogram};

/// 记录单次主循环耗时
pub fn record_tick_duration_ms(ms: f64) {
    counter!("adas_ticks_total").increment(1);
    histogram!("adas_tick_duration_ms").record(ms);
}

/// 单个 tick 的统计输入
#[derive(Debug, Clone, Default)]
pub struct TickSample<'a> {
    /// 本 tick 推进的仿真时间 (秒)
    pub dt: f64,
    pub snapshot: AlertSnapshot,
    pub nearest_distance_m: Option<f64>,
    pub detections_run: usize,
    pub audio_cues: &'a [AudioCue],
    pub records: usize,
    /// 主循环实际耗时 (毫秒)
    pub tick_duration_ms: Option<f64>,
}

/// 单通道在 Near / Warn 的累计时长 (秒)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelDurations {
    pub near_secs: f64,
    pub warn_secs: f64,
}

impl ChannelDurations {
    fn add(&mut self, level: AlertLevel, dt: f64) {
        match level {
            AlertLevel::Near => self.near_secs += dt,
            AlertLevel::Warn => self.warn_secs += dt,
            AlertLevel::Clear => {}
        }
    }
}

/// 告警指标聚合器
#[derive(Debug, Clone, Default)]
pub struct AlertMetricsAggregator {
    pub total_ticks: u64,
    pub sim_seconds: f64,
    pub detector_invocations: u64,
    pub records: u64,
    pub audio_cues: BTreeMap<AudioCue, u64>,
    pub channels: [ChannelDurations; 4],
    pub overall: ChannelDurations,
    pub nearest_distance: RunningStats,
    pub tick_duration: RunningStats,
}

fn channel_slot(channel: Channel) -> usize {
    match channel {
        Channel::LeftBlindSpot => 0,
        Channel::RightBlindSpot => 1,
        Channel::Proximity => 2,
        Channel::Lane => 3,
    }
}

impl AlertMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sample: &TickSample<'_>) {
        self.total_ticks += 1;
        self.sim_seconds += sample.dt;
        self.detector_invocations += sample.detections_run as u64;
        self.records += sample.records as u64;

        for cue in sample.audio_cues {
            *self.audio_cues.entry(*cue).or_insert(0) += 1;
        }

        let snapshot = &sample.snapshot;
        for (channel, level) in [
            (Channel::LeftBlindSpot, snapshot.left),
            (Channel::RightBlindSpot, snapshot.right),
            (Channel::Proximity, snapshot.proximity),
            (Channel::Lane, snapshot.lane),
        ] {
            self.channels[channel_slot(channel)].add(level, sample.dt);
        }
        self.overall.add(snapshot.overall, sample.dt);

        if let Some(distance) = sample.nearest_distance_m {
            self.nearest_distance.push(distance);
        }
        if let Some(ms) = sample.tick_duration_ms {
            self.tick_duration.push(ms);
        }
    }

    pub fn channel(&self, channel: Channel) -> ChannelDurations {
        self.channels[channel_slot(channel)]
    }

    pub fn total_audio_cues(&self) -> u64 {
        self.audio_cues.values().sum()
    }

    pub fn summary(&self) -> AlertSummary {
        AlertSummary {
            total_ticks: self.total_ticks,
            sim_seconds: self.sim_seconds,
            detector_invocations: self.detector_invocations,
            records: self.records,
            audio_cues: self.audio_cues.clone(),
            channels: Channel::ALL.map(|c| (c, self.channel(c))).to_vec(),
            overall: self.overall,
            nearest_distance_m: StatsSummary::from(&self.nearest_distance),
            tick_duration_ms: StatsSummary::from(&self.tick_duration),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct AlertSummary {
    pub total_ticks: u64,
    pub sim_seconds: f64,
    pub detector_invocations: u64,
    pub records: u64,
    pub audio_cues: BTreeMap<AudioCue, u64>,
    pub channels: Vec<(Channel, ChannelDurations)>,
    pub overall: ChannelDurations,
    pub nearest_distance_m: StatsSummary,
    pub tick_duration_ms: StatsSummary,
}

impl std::fmt::Display for AlertSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Alert Summary ===")?;
        writeln!(
            f,
            "Ticks: {} ({:.1}s simulated)",
            self.total_ticks, self.sim_seconds
        )?;
        writeln!(f, "Detector invocations: {}", self.detector_invocations)?;
        writeln!(f, "Log rows: {}", self.records)?;
        for (channel, durations) in &self.channels {
            writeln!(
                f,
                "{channel}: near {:.1}s, warn {:.1}s",
                durations.near_secs, durations.warn_secs
            )?;
        }
        writeln!(
            f,
            "overall: near {:.1}s, warn {:.1}s",
            self.overall.near_secs, self.overall.warn_secs
        )?;
        if !self.audio_cues.is_empty() {
            writeln!(f, "Audio cues:")?;
            for (cue, count) in &self.audio_cues {
                writeln!(f, "  {cue}: {count}")?;
            }
        }
        writeln!(f, "Nearest distance (m): {}", self.nearest_distance_m)?;
        writeln!(f, "Tick duration (ms): {}", self.tick_duration_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计 (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = AlertMetricsAggregator::new();
        let cues = [AudioCue::Blindspot, AudioCue::Lane];

        aggregator.update(&TickSample {
            dt: 0.05,
            snapshot: AlertSnapshot {
                left: AlertLevel::Warn,
                proximity: AlertLevel::Near,
                overall: AlertLevel::Warn,
                ..Default::default()
            },
            nearest_distance_m: Some(12.0),
            detections_run: 2,
            audio_cues: &cues,
            records: 3,
            tick_duration_ms: Some(4.0),
        });
        aggregator.update(&TickSample {
            dt: 0.05,
            nearest_distance_m: Some(20.0),
            ..Default::default()
        });

        assert_eq!(aggregator.total_ticks, 2);
        assert_eq!(aggregator.detector_invocations, 2);
        assert_eq!(aggregator.records, 3);
        assert_eq!(aggregator.total_audio_cues(), 2);
        assert!((aggregator.channel(Channel::LeftBlindSpot).warn_secs - 0.05).abs() < 1e-12);
        assert!((aggregator.channel(Channel::Proximity).near_secs - 0.05).abs() < 1e-12);
        assert_eq!(aggregator.channel(Channel::Lane), ChannelDurations::default());
        assert!((aggregator.nearest_distance.mean() - 16.0).abs() < 1e-10);
        assert_eq!(aggregator.tick_duration.count(), 1);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = AlertMetricsAggregator::new();
        aggregator.update(&TickSample {
            dt: 1.0,
            snapshot: AlertSnapshot {
                right: AlertLevel::Near,
                overall: AlertLevel::Near,
                ..Default::default()
            },
            audio_cues: &[AudioCue::Proximity],
            ..Default::default()
        });

        let output = aggregator.summary().to_string();
        assert!(output.contains("Ticks: 1"));
        assert!(output.contains("right_blind_spot: near 1.0s, warn 0.0s"));
        assert!(output.contains("proximity: 1"));
        assert!(output.contains("Nearest distance (m): N/A"));
    }

    #[test]
    fn test_reset() {
        let mut aggregator = AlertMetricsAggregator::new();
        aggregator.update(&TickSample::default());
        aggregator.reset();
        assert_eq!(aggregator.total_ticks, 0);
    }
}
