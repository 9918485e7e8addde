//! Channel debouncer
//!
//! Turns raw per-observation levels into time-decayed stabilized levels,
//! with one audio cue per rising edge into Warn.

use contracts::{AlertLevel, AlertSnapshot, AudioCue, Channel};
use tracing::{debug, info};

use crate::aggregator::aggregate;

/// Persisted state of one channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelState {
    pub level: AlertLevel,
    /// Time of the most recent non-clear observation, unset until the first one
    pub last_signal_time: Option<f64>,
}

/// Result of applying observations to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelUpdate {
    pub channel: Channel,
    pub level: AlertLevel,
    /// Cue to play for a Clear -> Warn edge
    pub cue: Option<AudioCue>,
}

/// Owns the four channel states
#[derive(Debug, Clone)]
pub struct ChannelDebouncer {
    states: [ChannelState; 4],
    warning_clear_time: f64,
    enabled_cues: Vec<AudioCue>,
}

fn slot(channel: Channel) -> usize {
    match channel {
        Channel::LeftBlindSpot => 0,
        Channel::RightBlindSpot => 1,
        Channel::Proximity => 2,
        Channel::Lane => 3,
    }
}

impl ChannelDebouncer {
    pub fn new(warning_clear_time: f64, enabled_cues: Vec<AudioCue>) -> Self {
        Self {
            states: [ChannelState::default(); 4],
            warning_clear_time,
            enabled_cues,
        }
    }

    pub fn state(&self, channel: Channel) -> ChannelState {
        self.states[slot(channel)]
    }

    /// Apply one raw observation at `now`.
    pub fn update(&mut self, channel: Channel, raw: AlertLevel, now: f64) -> ChannelUpdate {
        self.update_batch(channel, &[raw], now)
    }

    /// Apply a tick's observations in order.
    ///
    /// The last observation decides the level; any Warn in the batch is
    /// edge-checked against the level held before the batch.
    pub fn update_batch(&mut self, channel: Channel, raws: &[AlertLevel], now: f64) -> ChannelUpdate {
        let warning_clear_time = self.warning_clear_time;
        let state = &mut self.states[slot(channel)];
        let previous = state.level;
        let mut saw_warn = false;

        for &raw in raws {
            // Lane only knows inactive/active
            let raw = if channel == Channel::Lane && raw == AlertLevel::Near {
                AlertLevel::Warn
            } else {
                raw
            };

            if raw.is_clear() {
                let expired = state
                    .last_signal_time
                    .map_or(true, |last| now - last > warning_clear_time);
                if expired {
                    state.level = AlertLevel::Clear;
                }
            } else {
                state.level = raw;
                state.last_signal_time = Some(now);
                saw_warn |= raw == AlertLevel::Warn;
            }
        }

        let level = state.level;
        let cue = (saw_warn && previous.is_clear())
            .then(|| channel.cue())
            .filter(|cue| self.enabled_cues.contains(cue));

        if level != previous {
            ::metrics::counter!(
                "adas_alert_transitions_total",
                "channel" => channel.as_str(),
                "to" => level.as_str()
            )
            .increment(1);

            if previous.is_clear() {
                info!(channel = %channel, level = %level, now, "channel raised");
            } else if level.is_clear() {
                info!(channel = %channel, now, "channel cleared");
            } else {
                debug!(channel = %channel, from = %previous, to = %level, now, "channel level changed");
            }
        }

        ChannelUpdate {
            channel,
            level,
            cue,
        }
    }

    /// Stabilized levels plus the fused severity
    pub fn snapshot(&self) -> AlertSnapshot {
        let left = self.state(Channel::LeftBlindSpot).level;
        let right = self.state(Channel::RightBlindSpot).level;
        let proximity = self.state(Channel::Proximity).level;
        let lane = self.state(Channel::Lane).level;
        AlertSnapshot {
            left,
            right,
            proximity,
            lane,
            overall: aggregate(left, right, proximity, lane),
        }
    }
}
