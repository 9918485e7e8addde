//! Alert aggregation
//!
//! Stateless fusion of the four stabilized channel levels.

use contracts::{AlertLevel, AudioCue};

use crate::debouncer::ChannelUpdate;

/// Overall dashboard severity.
///
/// Warn if any blind-spot/proximity channel is Warn or the lane is active,
/// else Near if any of them is Near, else Clear.
pub fn aggregate(
    left: AlertLevel,
    right: AlertLevel,
    proximity: AlertLevel,
    lane: AlertLevel,
) -> AlertLevel {
    let hazards = [left, right, proximity];
    if !lane.is_clear() || hazards.contains(&AlertLevel::Warn) {
        AlertLevel::Warn
    } else if hazards.contains(&AlertLevel::Near) {
        AlertLevel::Near
    } else {
        AlertLevel::Clear
    }
}

/// One-shot cues of this tick, at most once per cue.
pub fn collect_cues<'a>(updates: impl IntoIterator<Item = &'a ChannelUpdate>) -> Vec<AudioCue> {
    let mut cues: Vec<AudioCue> = updates.into_iter().filter_map(|u| u.cue).collect();
    cues.sort();
    cues.dedup();
    cues
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Channel;
    use AlertLevel::{Clear, Near, Warn};

    #[test]
    fn test_aggregate_cases() {
        assert_eq!(aggregate(Near, Clear, Warn, Clear), Warn);
        assert_eq!(aggregate(Clear, Near, Clear, Clear), Near);
        assert_eq!(aggregate(Clear, Clear, Clear, Clear), Clear);
    }

    #[test]
    fn test_lane_alone_is_warn() {
        assert_eq!(aggregate(Clear, Clear, Clear, Warn), Warn);
        assert_eq!(aggregate(Near, Near, Near, Warn), Warn);
    }

    #[test]
    fn test_blindspot_cue_deduplicated() {
        let updates = [
            ChannelUpdate {
                channel: Channel::LeftBlindSpot,
                level: Warn,
                cue: Some(AudioCue::Blindspot),
            },
            ChannelUpdate {
                channel: Channel::RightBlindSpot,
                level: Warn,
                cue: Some(AudioCue::Blindspot),
            },
            ChannelUpdate {
                channel: Channel::Lane,
                level: Warn,
                cue: Some(AudioCue::Lane),
            },
            ChannelUpdate {
                channel: Channel::Proximity,
                level: Near,
                cue: None,
            },
        ];
        assert_eq!(
            collect_cues(&updates),
            vec![AudioCue::Blindspot, AudioCue::Lane]
        );
    }
}
