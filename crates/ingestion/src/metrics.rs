//! Ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
///
/// Updated from sensor callback threads, read by the session loop.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Camera frames stored into a slot
    pub frames_received: AtomicU64,

    /// Frames replaced before the consumer looked at them
    pub frames_overwritten: AtomicU64,

    /// Lane invasion events latched
    pub lane_events: AtomicU64,

    /// Packets rejected (malformed frame, wrong camera, ...)
    pub invalid_packets: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self, overwritten: bool) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        if overwritten {
            self.frames_overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_lane_event(&self) {
        self.lane_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.invalid_packets.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_overwritten: self.frames_overwritten.load(Ordering::Relaxed),
            lane_events: self.lane_events.load(Ordering::Relaxed),
            invalid_packets: self.invalid_packets.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_overwritten: u64,
    pub lane_events: u64,
    pub invalid_packets: u64,
}
