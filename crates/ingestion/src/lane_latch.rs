//! Lane event latch
//!
//! Callback threads push boundary-crossing events, the main loop drains them
//! once per tick.

use std::sync::{Mutex, PoisonError};

use contracts::LaneEvent;

#[derive(Debug, Default)]
pub struct LaneEventLatch {
    pending: Mutex<Vec<LaneEvent>>,
}

impl LaneEventLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: LaneEvent) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Take every event received since the last drain, in arrival order.
    pub fn drain(&self) -> Vec<LaneEvent> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(frame_id: u64) -> LaneEvent {
        LaneEvent {
            timestamp: frame_id as f64 * 0.05,
            frame_id,
            crossed_markings: vec!["Broken".to_string()],
        }
    }

    #[test]
    fn test_drain_empties_latch() {
        let latch = LaneEventLatch::new();
        latch.push(event(1));
        latch.push(event(2));
        assert_eq!(latch.pending(), 2);

        let drained = latch.drain();
        assert_eq!(
            drained.iter().map(|e| e.frame_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(latch.drain().is_empty());
    }
}
