//! Frame scheduler
//!
//! Rate-limits blind-spot inference to every Nth tick.

use std::sync::Arc;

use contracts::{CameraPosition, FrameStore, ImageFrame, Side};

/// Camera feeding each blind-spot side
pub fn camera_for(side: Side) -> CameraPosition {
    match side {
        Side::Left => CameraPosition::Left,
        Side::Right => CameraPosition::Right,
    }
}

#[derive(Debug, Clone)]
pub struct FrameScheduler {
    skip_frames: u32,
    tick: u64,
}

impl FrameScheduler {
    /// `skip_frames` below 1 is treated as 1
    pub fn new(skip_frames: u32) -> Self {
        Self {
            skip_frames: skip_frames.max(1),
            tick: 0,
        }
    }

    /// Index of the next tick to be planned
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Frames to run detection on this tick, then advance the counter.
    ///
    /// Ticks 0, N, 2N, ... are detection ticks; sides without a frame are skipped.
    pub fn plan(&mut self, frames: &dyn FrameStore) -> Vec<(Side, Arc<ImageFrame>)> {
        let due = self.tick % u64::from(self.skip_frames) == 0;
        self.tick += 1;
        if !due {
            return Vec::new();
        }

        [Side::Left, Side::Right]
            .into_iter()
            .filter_map(|side| frames.latest(camera_for(side)).map(|frame| (side, frame)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::PixelFormat;
    use std::collections::HashMap;

    #[derive(Default)]
    struct StaticFrames(HashMap<CameraPosition, Arc<ImageFrame>>);

    impl StaticFrames {
        fn with(cameras: &[CameraPosition]) -> Self {
            Self(
                cameras
                    .iter()
                    .map(|&camera| {
                        (
                            camera,
                            Arc::new(ImageFrame {
                                camera,
                                width: 1,
                                height: 1,
                                format: PixelFormat::Rgb8,
                                timestamp: 0.0,
                                frame_id: None,
                                data: Bytes::from_static(&[0, 0, 0]),
                            }),
                        )
                    })
                    .collect(),
            )
        }
    }

    impl FrameStore for StaticFrames {
        fn latest(&self, camera: CameraPosition) -> Option<Arc<ImageFrame>> {
            self.0.get(&camera).cloned()
        }
    }

    #[test]
    fn test_throttling() {
        let frames = StaticFrames::with(&[CameraPosition::Left]);
        let mut scheduler = FrameScheduler::new(3);

        let invocations: usize = (0..9).map(|_| scheduler.plan(&frames).len()).sum();
        assert_eq!(invocations, 3);
        assert_eq!(scheduler.tick(), 9);
    }

    #[test]
    fn test_detection_ticks() {
        let frames = StaticFrames::with(&[CameraPosition::Left, CameraPosition::Right]);
        let mut scheduler = FrameScheduler::new(3);

        let due: Vec<bool> = (0..7).map(|_| !scheduler.plan(&frames).is_empty()).collect();
        assert_eq!(due, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn test_missing_frames_skipped() {
        let frames = StaticFrames::with(&[CameraPosition::Right, CameraPosition::Front]);
        let mut scheduler = FrameScheduler::new(1);

        let planned = scheduler.plan(&frames);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].0, Side::Right);
        assert!(scheduler.plan(&StaticFrames::default()).is_empty());
    }

    #[test]
    fn test_zero_skip_runs_every_tick() {
        let frames = StaticFrames::with(&[CameraPosition::Left]);
        let mut scheduler = FrameScheduler::new(0);
        assert!((0..4).all(|_| scheduler.plan(&frames).len() == 1));
    }
}
