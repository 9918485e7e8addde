//! 单槽最新帧缓冲
//!
//! 每路摄像头一个槽位：回调线程覆盖写入，主循环只读取最新一帧，不排队。
//! 锁只在交换/克隆 `Arc` 的瞬间持有，从不跨槽位加锁。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{CameraPosition, FrameStore, ImageFrame};

/// Single-slot latest-value buffer
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Option<Arc<ImageFrame>>>,
    /// Set on publish, cleared on read
    unread: AtomicBool,
    received: AtomicU64,
    overwritten: AtomicU64,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame.
    ///
    /// Returns `true` if the previous frame was never read.
    pub fn publish(&self, frame: Arc<ImageFrame>) -> bool {
        let previous = self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(frame);

        self.received.fetch_add(1, Ordering::Relaxed);
        let was_unread = self.unread.swap(true, Ordering::AcqRel);
        let overwritten = previous.is_some() && was_unread;
        if overwritten {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        overwritten
    }

    /// Newest frame, if any. The frame stays in the slot.
    pub fn latest(&self) -> Option<Arc<ImageFrame>> {
        let frame = self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if frame.is_some() {
            self.unread.store(false, Ordering::Release);
        }
        frame
    }

    pub fn has_frame(&self) -> bool {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn overwritten(&self) -> u64 {
        self.overwritten.load(Ordering::Relaxed)
    }

    /// Drop the stored frame (teardown)
    pub fn clear(&self) {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.unread.store(false, Ordering::Release);
    }
}

/// Four camera slots keyed by mount position
#[derive(Debug, Default)]
pub struct FrameBuffers {
    slots: [FrameSlot; 4],
}

impl FrameBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, camera: CameraPosition) -> &FrameSlot {
        &self.slots[camera.index()]
    }

    /// Store `frame` in the slot of the camera that produced it.
    pub fn publish(&self, frame: Arc<ImageFrame>) -> bool {
        self.slot(frame.camera).publish(frame)
    }

    /// Cameras that have delivered at least one frame
    pub fn live_cameras(&self) -> Vec<CameraPosition> {
        CameraPosition::ALL
            .into_iter()
            .filter(|camera| self.slot(*camera).has_frame())
            .collect()
    }

    pub fn clear(&self) {
        for slot in &self.slots {
            slot.clear();
        }
    }
}

impl FrameStore for FrameBuffers {
    fn latest(&self, camera: CameraPosition) -> Option<Arc<ImageFrame>> {
        self.slot(camera).latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::PixelFormat;
    use std::thread;

    fn frame(camera: CameraPosition, frame_id: u64) -> Arc<ImageFrame> {
        Arc::new(ImageFrame {
            camera,
            width: 2,
            height: 2,
            format: PixelFormat::Rgb8,
            timestamp: frame_id as f64 * 0.05,
            frame_id: Some(frame_id),
            data: Bytes::from(vec![0u8; 12]),
        })
    }

    #[test]
    fn test_empty_slot() {
        let buffers = FrameBuffers::new();
        assert!(buffers.latest(CameraPosition::Left).is_none());
        assert!(buffers.live_cameras().is_empty());
    }

    #[test]
    fn test_latest_wins() {
        let slot = FrameSlot::new();
        assert!(!slot.publish(frame(CameraPosition::Left, 1)));
        assert!(slot.publish(frame(CameraPosition::Left, 2)));

        assert_eq!(slot.latest().unwrap().frame_id, Some(2));
        assert_eq!(slot.received(), 2);
        assert_eq!(slot.overwritten(), 1);

        // Reading does not consume the frame
        assert_eq!(slot.latest().unwrap().frame_id, Some(2));

        // A read frame being replaced is not an overwrite
        assert!(!slot.publish(frame(CameraPosition::Left, 3)));
        assert_eq!(slot.overwritten(), 1);
    }

    #[test]
    fn test_routed_by_camera() {
        let buffers = FrameBuffers::new();
        buffers.publish(frame(CameraPosition::Right, 1));
        buffers.publish(frame(CameraPosition::Rear, 1));

        assert!(buffers.latest(CameraPosition::Left).is_none());
        assert!(buffers.latest(CameraPosition::Right).is_some());
        assert_eq!(
            buffers.live_cameras(),
            vec![CameraPosition::Right, CameraPosition::Rear]
        );

        buffers.clear();
        assert!(buffers.live_cameras().is_empty());
    }

    #[test]
    fn test_concurrent_writers_keep_one_whole_frame() {
        let buffers = Arc::new(FrameBuffers::new());
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let buffers = buffers.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        buffers.publish(frame(CameraPosition::Front, w * 1000 + i));
                    }
                })
            })
            .collect();

        for _ in 0..100 {
            if let Some(f) = buffers.latest(CameraPosition::Front) {
                assert!(f.is_well_formed());
            }
        }
        for writer in writers {
            writer.join().unwrap();
        }

        let slot = buffers.slot(CameraPosition::Front);
        assert_eq!(slot.received(), 1000);
        let last = slot.latest().unwrap().frame_id.unwrap();
        assert_eq!(last % 1000, 249);
    }
}
