use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::models::frame::Frame;

/// Single-frame handoff between the capture callback and readers.
///
/// Holds at most one frame. Publishing replaces the frame with one atomic
/// pointer swap, so readers observe either the previous frame or the new one,
/// never a partially written buffer. Reads take no lock.
#[derive(Debug, Default)]
pub struct LatestFrameSlot {
    current: ArcSwapOption<Frame>,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// The most recent frame, if any.
    pub fn load(&self) -> Option<Arc<Frame>> {
        self.current.load_full()
    }

    /// Replace the current frame unconditionally.
    pub fn store(&self, frame: Frame) {
        self.current.store(Some(Arc::new(frame)));
    }

    /// Replace the current frame while `is_live` holds.
    ///
    /// Liveness is checked again after the swap: if the owner was torn down
    /// in between, the frame is withdrawn so it cannot outlive a `clear`.
    /// Returns whether the frame stayed published.
    pub fn publish_if(&self, frame: Frame, is_live: impl Fn() -> bool) -> bool {
        if !is_live() {
            return false;
        }

        let published = Some(Arc::new(frame));
        self.current.store(published.clone());
        if is_live() {
            return true;
        }

        // Only withdraw our own frame; a newer one belongs to a newer owner.
        let _ = self.current.compare_and_swap(&published, None::<Arc<Frame>>);
        false
    }

    pub fn clear(&self) {
        self.current.store(None);
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn frame(bytes: Vec<u8>, sequence: u64) -> Frame {
        Frame::new(Arc::from(bytes), sequence)
    }

    #[test]
    fn empty_until_first_store() {
        let slot = LatestFrameSlot::new();
        assert!(slot.load().is_none());
        assert!(slot.is_empty());
    }

    #[test]
    fn newest_frame_wins() {
        let slot = LatestFrameSlot::new();
        slot.store(frame(vec![1; 5000], 1));
        slot.store(frame(vec![2; 3000], 2));

        let latest = slot.load().unwrap();
        assert_eq!(latest.len(), 3000);
        assert_eq!(latest.sequence(), 2);
        // Reading again yields the same frame.
        assert_eq!(slot.load().unwrap().bytes(), latest.bytes());
    }

    #[test]
    fn clear_empties_slot() {
        let slot = LatestFrameSlot::new();
        slot.store(frame(vec![7; 10], 1));
        slot.clear();
        assert!(slot.load().is_none());
    }

    #[test]
    fn publish_if_refuses_when_not_live() {
        let slot = LatestFrameSlot::new();
        assert!(!slot.publish_if(frame(vec![1; 4], 1), || false));
        assert!(slot.is_empty());
    }

    #[test]
    fn publish_if_withdraws_when_torn_down_mid_publish() {
        let slot = LatestFrameSlot::new();
        let checks = AtomicBool::new(true);
        // Live on the first check, dead on the second.
        let published = slot.publish_if(frame(vec![1; 4], 1), || checks.swap(false, Ordering::SeqCst));
        assert!(!published);
        assert!(slot.is_empty());
    }

    #[test]
    fn concurrent_readers_never_see_torn_frames() {
        let slot = Arc::new(LatestFrameSlot::new());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let slot = Arc::clone(&slot);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for seq in 1..=2000u64 {
                    let fill = (seq % 251) as u8;
                    let len = 512 + (seq as usize % 7) * 1024;
                    slot.store(frame(vec![fill; len], seq));
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let slot = Arc::clone(&slot);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::SeqCst) {
                        if let Some(f) = slot.load() {
                            let fill = (f.sequence() % 251) as u8;
                            assert!(f.bytes().iter().all(|&b| b == fill));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(slot.load().unwrap().sequence(), 2000);
    }
}
