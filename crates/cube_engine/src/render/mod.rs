//! Rendering
//!
//! [`draw_frame`] drives one frame through the [`FrameTarget`] seam: acquire an
//! image, apply input to the scene, upload both uniform blocks, submit the image's
//! pre-recorded commands, present and wait for the present queue to drain. The
//! Vulkan implementation of the seam lives in [`vulkan`].

pub mod vulkan;

use std::fmt;

use crate::input::{apply_controls, HeldKeys, InputSnapshot};
use crate::scene::{MvpMatrices, SceneAttributes, SharedScene};

/// The GPU side of one frame
pub trait FrameTarget {
    type Error: fmt::Display;

    /// Wait indefinitely for the next presentable image
    fn acquire(&mut self) -> Result<u32, Self::Error>;

    /// Copy both uniform blocks into their buffers
    fn upload(&mut self, mvp: &MvpMatrices, attributes: &SceneAttributes) -> Result<(), Self::Error>;

    /// Submit the command buffer recorded for `image_index`
    fn submit(&mut self, image_index: u32) -> Result<(), Self::Error>;

    /// Queue `image_index` for presentation once rendering finished
    fn present(&mut self, image_index: u32) -> Result<(), Self::Error>;

    /// Block until the present queue is idle
    fn wait_idle(&mut self) -> Result<(), Self::Error>;
}

/// What happened to a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Every step succeeded
    Presented,
    /// A step failed; the failure was logged and the rest of the frame skipped
    Dropped,
}

/// Result of [`draw_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// How far the frame got
    pub status: FrameStatus,
    /// The input asked for the window to close
    pub close_requested: bool,
}

/// Render one frame.
///
/// The scene lock is held only while input is applied and the blocks are copied
/// out, so the upload sees exactly the state committed at that point.
pub fn draw_frame<T: FrameTarget>(target: &mut T, scene: &SharedScene, input: &InputSnapshot) -> FrameReport {
    let dropped = |close_requested| FrameReport {
        status: FrameStatus::Dropped,
        close_requested,
    };

    let image_index = match target.acquire() {
        Ok(index) => index,
        Err(e) => {
            log::warn!("Failed to acquire swap chain image: {}", e);
            // Escape still closes the window while no image can be acquired
            return dropped(input.keys.contains(HeldKeys::CLOSE));
        }
    };

    let (outcome, mvp, attributes) = {
        let mut state = scene.lock();
        let outcome = apply_controls(&mut state, input);
        (outcome, *state.mvp(), state.attributes)
    };
    let close_requested = outcome.close_requested;

    if let Err(e) = target.upload(&mvp, &attributes) {
        log::warn!("Failed to update uniform buffers: {}", e);
        return dropped(close_requested);
    }
    if let Err(e) = target.submit(image_index) {
        log::warn!("Failed to submit draw command buffer: {}", e);
        return dropped(close_requested);
    }

    // A successful submit is always followed by a drained queue
    let presented = match target.present(image_index) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to present swap chain image: {}", e);
            false
        }
    };
    if let Err(e) = target.wait_idle() {
        log::warn!("Failed waiting for the present queue: {}", e);
        return dropped(close_requested);
    }
    if !presented {
        return dropped(close_requested);
    }

    FrameReport {
        status: FrameStatus::Presented,
        close_requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneState;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_acquire: bool,
        fail_submit: bool,
        fail_present: bool,
    }

    impl FrameTarget for Recorder {
        type Error = String;

        fn acquire(&mut self) -> Result<u32, String> {
            self.calls.push("acquire".into());
            if self.fail_acquire {
                Err("out of date".into())
            } else {
                Ok(1)
            }
        }

        fn upload(&mut self, _: &MvpMatrices, _: &SceneAttributes) -> Result<(), String> {
            self.calls.push("upload".into());
            Ok(())
        }

        fn submit(&mut self, index: u32) -> Result<(), String> {
            self.calls.push(format!("submit {}", index));
            if self.fail_submit {
                Err("device lost".into())
            } else {
                Ok(())
            }
        }

        fn present(&mut self, index: u32) -> Result<(), String> {
            self.calls.push(format!("present {}", index));
            if self.fail_present {
                Err("surface lost".into())
            } else {
                Ok(())
            }
        }

        fn wait_idle(&mut self) -> Result<(), String> {
            self.calls.push("wait".into());
            Ok(())
        }
    }

    #[test]
    fn test_frame_order() {
        let scene = SharedScene::new(SceneState::new(800, 600));
        let mut target = Recorder::default();
        let report = draw_frame(&mut target, &scene, &InputSnapshot::default());

        assert_eq!(report.status, FrameStatus::Presented);
        assert!(!report.close_requested);
        assert_eq!(target.calls, ["acquire", "upload", "submit 1", "present 1", "wait"]);
    }

    #[test]
    fn test_failed_submit_drops_frame() {
        let scene = SharedScene::new(SceneState::new(800, 600));
        let mut target = Recorder {
            fail_submit: true,
            ..Default::default()
        };
        let report = draw_frame(&mut target, &scene, &InputSnapshot::default());

        assert_eq!(report.status, FrameStatus::Dropped);
        assert_eq!(target.calls, ["acquire", "upload", "submit 1"]);
    }

    #[test]
    fn test_escape_reports_close() {
        let scene = SharedScene::new(SceneState::new(800, 600));
        let input = InputSnapshot {
            keys: HeldKeys::CLOSE,
            ..Default::default()
        };
        let report = draw_frame(&mut Recorder::default(), &scene, &input);
        assert!(report.close_requested);
    }

    #[test]
    fn test_failed_present_still_waits() {
        let scene = SharedScene::new(SceneState::new(800, 600));
        let mut target = Recorder {
            fail_present: true,
            ..Default::default()
        };
        let report = draw_frame(&mut target, &scene, &InputSnapshot::default());

        assert_eq!(report.status, FrameStatus::Dropped);
        assert_eq!(target.calls, ["acquire", "upload", "submit 1", "present 1", "wait"]);
    }

    #[test]
    fn test_failed_acquire_skips_frame() {
        let scene = SharedScene::new(SceneState::new(800, 600));
        let before = *scene.lock().mvp();
        let mut target = Recorder {
            fail_acquire: true,
            ..Default::default()
        };
        let input = InputSnapshot {
            keys: HeldKeys::CAMERA_FORWARD,
            ..Default::default()
        };
        let report = draw_frame(&mut target, &scene, &input);

        assert_eq!(report.status, FrameStatus::Dropped);
        assert!(!report.close_requested);
        assert_eq!(target.calls, ["acquire"]);
        assert_eq!(*scene.lock().mvp(), before);
    }

    #[test]
    fn test_escape_closes_without_an_image() {
        let scene = SharedScene::new(SceneState::new(800, 600));
        let mut target = Recorder {
            fail_acquire: true,
            ..Default::default()
        };
        let input = InputSnapshot {
            keys: HeldKeys::CLOSE,
            ..Default::default()
        };
        let report = draw_frame(&mut target, &scene, &input);

        assert_eq!(report.status, FrameStatus::Dropped);
        assert!(report.close_requested);
    }
}
