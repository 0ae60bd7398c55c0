use std::convert::Infallible;

use cube_engine::input::{HeldKeys, InputSnapshot};
use cube_engine::render::{draw_frame, FrameStatus, FrameTarget};
use cube_engine::scene::{MvpMatrices, SceneAttributes, SceneState, SharedScene};

/// Stands in for the GPU: keeps the last uploaded blocks and counts presents
#[derive(Default)]
struct FakeSwapchain {
    image_count: u32,
    next_image: u32,
    uploaded: Option<(MvpMatrices, SceneAttributes)>,
    presented: Vec<u32>,
}

impl FrameTarget for FakeSwapchain {
    type Error = Infallible;

    fn acquire(&mut self) -> Result<u32, Infallible> {
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        Ok(index)
    }

    fn upload(&mut self, mvp: &MvpMatrices, attributes: &SceneAttributes) -> Result<(), Infallible> {
        self.uploaded = Some((*mvp, *attributes));
        Ok(())
    }

    fn submit(&mut self, _: u32) -> Result<(), Infallible> {
        Ok(())
    }

    fn present(&mut self, image_index: u32) -> Result<(), Infallible> {
        self.presented.push(image_index);
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

#[test]
fn uniforms_track_latest_committed_scene() {
    let scene = SharedScene::new(SceneState::new(1024, 768));
    let mut target = FakeSwapchain {
        image_count: 3,
        ..Default::default()
    };

    for frame in 0..5 {
        scene.lock().attributes.specular_exp = frame as f32;
        let report = draw_frame(&mut target, &scene, &InputSnapshot::default());
        assert_eq!(report.status, FrameStatus::Presented);

        let (_, attributes) = target.uploaded.unwrap();
        assert_eq!(attributes.specular_exp, frame as f32);
    }

    // A write after the last frame is not seen until the next one
    scene.lock().attributes.specular_exp = 99.0;
    assert_eq!(target.uploaded.unwrap().1.specular_exp, 4.0);
    assert_eq!(target.presented, vec![0, 1, 2, 0, 1]);
}

#[test]
fn input_is_applied_before_upload() {
    let scene = SharedScene::new(SceneState::new(1024, 768));
    let mut target = FakeSwapchain {
        image_count: 2,
        ..Default::default()
    };
    let input = InputSnapshot {
        keys: HeldKeys::LIGHT_REVERSE,
        ..Default::default()
    };

    draw_frame(&mut target, &scene, &input);

    let (mvp, attributes) = target.uploaded.unwrap();
    let state = scene.lock();
    assert_eq!(attributes.light_pos, state.attributes.light_pos);
    assert_eq!(mvp.view, *state.view());
    assert!(attributes.light_pos[0] > 1.0);
}
