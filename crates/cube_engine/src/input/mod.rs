//! Keyboard and mouse controls
//!
//! The window samples the held keys, buttons and cursor into an [`InputSnapshot`]
//! once per frame; [`apply_controls`] turns that into camera, model and light
//! changes on the scene and then rebuilds the view matrix.
//!
//! | input                 | effect                                    |
//! |-----------------------|-------------------------------------------|
//! | `W` / `S`             | camera forward / back                     |
//! | `A` / `D`             | camera left / right                       |
//! | `Q` / `Z`             | camera up / down                          |
//! | left mouse drag       | camera yaw and pitch                      |
//! | right mouse drag      | rotate the model                          |
//! | keypad `8` / `2`      | light along -x / +x                       |
//! | keypad `4` / `6`      | light along -z / +z                       |
//! | keypad `7` / `1`      | light along -y / +y                       |
//! | `Esc`                 | close                                     |

use bitflags::bitflags;

use crate::foundation::math::Vec3;
use crate::scene::SceneState;

/// Camera and light movement per frame, in world units
pub const MOVE_SPEED: f32 = 0.05;
/// Degrees of rotation per pixel of pointer travel
pub const MOUSE_SENSITIVITY: f64 = 0.1;

bitflags! {
    /// Keys held down this frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeldKeys: u32 {
        /// `W`
        const CAMERA_FORWARD = 1;
        /// `S`
        const CAMERA_REVERSE = 1 << 1;
        /// `A`
        const CAMERA_LEFT = 1 << 2;
        /// `D`
        const CAMERA_RIGHT = 1 << 3;
        /// `Q`
        const CAMERA_UP = 1 << 4;
        /// `Z`
        const CAMERA_DOWN = 1 << 5;
        /// Keypad 8
        const LIGHT_FORWARD = 1 << 6;
        /// Keypad 2
        const LIGHT_REVERSE = 1 << 7;
        /// Keypad 4
        const LIGHT_LEFT = 1 << 8;
        /// Keypad 6
        const LIGHT_RIGHT = 1 << 9;
        /// Keypad 7
        const LIGHT_UP = 1 << 10;
        /// Keypad 1
        const LIGHT_DOWN = 1 << 11;
        /// `Esc`
        const CLOSE = 1 << 12;
    }
}

bitflags! {
    /// Mouse buttons held down this frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        /// Primary button: rotate the camera
        const ROTATE_CAMERA = 1;
        /// Secondary button: rotate the model
        const ROTATE_MODEL = 1 << 1;
    }
}

/// Polled input state for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSnapshot {
    /// Held keys
    pub keys: HeldKeys,
    /// Held mouse buttons
    pub buttons: MouseButtons,
    /// Pointer position in window coordinates
    pub cursor: (f64, f64),
}

/// What the caller has to act on after the scene was updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlsOutcome {
    /// The user asked to close the window
    pub close_requested: bool,
}

/// Apply one frame of input to `scene`.
///
/// A close request short-circuits everything else. Otherwise camera movement uses
/// the basis of the view matrix from the previous frame, and the view is rebuilt
/// exactly once at the end.
pub fn apply_controls(scene: &mut SceneState, input: &InputSnapshot) -> ControlsOutcome {
    if input.keys.contains(HeldKeys::CLOSE) {
        return ControlsOutcome { close_requested: true };
    }

    let delta_x = ((input.cursor.0 - scene.last_cursor.0) * MOUSE_SENSITIVITY) as f32;
    let delta_y = ((input.cursor.1 - scene.last_cursor.1) * MOUSE_SENSITIVITY) as f32;

    if input.buttons.contains(MouseButtons::ROTATE_CAMERA) {
        scene.yaw -= delta_x;
        scene.pitch += delta_y;
    }
    if input.buttons.contains(MouseButtons::ROTATE_MODEL) {
        let model = scene.model_mut();
        model.rotate(-delta_y * 2.0, Vec3::new(0.0, 0.0, 1.0));
        model.rotate(delta_x * 2.0, Vec3::new(0.0, 1.0, 0.0));
    }
    scene.last_cursor = input.cursor;

    let view = scene.view();
    let (right, up, back) = (view.row3(0), view.row3(1), view.row3(2));

    let mut eye = scene.eye();
    let camera_moves = [
        (HeldKeys::CAMERA_FORWARD, -back),
        (HeldKeys::CAMERA_REVERSE, back),
        (HeldKeys::CAMERA_LEFT, -right),
        (HeldKeys::CAMERA_RIGHT, right),
        (HeldKeys::CAMERA_UP, up),
        (HeldKeys::CAMERA_DOWN, -up),
    ];
    for (key, direction) in camera_moves {
        if input.keys.contains(key) {
            eye += direction * MOVE_SPEED;
        }
    }
    scene.set_eye(eye);

    let mut light = scene.light_pos();
    let light_moves = [
        (HeldKeys::LIGHT_FORWARD, Vec3::new(-1.0, 0.0, 0.0)),
        (HeldKeys::LIGHT_REVERSE, Vec3::new(1.0, 0.0, 0.0)),
        (HeldKeys::LIGHT_LEFT, Vec3::new(0.0, 0.0, -1.0)),
        (HeldKeys::LIGHT_RIGHT, Vec3::new(0.0, 0.0, 1.0)),
        (HeldKeys::LIGHT_UP, Vec3::new(0.0, -1.0, 0.0)),
        (HeldKeys::LIGHT_DOWN, Vec3::new(0.0, 1.0, 0.0)),
    ];
    for (key, direction) in light_moves {
        if input.keys.contains(key) {
            light += direction * MOVE_SPEED;
        }
    }
    scene.set_light_pos(light);

    scene.recompute_view();
    ControlsOutcome::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4;
    use approx::assert_relative_eq;

    fn scene() -> SceneState {
        SceneState::new(1024, 768)
    }

    fn keys(keys: HeldKeys) -> InputSnapshot {
        InputSnapshot {
            keys,
            ..Default::default()
        }
    }

    #[test]
    fn test_escape_requests_close_without_changes() {
        let mut s = scene();
        let before = s.clone();
        let input = InputSnapshot {
            keys: HeldKeys::CLOSE | HeldKeys::CAMERA_FORWARD,
            buttons: MouseButtons::ROTATE_CAMERA,
            cursor: (50.0, 50.0),
        };
        assert!(apply_controls(&mut s, &input).close_requested);
        assert_eq!(s, before);
    }

    #[test]
    fn test_forward_moves_towards_origin() {
        // Startup camera sits at +x looking at the cube
        let mut s = scene();
        apply_controls(&mut s, &keys(HeldKeys::CAMERA_FORWARD));
        let eye = s.eye();
        assert_relative_eq!(eye.x, 2.45, epsilon = 1e-5);
        assert_relative_eq!(eye.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(eye.z, 0.0, epsilon = 1e-5);
        assert_eq!(*s.view(), Mat4::euler_view(eye, s.pitch, s.yaw));
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut s = scene();
        let eye = s.eye();
        apply_controls(
            &mut s,
            &keys(HeldKeys::CAMERA_LEFT | HeldKeys::CAMERA_RIGHT | HeldKeys::CAMERA_UP | HeldKeys::CAMERA_DOWN),
        );
        assert_relative_eq!((s.eye() - eye).norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_light_nudges() {
        let mut s = scene();
        apply_controls(&mut s, &keys(HeldKeys::LIGHT_FORWARD | HeldKeys::LIGHT_RIGHT | HeldKeys::LIGHT_DOWN));
        let light = s.light_pos();
        assert_relative_eq!(light.x, 0.95, epsilon = 1e-6);
        assert_relative_eq!(light.y, 0.05, epsilon = 1e-6);
        assert_relative_eq!(light.z, 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_camera_drag_changes_yaw_and_pitch() {
        let mut s = scene();
        s.last_cursor = (100.0, 100.0);
        let input = InputSnapshot {
            buttons: MouseButtons::ROTATE_CAMERA,
            cursor: (120.0, 90.0),
            ..Default::default()
        };
        apply_controls(&mut s, &input);
        assert_relative_eq!(s.yaw, 88.0, epsilon = 1e-5);
        assert_relative_eq!(s.pitch, -1.0, epsilon = 1e-5);
        assert_eq!(s.last_cursor, (120.0, 90.0));
        assert_eq!(*s.model(), Mat4::identity());
        assert_eq!(*s.view(), Mat4::euler_view(s.eye(), s.pitch, s.yaw));
    }

    #[test]
    fn test_model_drag_rotates_model_only() {
        let mut s = scene();
        let input = InputSnapshot {
            buttons: MouseButtons::ROTATE_MODEL,
            cursor: (0.0, 100.0),
            ..Default::default()
        };
        apply_controls(&mut s, &input);
        assert_eq!(s.yaw, 90.0);

        let mut expected = Mat4::identity();
        expected.rotate(-20.0, Vec3::new(0.0, 0.0, 1.0));
        expected.rotate(0.0, Vec3::new(0.0, 1.0, 0.0));
        for i in 0..16 {
            assert_relative_eq!(s.model()[i], expected[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_pointer_motion_without_buttons_only_tracks_cursor() {
        let mut s = scene();
        let before = *s.view();
        let input = InputSnapshot {
            cursor: (300.0, 200.0),
            ..Default::default()
        };
        apply_controls(&mut s, &input);
        assert_eq!(s.last_cursor, (300.0, 200.0));
        assert_eq!(*s.view(), before);
    }
}
