//! Scene state shared by input handling, the console and the frame loop
//!
//! [`SceneState`] holds the two uniform blocks uploaded every frame plus the camera
//! orientation they are derived from. The view matrix is only ever rebuilt from the
//! eye position, pitch and yaw through [`SceneState::recompute_view`].

pub mod geometry;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::math::{Mat4, Vec3};

/// Default ambient material color
pub const CUBE_AMBIENT: [f32; 3] = [0.15, 0.15, 0.15];
/// Default diffuse material color
pub const CUBE_DIFFUSE: [f32; 3] = [1.0, 1.0, 1.0];
/// Default specular material color
pub const CUBE_SPECULAR: [f32; 3] = [1.0, 1.0, 1.0];
/// Default specular exponent
pub const CUBE_SPECULAR_EXP: f32 = 10.0;
/// Initial camera position
pub const EYE: [f32; 3] = [2.5, 0.0, 0.0];
/// Initial light position
pub const LIGHT_POS: [f32; 3] = [1.0, 0.0, 0.0];
/// Initial light color
pub const LIGHT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Vertical field of view in degrees
pub const FIELD_OF_VIEW: f32 = 45.0;
/// Near clipping plane
pub const NEAR_PLANE: f32 = 0.1;
/// Far clipping plane
pub const FAR_PLANE: f32 = 100_000.0;
/// Initial camera yaw in degrees
pub const INITIAL_YAW: f32 = 90.0;
/// Initial camera pitch in degrees
pub const INITIAL_PITCH: f32 = 0.0;

/// Transform uniform block (binding 0, vertex stage)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MvpMatrices {
    /// Model matrix
    pub model: Mat4,
    /// View matrix
    pub view: Mat4,
    /// Projection matrix
    pub proj: Mat4,
}

unsafe impl bytemuck::Pod for MvpMatrices {}
unsafe impl bytemuck::Zeroable for MvpMatrices {}

/// Lighting/material uniform block (binding 2, fragment stage)
///
/// Three-component values sit in four-wide slots to match std140 `vec4` alignment.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneAttributes {
    /// Ambient color
    pub ambient_color: [f32; 4],
    /// Diffuse color
    pub diffuse_color: [f32; 4],
    /// Specular color
    pub specular_color: [f32; 4],
    /// Camera position in world space
    pub eye_pos: [f32; 4],
    /// Light position in world space
    pub light_pos: [f32; 4],
    /// Light color
    pub light_color: [f32; 4],
    /// Specular exponent
    pub specular_exp: f32,
}

unsafe impl bytemuck::Pod for SceneAttributes {}
unsafe impl bytemuck::Zeroable for SceneAttributes {}

impl SceneAttributes {
    /// Attributes populated from the static scene defaults
    pub fn with_defaults() -> Self {
        Self {
            ambient_color: widen(CUBE_AMBIENT),
            diffuse_color: widen(CUBE_DIFFUSE),
            specular_color: widen(CUBE_SPECULAR),
            eye_pos: widen(EYE),
            light_pos: widen(LIGHT_POS),
            light_color: widen(LIGHT_COLOR),
            specular_exp: CUBE_SPECULAR_EXP,
        }
    }
}

fn widen(v: [f32; 3]) -> [f32; 4] {
    [v[0], v[1], v[2], 0.0]
}

/// Camera, transform and lighting state for the cube scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    mvp: MvpMatrices,
    /// Lighting and material block
    pub attributes: SceneAttributes,
    /// Camera pitch in degrees
    pub pitch: f32,
    /// Camera yaw in degrees
    pub yaw: f32,
    /// Pointer position seen on the previous frame
    pub last_cursor: (f64, f64),
}

impl SceneState {
    /// Build the startup scene for a `width` x `height` viewport.
    pub fn new(width: u32, height: u32) -> Self {
        let mut proj = Mat4::identity();
        proj.perspective(FIELD_OF_VIEW, width as f32 / height as f32, NEAR_PLANE, FAR_PLANE);

        let mut scene = Self {
            mvp: MvpMatrices {
                model: Mat4::identity(),
                view: Mat4::identity(),
                proj,
            },
            attributes: SceneAttributes::with_defaults(),
            pitch: INITIAL_PITCH,
            yaw: INITIAL_YAW,
            last_cursor: (0.0, 0.0),
        };
        scene.recompute_view();
        scene
    }

    /// Rebuild the view matrix from the eye position, pitch and yaw.
    pub fn recompute_view(&mut self) {
        self.mvp.view = Mat4::euler_view(self.eye(), self.pitch, self.yaw);
    }

    /// Transform block as uploaded to the GPU
    pub fn mvp(&self) -> &MvpMatrices {
        &self.mvp
    }

    /// Current view matrix
    pub fn view(&self) -> &Mat4 {
        &self.mvp.view
    }

    /// Projection matrix fixed at startup
    pub fn projection(&self) -> &Mat4 {
        &self.mvp.proj
    }

    /// Model matrix
    pub fn model(&self) -> &Mat4 {
        &self.mvp.model
    }

    /// Mutable model matrix
    pub fn model_mut(&mut self) -> &mut Mat4 {
        &mut self.mvp.model
    }

    /// Camera position
    pub fn eye(&self) -> Vec3 {
        narrow(self.attributes.eye_pos)
    }

    /// Move the camera; the view catches up on the next [`recompute_view`](Self::recompute_view).
    pub fn set_eye(&mut self, eye: Vec3) {
        self.attributes.eye_pos = [eye.x, eye.y, eye.z, 0.0];
    }

    /// Light position
    pub fn light_pos(&self) -> Vec3 {
        narrow(self.attributes.light_pos)
    }

    /// Move the light
    pub fn set_light_pos(&mut self, pos: Vec3) {
        self.attributes.light_pos = [pos.x, pos.y, pos.z, 0.0];
    }
}

fn narrow(v: [f32; 4]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

/// Handle to the scene state shared between the render and console threads
///
/// One lock guards the whole state so a frame never uploads a half-written vector.
#[derive(Clone)]
pub struct SharedScene(Arc<Mutex<SceneState>>);

impl SharedScene {
    /// Wrap a scene for sharing
    pub fn new(scene: SceneState) -> Self {
        Self(Arc::new(Mutex::new(scene)))
    }

    /// Lock the scene.
    ///
    /// A panic on another thread cannot leave the plain-data fields invalid, so a
    /// poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, SceneState> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Close request raised by the console or input, consumed by the main loop
#[derive(Clone, Default)]
pub struct CloseFlag(Arc<AtomicBool>);

impl CloseFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the main loop to close the window
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a close was requested
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
