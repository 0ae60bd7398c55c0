//! Window management using GLFW

use ash::vk;
use thiserror::Error;

use crate::input::{HeldKeys, InputSnapshot, MouseButtons};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW failed to initialize
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// Window or monitor unavailable
    #[error("Window creation failed")]
    CreationFailed,

    /// Other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result alias for window operations
pub type WindowResult<T> = Result<T, WindowError>;

const KEY_BINDINGS: [(glfw::Key, HeldKeys); 13] = [
    (glfw::Key::W, HeldKeys::CAMERA_FORWARD),
    (glfw::Key::S, HeldKeys::CAMERA_REVERSE),
    (glfw::Key::A, HeldKeys::CAMERA_LEFT),
    (glfw::Key::D, HeldKeys::CAMERA_RIGHT),
    (glfw::Key::Q, HeldKeys::CAMERA_UP),
    (glfw::Key::Z, HeldKeys::CAMERA_DOWN),
    (glfw::Key::Kp8, HeldKeys::LIGHT_FORWARD),
    (glfw::Key::Kp2, HeldKeys::LIGHT_REVERSE),
    (glfw::Key::Kp4, HeldKeys::LIGHT_LEFT),
    (glfw::Key::Kp6, HeldKeys::LIGHT_RIGHT),
    (glfw::Key::Kp7, HeldKeys::LIGHT_UP),
    (glfw::Key::Kp1, HeldKeys::LIGHT_DOWN),
    (glfw::Key::Escape, HeldKeys::CLOSE),
];

const BUTTON_BINDINGS: [(glfw::MouseButton, MouseButtons); 2] = [
    (glfw::MouseButton::Button1, MouseButtons::ROTATE_CAMERA),
    (glfw::MouseButton::Button2, MouseButtons::ROTATE_MODEL),
];

/// Size of a fullscreen window.
///
/// An untouched default size is replaced by the monitor's video mode; an explicit
/// size is kept.
pub fn fullscreen_size(requested: (u32, u32), defaults: (u32, u32), video_mode: Option<(u32, u32)>) -> (u32, u32) {
    match video_mode {
        Some(mode) if requested == defaults => mode,
        _ => requested,
    }
}

/// How the window is created
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    /// Window title
    pub title: String,
    /// Requested width in screen coordinates
    pub width: u32,
    /// Requested height in screen coordinates
    pub height: u32,
    /// Size used when none was requested; fullscreen replaces it with the monitor's
    pub default_size: (u32, u32),
    /// Cover the primary monitor
    pub fullscreen: bool,
}

/// GLFW window without a client API, for Vulkan
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    _events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Initialize GLFW and open the window
    pub fn new(settings: &WindowSettings) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        if !glfw.vulkan_supported() {
            return Err(WindowError::GlfwError("Vulkan is not supported by GLFW".to_string()));
        }

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(false));

        let requested = (settings.width, settings.height);
        let created = if settings.fullscreen {
            glfw.with_primary_monitor(|glfw, monitor| {
                let monitor = monitor?;
                let mode = monitor.get_video_mode().map(|mode| (mode.width, mode.height));
                let (width, height) = fullscreen_size(requested, settings.default_size, mode);
                log::info!("Creating {}x{} fullscreen window", width, height);
                glfw.create_window(width, height, &settings.title, glfw::WindowMode::FullScreen(monitor))
            })
        } else {
            log::info!("Creating {}x{} window", settings.width, settings.height);
            glfw.create_window(
                settings.width,
                settings.height,
                &settings.title,
                glfw::WindowMode::Windowed,
            )
        };
        let (window, events) = created.ok_or(WindowError::CreationFailed)?;

        Ok(Self {
            glfw,
            window,
            _events: events,
        })
    }

    /// Whether a close was requested
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request or cancel closing
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Process pending window events without blocking
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Window size in screen coordinates
    pub fn size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Cursor position in screen coordinates
    pub fn cursor_pos(&self) -> (f64, f64) {
        self.window.get_cursor_pos()
    }

    /// Sample held keys, buttons and the cursor
    pub fn input_snapshot(&self) -> InputSnapshot {
        let mut keys = HeldKeys::empty();
        for (key, flag) in KEY_BINDINGS {
            if self.window.get_key(key) == glfw::Action::Press {
                keys |= flag;
            }
        }
        let mut buttons = MouseButtons::empty();
        for (button, flag) in BUTTON_BINDINGS {
            if self.window.get_mouse_button(button) == glfw::Action::Press {
                buttons |= flag;
            }
        }
        InputSnapshot {
            keys,
            buttons,
            cursor: self.cursor_pos(),
        }
    }

    /// Instance extensions GLFW needs for presentation
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Failed to get required extensions".to_string()))
    }

    /// Create a presentation surface for `instance`
    pub fn create_vulkan_surface(&mut self, instance: vk::Instance) -> WindowResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!("Failed to create Vulkan surface: {:?}", result)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullscreen_takes_monitor_size_for_defaults() {
        assert_eq!(fullscreen_size((1024, 768), (1024, 768), Some((2560, 1440))), (2560, 1440));
    }

    #[test]
    fn test_fullscreen_keeps_explicit_size() {
        assert_eq!(fullscreen_size((800, 600), (1024, 768), Some((2560, 1440))), (800, 600));
        assert_eq!(fullscreen_size((1024, 768), (1024, 768), None), (1024, 768));
    }

    #[test]
    fn test_bindings_are_distinct() {
        let all = KEY_BINDINGS.iter().fold(HeldKeys::empty(), |acc, (_, flag)| acc | *flag);
        assert_eq!(all, HeldKeys::all());
        assert_eq!(BUTTON_BINDINGS[0].1 | BUTTON_BINDINGS[1].1, MouseButtons::all());
    }
}
