//! # Application and Renderer Configuration
//!
//! Typed settings for the window, logging and the Vulkan renderer. Every struct
//! is `#[serde(default)]`, so a config file only needs the keys it changes.
//!
//! ```toml
//! log_level = "debug"
//!
//! [window]
//! width = 1280
//! height = 720
//!
//! [renderer]
//! enable_validation = true
//! texture_dirs = ["./textures/", "/opt/assets/"]
//! ```

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// Default window width in pixels
pub const DEFAULT_WIDTH: u32 = 1024;
/// Default window height in pixels
pub const DEFAULT_HEIGHT: u32 = 768;
/// Window title and Vulkan application name
pub const APPLICATION_NAME: &str = "Hello Vulkan";
/// Directory name under `<prefix>/share` holding installed assets
pub const PACKAGE_NAME: &str = "hello-vulkan";

/// # Vulkan Renderer Configuration
///
/// Instance metadata, validation, and where the shader and texture assets are found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Package name used for the install-relative `share/<package>` directory
    pub package_name: String,
    /// Whether to enable Vulkan validation layers (`None` = debug builds only)
    pub enable_validation: Option<bool>,
    /// SPIR-V vertex shader file name
    pub vertex_shader: String,
    /// SPIR-V fragment shader file name
    pub fragment_shader: String,
    /// Diffuse texture file name (`.tex` format)
    pub diffuse_texture: String,
    /// Normal map file name (`.tex` format)
    pub normal_texture: String,
    /// Directories searched for shaders, in order
    pub shader_dirs: Vec<String>,
    /// Directories searched for textures, in order
    pub texture_dirs: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            application_name: APPLICATION_NAME.to_string(),
            package_name: PACKAGE_NAME.to_string(),
            enable_validation: None,
            vertex_shader: "vert.spv".to_string(),
            fragment_shader: "frag.spv".to_string(),
            diffuse_texture: "brick.tex".to_string(),
            normal_texture: "normal.tex".to_string(),
            shader_dirs: vec!["./src/shaders/".to_string(), "./shaders/".to_string()],
            texture_dirs: vec!["./textures/".to_string(), "../textures/".to_string()],
        }
    }
}

impl RendererConfig {
    /// Whether validation layers should be requested
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("Application name cannot be empty".to_string()));
        }
        let files = [
            ("vertex shader", &self.vertex_shader),
            ("fragment shader", &self.fragment_shader),
            ("diffuse texture", &self.diffuse_texture),
            ("normal texture", &self.normal_texture),
        ];
        for (what, name) in files {
            if name.is_empty() {
                return Err(ConfigError::Invalid(format!("{} file name cannot be empty", what)));
            }
        }
        Ok(())
    }
}

impl Config for RendererConfig {}

/// Window creation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Width in screen coordinates
    pub width: u32,
    /// Height in screen coordinates
    pub height: u32,
    /// Window title
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            title: APPLICATION_NAME.to_string(),
        }
    }
}

/// # Application Configuration
///
/// Top-level settings loaded by the binary before command-line overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Window settings
    pub window: WindowConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Window size must be positive, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        self.renderer.validate()
    }
}

impl Config for AppConfig {}
