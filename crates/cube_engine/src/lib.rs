//! # Cube Engine
//!
//! A minimal Vulkan renderer for a single textured, normal-mapped cube lit by one
//! point light, with keyboard/mouse camera controls and a line-oriented console
//! for inspecting and changing the lighting while it runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cube_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let mut window = Window::new(&WindowSettings {
//!         title: config.window.title.clone(),
//!         width: config.window.width,
//!         height: config.window.height,
//!         default_size: (config.window.width, config.window.height),
//!         fullscreen: false,
//!     })?;
//!
//!     let mut context = DeviceContext::new();
//!     context.initialize(&mut window, &config.renderer, true)?;
//!
//!     let scene = SharedScene::new(SceneState::new(config.window.width, config.window.height));
//!     while !window.should_close() {
//!         window.poll_events();
//!         let report = draw_frame(&mut context, &scene, &window.input_snapshot());
//!         if report.close_requested {
//!             window.set_should_close(true);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![allow(clippy::module_name_repetitions, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod console;
pub mod core;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        console::{Command, Console},
        core::config::{AppConfig, Config, RendererConfig, WindowConfig},
        foundation::{
            math::{Mat4, Vec3},
            time::{FrameCounter, SharedFramerate},
        },
        input::{apply_controls, InputSnapshot},
        render::{
            draw_frame,
            vulkan::{DeviceContext, VulkanError, VulkanResult, Window, WindowSettings},
            FrameReport, FrameStatus, FrameTarget,
        },
        scene::{CloseFlag, SceneState, SharedScene},
    };
}
