//! Hello Vulkan
//!
//! Opens a window showing a spinning, textured, normal-mapped cube. With
//! `--interactive` a console on stdin can inspect and change the lighting while
//! the cube renders.

mod cli;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use thiserror::Error;

use cube_engine::config::ConfigError;
use cube_engine::foundation::logging;
use cube_engine::prelude::*;
use cube_engine::render::vulkan::WindowError;

use crate::cli::{describe_error, usage, Cli, CliError, Options};

const CONFIG_FILE: &str = "hello_vulkan.toml";

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    #[error("Vulkan initialization failed.")]
    Vulkan(#[from] VulkanError),
}

struct CubeApp {
    options: Options,
    // Declared before the window so the device context drops first
    context: DeviceContext,
    window: Window,
    scene: SharedScene,
    framerate: SharedFramerate,
    close: CloseFlag,
}

impl CubeApp {
    fn new(options: Options, config: &AppConfig) -> Result<Self, AppError> {
        let mut window = Window::new(&WindowSettings {
            title: config.window.title.clone(),
            width: options.width,
            height: options.height,
            default_size: (config.window.width, config.window.height),
            fullscreen: options.fullscreen,
        })?;

        let mut context = DeviceContext::new();
        if let Err(e) = context.initialize(&mut window, &config.renderer, options.vsync) {
            log::error!("Device setup stopped: {}", e);
            context.teardown();
            return Err(e.into());
        }

        let (width, height) = window.size();
        let mut state = SceneState::new(width, height);
        state.last_cursor = window.cursor_pos();

        Ok(Self {
            options,
            context,
            window,
            scene: SharedScene::new(state),
            framerate: SharedFramerate::new(),
            close: CloseFlag::new(),
        })
    }

    fn run(&mut self) {
        if self.options.interactive {
            let spawned = cube_engine::console::spawn(self.scene.clone(), self.framerate.clone(), self.close.clone());
            if let Err(e) = spawned {
                log::warn!("Failed to start the console: {}", e);
            }
        }

        let mut counter = FrameCounter::new();
        while !self.window.should_close() {
            self.window.poll_events();
            if self.close.is_requested() {
                self.window.set_should_close(true);
            }

            let report = draw_frame(&mut self.context, &self.scene, &self.window.input_snapshot());
            if report.close_requested {
                self.window.set_should_close(true);
            }

            if self.options.counts_frames() {
                let new_second = counter.frame();
                self.framerate.set(counter.fps());
                if new_second && self.options.prints_framerate() {
                    println!("FPS: {:.6}", counter.fps());
                }
            }
        }

        if self.options.counts_frames() {
            log::info!("Rendered {} frames at {:.2} FPS", counter.frame_count(), counter.fps());
        }
        self.context.wait_device_idle();
        self.context.teardown();
    }
}

fn load_config() -> AppConfig {
    match AppConfig::load_or_default(CONFIG_FILE) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring {}: {}", CONFIG_FILE, e);
            AppConfig::default()
        }
    }
}

fn start(cli: Cli, config: &AppConfig) -> Result<(), AppError> {
    config.validate()?;
    let options = Options::from_cli(cli, &config.window)?;
    let mut app = CubeApp::new(options, config)?;
    app.run();
    Ok(())
}

fn main() -> ExitCode {
    let config = load_config();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            print!("{}", usage(&config.window));
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", describe_error(&e));
            eprint!("{}", usage(&config.window));
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.log_level);

    match start(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
