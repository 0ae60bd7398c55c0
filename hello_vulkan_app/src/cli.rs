//! Command-line options
//!
//! `-h` is the height, so clap's own help flag is replaced by `-?`/`--help`.

use clap::error::{ContextKind, ContextValue};
use clap::{ArgAction, Parser};
use thiserror::Error;

use cube_engine::core::config::{WindowConfig, PACKAGE_NAME};

#[derive(Parser, Debug)]
#[command(name = PACKAGE_NAME, disable_help_flag = true)]
pub struct Cli {
    /// Set resolution width
    #[arg(short = 'w', long, value_name = "pixels")]
    pub width: Option<String>,

    /// Set resolution height
    #[arg(short = 'h', long, value_name = "pixels")]
    pub height: Option<String>,

    /// Enable fullscreen mode
    #[arg(short = 'f', long)]
    pub fullscreen: bool,

    /// Disable VSync
    #[arg(short = 'v', long)]
    pub novsync: bool,

    /// Launch in interactive mode
    #[arg(short = 'i', long)]
    pub interactive: bool,

    /// Display framerate every second
    #[arg(short = 'r', long)]
    pub framerate: bool,

    /// Display this help
    #[arg(short = '?', long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("Invalid width value: {0}")]
    InvalidWidth(String),

    #[error("Invalid height value: {0}")]
    InvalidHeight(String),
}

/// Validated options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
    pub interactive: bool,
    pub framerate: bool,
}

fn dimension(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|&v| v > 0)
}

impl Options {
    /// Check sizes and fill unset ones from `window`
    pub fn from_cli(cli: Cli, window: &WindowConfig) -> Result<Self, CliError> {
        let width = match &cli.width {
            Some(value) => dimension(value).ok_or_else(|| CliError::InvalidWidth(value.clone()))?,
            None => window.width,
        };
        let height = match &cli.height {
            Some(value) => dimension(value).ok_or_else(|| CliError::InvalidHeight(value.clone()))?,
            None => window.height,
        };

        Ok(Self {
            width,
            height,
            fullscreen: cli.fullscreen,
            vsync: !cli.novsync,
            interactive: cli.interactive,
            framerate: cli.framerate,
        })
    }

    /// Whether frames are counted at all
    pub fn counts_frames(&self) -> bool {
        self.framerate || self.interactive
    }

    /// Whether `FPS:` lines go to stdout
    pub fn prints_framerate(&self) -> bool {
        self.framerate && !self.interactive
    }
}

/// One-line description of a parse error, naming the offending argument
pub fn describe_error(error: &clap::Error) -> String {
    match error.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => format!("{}: {}", error.kind(), arg),
        _ => error.kind().to_string(),
    }
}

/// Help text for `-?`
pub fn usage(window: &WindowConfig) -> String {
    format!(
        "Usage: {} [options]\n\n\
         \x20-w, --width <pixels>\tSet resolution width. Default is {}.\n\
         \x20-h, --height <pixels>\tSet resolution height. Default is {}.\n\
         \x20-f, --fullscreen\tEnable fullscreen mode. Width and height are\n\
         \t\t\tset to the monitor's resolution if not provided.\n\
         \x20-v, --novsync\t\tDisable VSync.\n\
         \x20-i, --interactive\tLaunch in interactive mode.\n\
         \x20-r, --framerate\tDisplay framerate every second. Ignored in\n\
         \t\t\tinteractive mode.\n\
         \x20-?, --help\t\tDisplay this help.\n",
        PACKAGE_NAME, window.width, window.height
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Options, CliError> {
        let cli = Cli::try_parse_from(std::iter::once("hello-vulkan").chain(args.iter().copied())).unwrap();
        Options::from_cli(cli, &WindowConfig::default())
    }

    #[test]
    fn test_defaults() {
        let options = parse(&[]).unwrap();
        assert_eq!((options.width, options.height), (1024, 768));
        assert!(options.vsync);
        assert!(!options.fullscreen && !options.interactive && !options.framerate);
    }

    #[test]
    fn test_short_flags() {
        let options = parse(&["-w", "800", "-h", "600", "-f", "-v", "-r"]).unwrap();
        assert_eq!((options.width, options.height), (800, 600));
        assert!(options.fullscreen);
        assert!(!options.vsync);
        assert!(options.prints_framerate());
    }

    #[test]
    fn test_interactive_silences_framerate() {
        let options = parse(&["--framerate", "--interactive"]).unwrap();
        assert!(options.counts_frames());
        assert!(!options.prints_framerate());
    }

    #[test]
    fn test_invalid_sizes() {
        assert_eq!(parse(&["--width", "0"]), Err(CliError::InvalidWidth("0".to_string())));
        assert_eq!(parse(&["-h", "tall"]), Err(CliError::InvalidHeight("tall".to_string())));
        assert_eq!(
            CliError::InvalidWidth("abc".to_string()).to_string(),
            "Invalid width value: abc"
        );
    }

    #[test]
    fn test_question_mark_is_help() {
        let err = Cli::try_parse_from(["hello-vulkan", "-?"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_unknown_flag() {
        let err = Cli::try_parse_from(["hello-vulkan", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert!(describe_error(&err).contains("--bogus"));
    }

    #[test]
    fn test_missing_value_names_flag() {
        let err = Cli::try_parse_from(["hello-vulkan", "--width"]).unwrap_err();
        assert!(describe_error(&err).contains("--width"));
    }

    #[test]
    fn test_usage_mentions_defaults() {
        let text = usage(&WindowConfig::default());
        assert!(text.starts_with("Usage: hello-vulkan [options]"));
        assert!(text.contains("Default is 1024."));
        assert!(text.contains("Default is 768."));
    }
}
