//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (for example `"info"`) is used.
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    // A second init (tests, embedding) keeps the first logger
    let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();
}
