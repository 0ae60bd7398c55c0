//! Foundation module - Core utilities and types
//!
//! - Math types and matrix operations
//! - Frame timing
//! - Logging setup

pub mod math;
pub mod time;
pub mod logging;
