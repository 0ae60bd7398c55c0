//! Asset loading: texture files and file search paths

pub mod search;
pub mod texture;

pub use search::SearchPaths;
pub use texture::{TextureData, TextureError};
