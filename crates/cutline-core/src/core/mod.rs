//! Cutline Core Engine
//!
//! Timeline math, media subprocess integration and settings persistence.

pub mod ffmpeg;
pub mod fs;
pub mod process;
pub mod settings;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
