//! FFmpeg Integration Module
//!
//! Thin async wrapper around the external `ffmpeg`/`ffprobe` binaries:
//! - Media probing (duration, container, first video/audio stream)
//! - Thumbnail strips sampled across a clip
//! - Single frame extraction
//! - Two-clip transitions rendered with `xfade`
//!
//! Binaries are either configured explicitly or detected on the system.
//! Argument lists are built by pure functions in [`args`] so they can be
//! checked without a binary installed.

pub mod args;
mod detection;
mod probe;
mod runner;

pub use args::{TransitionKind, TransitionRequest};
pub use detection::*;
pub use probe::{parse_probe_output, AudioStreamInfo, MediaInfo, VideoStreamInfo};
pub use runner::FFmpegRunner;

/// FFmpeg-related error types
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("FFmpeg not found. Install FFmpeg or set media.ffmpegPath in settings.")]
    NotFound,

    #[error("FFmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("Output path error: {0}")]
    OutputError(String),

    #[error("FFprobe error: {0}")]
    ProbeError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Timeout: operation took too long")]
    Timeout,
}

impl FFmpegError {
    /// HTTP status a request handler should answer with.
    ///
    /// A missing input file is the caller's problem (404); every other
    /// failure is on the tool side (500).
    pub fn http_status(&self) -> u16 {
        match self {
            FFmpegError::InvalidInput(_) => 404,
            _ => 500,
        }
    }
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;
