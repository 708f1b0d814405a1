//! Cutline Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::ffmpeg::FFmpegError;
use super::TimeSec;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Timeline Errors
    // =========================================================================
    /// Empty, reversed, non-finite or zero-duration time range.
    #[error("Invalid time range: {start}~{end} seconds")]
    InvalidRange { start: TimeSec, end: TimeSec },

    #[error("Invalid step config: {0}")]
    InvalidStepConfig(String),

    #[error("Invalid time value: {0}")]
    InvalidTimeValue(f64),

    // =========================================================================
    // Media Errors
    // =========================================================================
    #[error(transparent)]
    FFmpeg(#[from] FFmpegError),

    // =========================================================================
    // Settings Errors
    // =========================================================================
    #[error("Failed to load settings: {0}")]
    SettingsLoadFailed(String),

    #[error("Failed to save settings: {0}")]
    SettingsSaveFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// HTTP status a request/response wrapper should answer with.
    ///
    /// Contract violations are client errors; a missing media file is a 404
    /// and everything that failed inside ffmpeg or on disk is a 500.
    pub fn http_status(&self) -> u16 {
        match self {
            CoreError::InvalidRange { .. }
            | CoreError::InvalidStepConfig(_)
            | CoreError::InvalidTimeValue(_)
            | CoreError::ValidationError(_) => 400,
            CoreError::FFmpeg(e) => e.http_status(),
            CoreError::SettingsLoadFailed(_)
            | CoreError::SettingsSaveFailed(_)
            | CoreError::IoError(_)
            | CoreError::JsonError(_) => 500,
        }
    }
}
