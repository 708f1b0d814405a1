//! Cutline Core Library
//!
//! Timeline ruler math and media tooling for the Cutline video editor.
//! The web and desktop shells render the ruler; everything they need to
//! place ticks (time/percent mapping, step selection, mark generation)
//! lives here as pure functions with explicit inputs.
//!
//! Media work (probing, thumbnail strips, transitions) is delegated to an
//! external `ffmpeg`/`ffprobe` binary through [`core::ffmpeg::FFmpegRunner`].

pub mod core;

pub use crate::core::{CoreError, CoreResult, TimeRange, TimeSec, TimeWindow};
pub use crate::core::timeline::{
    first_grid_mark, generate_marks, percent_to_time, time_to_percent, timeline_marks, Marks,
    StepConfig, TickLevel, TickSpec, TimelineScale,
};
