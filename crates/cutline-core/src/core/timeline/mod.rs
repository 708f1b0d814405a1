//! Timeline Ruler Module
//!
//! Pure, synchronous functions behind the timeline ruler:
//! - time ↔ percent mapping over the loaded media ranges
//! - step selection from the zoom level
//! - multi-level tick (mark) generation
//! - timecode labels
//!
//! Nothing here holds state between calls; the renderer passes the visible
//! window and step config on every pan/zoom change.

mod format;
mod mapper;
mod marks;
mod scale;

pub use format::{format_timecode, TimecodeFormat};
pub use mapper::{is_visible, percent_to_time, time_to_percent};
pub use marks::{
    first_grid_mark, generate_marks, timeline_marks, Marks, StepConfig, TickLevel, TickSpec,
};
pub use scale::TimelineScale;
