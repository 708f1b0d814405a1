//! Timecode formatting for ruler labels and time readouts.

use crate::core::TimeSec;

/// Which components a timecode shows after `HH:MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimecodeFormat {
    pub show_seconds: bool,
    pub show_millis: bool,
}

impl TimecodeFormat {
    /// `HH:MM:SS`, used for tick labels
    pub const RULER: Self = Self {
        show_seconds: true,
        show_millis: false,
    };

    /// `HH:MM:SS:mmm`
    pub const FULL: Self = Self {
        show_seconds: true,
        show_millis: true,
    };
}

/// Formats `seconds` as `HH:MM[:SS][:mmm]`.
///
/// Hours do not wrap at 24. Negative times are prefixed with `-`;
/// non-finite input formats as zero.
///
/// ```
/// use cutline_core::core::timeline::{format_timecode, TimecodeFormat};
/// assert_eq!(format_timecode(3725.5, TimecodeFormat::FULL), "01:02:05:500");
/// assert_eq!(format_timecode(90.0, TimecodeFormat::RULER), "00:01:30");
/// ```
pub fn format_timecode(seconds: TimeSec, format: TimecodeFormat) -> String {
    let seconds = if seconds.is_finite() { seconds } else { 0.0 };
    let sign = if seconds < 0.0 { "-" } else { "" };

    let total_ms = (seconds.abs() * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    let mut out = format!("{sign}{hours:02}:{minutes:02}");
    if format.show_seconds {
        out.push_str(&format!(":{secs:02}"));
    }
    if format.show_millis {
        out.push_str(&format!(":{ms:03}"));
    }
    out
}
