//! Cutline Core Type Definitions
//!
//! Defines fundamental time types shared by the mapper, the mark generator
//! and the CLI.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{CoreError, CoreResult};

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

// =============================================================================
// Time Range
// =============================================================================

/// A span of loaded media, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: TimeSec,
    pub end: TimeSec,
}

impl TimeRange {
    pub fn new(start: TimeSec, end: TimeSec) -> Self {
        if start > end {
            warn!(
                "TimeRange created with start > end ({} > {}), swapping",
                start, end
            );
            return Self {
                start: end,
                end: start,
            };
        }
        Self { start, end }
    }

    /// Returns duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end - self.start
    }

    /// Checks if a given time is within range
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start && time <= self.end
    }

    /// Checks if two ranges overlap
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

// =============================================================================
// Time Window
// =============================================================================

/// The visible `[start, end]` window of the timeline.
///
/// A window always has finite bounds and a strictly positive duration, so
/// every conversion through it is well defined.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    start: TimeSec,
    end: TimeSec,
}

impl TimeWindow {
    pub fn new(start: TimeSec, end: TimeSec) -> CoreResult<Self> {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return Err(CoreError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Union window `[min(starts), max(ends)]` of the given ranges.
    ///
    /// Returns `Ok(None)` for an empty slice and `InvalidRange` when the
    /// union collapses to a single instant.
    pub fn covering(ranges: &[TimeRange]) -> CoreResult<Option<Self>> {
        let Some(first) = ranges.first() else {
            return Ok(None);
        };

        let (min, max) = ranges.iter().fold((first.start, first.end), |(lo, hi), r| {
            (lo.min(r.start), hi.max(r.end))
        });

        Self::new(min, max).map(Some)
    }

    pub fn start(&self) -> TimeSec {
        self.start
    }

    pub fn end(&self) -> TimeSec {
        self.end
    }

    /// Returns duration in seconds (always > 0)
    pub fn duration(&self) -> TimeSec {
        self.end - self.start
    }

    /// Position of `time` inside the window, in percent.
    ///
    /// Not clamped: times before the window map below 0 and times after it
    /// above 100.
    pub fn time_to_percent(&self, time: TimeSec) -> f64 {
        (time - self.start) / self.duration() * 100.0
    }

    /// Inverse of [`TimeWindow::time_to_percent`].
    pub fn percent_to_time(&self, percent: f64) -> TimeSec {
        self.start + self.duration() * percent / 100.0
    }

    /// Same window shifted by `delta` seconds.
    pub fn panned(&self, delta: TimeSec) -> CoreResult<Self> {
        Self::new(self.start + delta, self.end + delta)
    }
}

impl From<TimeWindow> for TimeRange {
    fn from(window: TimeWindow) -> Self {
        TimeRange {
            start: window.start,
            end: window.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_swaps_reversed_bounds() {
        let range = TimeRange::new(10.0, 2.0);
        assert_eq!(range.start, 2.0);
        assert_eq!(range.end, 10.0);
        assert_eq!(range.duration(), 8.0);
    }

    #[test]
    fn test_time_range_contains_and_overlaps() {
        let a = TimeRange::new(0.0, 5.0);
        let b = TimeRange::new(5.0, 8.0);
        let c = TimeRange::new(4.0, 6.0);

        assert!(a.contains(0.0));
        assert!(a.contains(5.0));
        assert!(!a.contains(5.1));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_window_rejects_zero_duration() {
        let err = TimeWindow::new(3.0, 3.0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRange { .. }));
        assert!(TimeWindow::new(4.0, 3.0).is_err());
        assert!(TimeWindow::new(f64::NAN, 3.0).is_err());
        assert!(TimeWindow::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_window_covering_ranges() {
        let ranges = [
            TimeRange::new(12.0, 20.0),
            TimeRange::new(3.0, 8.0),
            TimeRange::new(15.0, 40.0),
        ];
        let window = TimeWindow::covering(&ranges).unwrap().unwrap();
        assert_eq!(window.start(), 3.0);
        assert_eq!(window.end(), 40.0);
        assert_eq!(window.duration(), 37.0);
    }

    #[test]
    fn test_window_covering_empty_and_collapsed() {
        assert!(TimeWindow::covering(&[]).unwrap().is_none());

        let collapsed = [TimeRange::new(7.0, 7.0), TimeRange::new(7.0, 7.0)];
        assert!(matches!(
            TimeWindow::covering(&collapsed),
            Err(CoreError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_window_panned() {
        let window = TimeWindow::new(0.0, 10.0).unwrap().panned(2.5).unwrap();
        assert_eq!(window.start(), 2.5);
        assert_eq!(window.end(), 12.5);
    }
}
