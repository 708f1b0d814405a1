//! Time ↔ percent mapping over a set of loaded time ranges.

use crate::core::{CoreError, CoreResult, TimeRange, TimeSec, TimeWindow};

/// Converts `time` to a position (percent) inside the union of `ranges`.
///
/// An empty set maps everything to `0.0`. A union with zero duration is
/// rejected with [`CoreError::InvalidRange`]. The result is not clamped, so
/// off-screen times come back below 0 or above 100.
pub fn time_to_percent(ranges: &[TimeRange], time: TimeSec) -> CoreResult<f64> {
    if !time.is_finite() {
        return Err(CoreError::InvalidTimeValue(time));
    }

    match TimeWindow::covering(ranges)? {
        Some(window) => Ok(window.time_to_percent(time)),
        None => Ok(0.0),
    }
}

/// Converts a position (percent) back to an absolute time.
///
/// Exact inverse of [`time_to_percent`]; an empty set maps to `0.0`.
pub fn percent_to_time(ranges: &[TimeRange], percent: f64) -> CoreResult<TimeSec> {
    if !percent.is_finite() {
        return Err(CoreError::InvalidTimeValue(percent));
    }

    match TimeWindow::covering(ranges)? {
        Some(window) => Ok(window.percent_to_time(percent)),
        None => Ok(0.0),
    }
}

/// Whether a mapped position falls inside the visible window.
pub fn is_visible(percent: f64) -> bool {
    (0.0..=100.0).contains(&percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_midpoint_of_single_range() {
        let ranges = [TimeRange::new(0.0, 100.0)];
        assert_eq!(time_to_percent(&ranges, 50.0).unwrap(), 50.0);
        assert_eq!(percent_to_time(&ranges, 50.0).unwrap(), 50.0);
    }

    #[test]
    fn test_empty_ranges_fall_back_to_zero() {
        assert_eq!(time_to_percent(&[], 42.0).unwrap(), 0.0);
        assert_eq!(percent_to_time(&[], 42.0).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let ranges = [TimeRange::new(5.0, 5.0)];
        assert!(matches!(
            time_to_percent(&ranges, 5.0),
            Err(CoreError::InvalidRange { start, end }) if start == 5.0 && end == 5.0
        ));
        assert!(percent_to_time(&ranges, 50.0).is_err());
    }

    #[test]
    fn test_non_finite_inputs_are_rejected() {
        let ranges = [TimeRange::new(0.0, 10.0)];
        assert!(matches!(
            time_to_percent(&ranges, f64::NAN),
            Err(CoreError::InvalidTimeValue(_))
        ));
        assert!(percent_to_time(&ranges, f64::INFINITY).is_err());
    }

    #[test]
    fn test_union_of_several_ranges() {
        // Window is [10, 60]
        let ranges = [
            TimeRange::new(30.0, 60.0),
            TimeRange::new(10.0, 20.0),
        ];
        assert_eq!(time_to_percent(&ranges, 10.0).unwrap(), 0.0);
        assert_eq!(time_to_percent(&ranges, 60.0).unwrap(), 100.0);
        assert_eq!(time_to_percent(&ranges, 35.0).unwrap(), 50.0);
    }

    #[test]
    fn test_off_window_times_are_not_clamped() {
        let ranges = [TimeRange::new(0.0, 10.0)];
        let before = time_to_percent(&ranges, -5.0).unwrap();
        let after = time_to_percent(&ranges, 15.0).unwrap();

        assert_eq!(before, -50.0);
        assert_eq!(after, 150.0);
        assert!(!is_visible(before));
        assert!(!is_visible(after));
        assert!(is_visible(0.0));
        assert!(is_visible(100.0));
    }

    #[test]
    fn test_times_inside_window_stay_in_bounds() {
        let ranges = [TimeRange::new(3.25, 17.5), TimeRange::new(8.0, 41.75)];
        let mut t = 3.25;
        while t <= 41.75 {
            let p = time_to_percent(&ranges, t).unwrap();
            assert!((0.0..=100.0).contains(&p), "{t}s mapped to {p}%");
            t += 0.125;
        }
    }

    #[test]
    fn test_round_trip_percent_time_percent() {
        let ranges = [TimeRange::new(1.7, 93.3), TimeRange::new(12.0, 250.9)];
        for i in 0..=1000 {
            let p = i as f64 / 10.0;
            let t = percent_to_time(&ranges, p).unwrap();
            assert_close(time_to_percent(&ranges, t).unwrap(), p);
        }
    }

    #[test]
    fn test_round_trip_time_percent_time() {
        let ranges = [TimeRange::new(-4.0, 36.0)];
        for i in 0..=400 {
            let t = -4.0 + i as f64 * 0.1;
            let p = time_to_percent(&ranges, t).unwrap();
            assert_close(percent_to_time(&ranges, p).unwrap(), t);
        }
    }
}
