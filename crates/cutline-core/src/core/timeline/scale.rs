//! Timeline zoom scale.
//!
//! Holds the horizontal scale of the timeline and derives the ruler steps
//! from it. All bounds come from [`TimelineSettings`].

use tracing::warn;

use super::marks::StepConfig;
use crate::core::settings::TimelineSettings;
use crate::core::{CoreResult, TimeSec};

/// Horizontal zoom of the timeline (1.0 = content fills the viewport).
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineScale {
    scale: f64,
    min_scale: f64,
    max_scale: f64,
    scale_step: f64,
    wheel_zoom_in: f64,
    wheel_zoom_out: f64,
}

impl TimelineScale {
    pub fn new(settings: &TimelineSettings) -> Self {
        let mut settings = settings.clone();
        settings.normalize();

        let mut scale = Self {
            scale: settings.initial_scale,
            min_scale: settings.min_scale,
            max_scale: settings.max_scale,
            scale_step: settings.scale_step,
            wheel_zoom_in: settings.wheel_zoom_in,
            wheel_zoom_out: settings.wheel_zoom_out,
        };
        scale.scale = scale.clamp(settings.initial_scale);
        scale
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    /// Sets the scale, clamped to the configured bounds.
    pub fn set_scale(&mut self, value: f64) {
        if !value.is_finite() {
            warn!("Ignoring non-finite timeline scale {}", value);
            return;
        }
        self.scale = self.clamp(value);
    }

    pub fn increase(&mut self) {
        self.scale = self.clamp(self.scale + self.scale_step);
    }

    pub fn decrease(&mut self) {
        self.scale = self.clamp(self.scale - self.scale_step);
    }

    /// Zooms by one wheel notch. Negative `delta_y` (wheel up) zooms in.
    pub fn apply_wheel(&mut self, delta_y: f64) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let factor = if delta_y < 0.0 {
            self.wheel_zoom_in
        } else {
            self.wheel_zoom_out
        };
        self.scale = self.clamp(self.scale * factor);
    }

    /// Scale as a rounded percentage string, e.g. `"60%"`.
    pub fn percentage(&self) -> String {
        format!("{}%", (self.scale * 100.0).round() as i64)
    }

    /// Width of the timeline content relative to the viewport, in percent.
    pub fn content_width_percent(&self) -> f64 {
        self.scale * 100.0
    }

    /// Ruler steps for the current scale.
    pub fn step_config(&self) -> CoreResult<StepConfig> {
        StepConfig::for_zoom(self.scale)
    }

    /// Longest of the given track durations, `0.0` when there are none.
    pub fn max_duration(durations: &[TimeSec]) -> TimeSec {
        durations
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max)
    }

    fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_scale, self.max_scale)
    }
}

impl Default for TimelineScale {
    fn default() -> Self {
        Self::new(&TimelineSettings::default())
    }
}
