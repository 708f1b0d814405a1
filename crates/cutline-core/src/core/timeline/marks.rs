//! Timeline Mark Generator
//!
//! Produces the ruler ticks for a visible window. Ticks sit on a fixed grid
//! of the finest step (`level4`), aligned to multiples of that step rather
//! than to the window start, so the ruler does not jump while panning.
//!
//! Each tick is classified by strict priority: a multiple of `level1` is
//! `large`, else a multiple of `level2` is `medium`, else a multiple of
//! `level3` is `small`, else `smallest`. Divisibility is evaluated on the
//! integer grid index, never with floating-point modulo.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::format::{format_timecode, TimecodeFormat};
use crate::core::{CoreError, CoreResult, TimeSec, TimeWindow};

/// Allowed relative deviation of a step ratio from the nearest integer.
const STEP_RATIO_TOLERANCE: f64 = 1e-6;

/// Grid positions closer than this (in grid units) to an integer are
/// treated as lying on the grid line.
const GRID_SNAP_EPSILON: f64 = 1e-9;

/// Upper bound for `level1 / level4`.
const MAX_STEP_RATIO: f64 = 1e9;

/// Largest grid coordinate (in `level4` units) a window may reach. Beyond
/// 2^53 consecutive grid lines are no longer distinct `f64` values.
const MAX_GRID_INDEX: f64 = 9_007_199_254_740_992.0;

// =============================================================================
// Tick Types
// =============================================================================

/// Visual weight of a ruler tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickLevel {
    Large,
    Medium,
    Small,
    Smallest,
}

impl TickLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickLevel::Large => "large",
            TickLevel::Medium => "medium",
            TickLevel::Small => "small",
            TickLevel::Smallest => "smallest",
        }
    }
}

impl std::fmt::Display for TickLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single ruler gradation, consumed immediately by the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSpec {
    /// Absolute time of the tick
    pub timestamp: TimeSec,
    /// Position inside the visible window (0 at the left edge, may exceed 100)
    pub position_percent: f64,
    /// Visual weight
    pub level: TickLevel,
    /// Whether the renderer should draw a timecode label
    pub show_label: bool,
}

impl TickSpec {
    /// Ruler label (`HH:MM:SS`) for labelled ticks.
    pub fn label(&self) -> Option<String> {
        self.show_label
            .then(|| format_timecode(self.timestamp, TimecodeFormat::RULER))
    }
}

// =============================================================================
// Step Config
// =============================================================================

/// Step sizes of the four ruler levels, coarsest first.
///
/// Always valid once constructed: every step is finite and positive, the
/// steps strictly decrease, and each step is an integer multiple of the
/// next finer one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepConfig {
    level1_step: TimeSec,
    level2_step: TimeSec,
    level3_step: TimeSec,
    level4_step: TimeSec,
    /// Grid multiples (in `level4` units) of the three coarser levels
    #[serde(skip)]
    large_every: i64,
    #[serde(skip)]
    medium_every: i64,
    #[serde(skip)]
    small_every: i64,
}

impl StepConfig {
    pub fn new(
        level1_step: TimeSec,
        level2_step: TimeSec,
        level3_step: TimeSec,
        level4_step: TimeSec,
    ) -> CoreResult<Self> {
        let steps = [level1_step, level2_step, level3_step, level4_step];

        for (i, step) in steps.iter().enumerate() {
            if !step.is_finite() || *step <= 0.0 {
                return Err(CoreError::InvalidStepConfig(format!(
                    "level{} step must be a positive number, got {}",
                    i + 1,
                    step
                )));
            }
        }

        for (i, pair) in steps.windows(2).enumerate() {
            if pair[1] >= pair[0] {
                return Err(CoreError::InvalidStepConfig(format!(
                    "steps must strictly decrease: level{} ({}) <= level{} ({})",
                    i + 1,
                    pair[0],
                    i + 2,
                    pair[1]
                )));
            }
        }

        if level1_step / level4_step > MAX_STEP_RATIO {
            return Err(CoreError::InvalidStepConfig(format!(
                "level1 step {} is too coarse for level4 step {}",
                level1_step, level4_step
            )));
        }

        let small_every = step_multiple(level3_step, level4_step, 3)?;
        let medium_every = step_multiple(level2_step, level3_step, 2)? * small_every;
        let large_every = step_multiple(level1_step, level2_step, 1)? * medium_every;

        Ok(Self {
            level1_step,
            level2_step,
            level3_step,
            level4_step,
            large_every,
            medium_every,
            small_every,
        })
    }

    /// Steps derived from a primary and a secondary grid step:
    /// `level3 = sub_step / 5`, `level4 = sub_step / 10`.
    pub fn from_scale(time_step: TimeSec, sub_step: TimeSec) -> CoreResult<Self> {
        Self::new(time_step, sub_step, sub_step / 5.0, sub_step / 10.0)
    }

    /// Steps for a zoom level. Higher zoom means finer labelled steps.
    ///
    /// | zoom        | labelled step | secondary step |
    /// |-------------|---------------|----------------|
    /// | > 5         | 1 s           | 0.2 s          |
    /// | (2, 5]      | 5 s           | 1 s            |
    /// | (1, 2]      | 10 s          | 2 s            |
    /// | (0.5, 1]    | 30 s          | 15 s           |
    /// | ≤ 0.5       | 60 s          | 30 s           |
    pub fn for_zoom(zoom: f64) -> CoreResult<Self> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "zoom level must be a positive number, got {}",
                zoom
            )));
        }

        let time_step = if zoom > 5.0 {
            1.0
        } else if zoom > 2.0 {
            5.0
        } else if zoom > 1.0 {
            10.0
        } else if zoom > 0.5 {
            30.0
        } else {
            60.0
        };

        let sub_step = time_step / if zoom > 1.0 { 5.0 } else { 2.0 };

        Self::from_scale(time_step, sub_step)
    }

    pub fn level1_step(&self) -> TimeSec {
        self.level1_step
    }

    pub fn level2_step(&self) -> TimeSec {
        self.level2_step
    }

    pub fn level3_step(&self) -> TimeSec {
        self.level3_step
    }

    /// The finest step, which is also the iteration increment.
    pub fn level4_step(&self) -> TimeSec {
        self.level4_step
    }

    /// Number of ticks `generate_marks` would yield for `window`.
    pub fn tick_count(&self, window: &TimeWindow) -> CoreResult<usize> {
        Ok(generate_marks(window, self)?.len())
    }

    fn level_at(&self, index: i64) -> TickLevel {
        if index.rem_euclid(self.large_every) == 0 {
            TickLevel::Large
        } else if index.rem_euclid(self.medium_every) == 0 {
            TickLevel::Medium
        } else if index.rem_euclid(self.small_every) == 0 {
            TickLevel::Small
        } else {
            TickLevel::Smallest
        }
    }
}

/// Integer ratio `coarse / fine`, or an error when it is not (close to) one.
fn step_multiple(coarse: TimeSec, fine: TimeSec, coarse_level: usize) -> CoreResult<i64> {
    let ratio = coarse / fine;
    let rounded = ratio.round();

    if (ratio - rounded).abs() > STEP_RATIO_TOLERANCE * ratio {
        return Err(CoreError::InvalidStepConfig(format!(
            "level{} step {} is not an integer multiple of level{} step {}",
            coarse_level,
            coarse,
            coarse_level + 1,
            fine
        )));
    }

    Ok(rounded as i64)
}

/// Grid coordinate of `time`, or `None` when it is non-finite or lies
/// outside the representable grid.
fn grid_coordinate(time: TimeSec, step: TimeSec) -> Option<f64> {
    let grid = time / step;
    (grid.abs() <= MAX_GRID_INDEX).then_some(grid)
}

/// Floor of a grid coordinate, snapping values that sit on a grid line
/// within rounding error. The flag tells whether the value was on the line.
///
/// `grid` must come from [`grid_coordinate`].
fn snap_floor(grid: f64) -> (i64, bool) {
    let nearest = grid.round();
    if (grid - nearest).abs() <= GRID_SNAP_EPSILON * nearest.abs().max(1.0) {
        (nearest as i64, true)
    } else {
        (grid.floor() as i64, false)
    }
}

/// Largest multiple of `step` not exceeding `start`.
pub fn first_grid_mark(start: TimeSec, step: TimeSec) -> CoreResult<TimeSec> {
    if !step.is_finite() || step <= 0.0 {
        return Err(CoreError::InvalidStepConfig(format!(
            "grid step must be a positive number, got {}",
            step
        )));
    }
    let grid = grid_coordinate(start, step).ok_or(CoreError::InvalidTimeValue(start))?;

    let (index, _) = snap_floor(grid);
    Ok(index as f64 * step)
}

// =============================================================================
// Generation
// =============================================================================

/// Lazy, ordered sequence of ticks for one window.
#[derive(Clone, Debug)]
pub struct Marks {
    window: TimeWindow,
    steps: StepConfig,
    /// Grid index of `floor(start / level4)`
    origin: i64,
    /// Next grid index to emit
    next: i64,
    /// Last grid index to emit (inclusive)
    last: i64,
}

impl Marks {
    /// `floor(start / level4) * level4`, the grid line at or left of the
    /// window start. Not emitted when it lies before the window.
    pub fn grid_origin(&self) -> TimeSec {
        self.origin as f64 * self.steps.level4_step
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn steps(&self) -> &StepConfig {
        &self.steps
    }

    fn remaining(&self) -> usize {
        self.last
            .checked_sub(self.next)
            .and_then(|span| span.checked_add(1))
            .filter(|n| *n > 0)
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX))
    }
}

impl Iterator for Marks {
    type Item = TickSpec;

    fn next(&mut self) -> Option<TickSpec> {
        if self.next > self.last {
            return None;
        }

        let index = self.next;
        match index.checked_add(1) {
            Some(next) => self.next = next,
            None => self.last = i64::MIN,
        }

        let timestamp = index as f64 * self.steps.level4_step;
        // A tick snapped onto the window start may land a rounding error
        // below it.
        let position_percent = self.window.time_to_percent(timestamp).max(0.0);
        let level = self.steps.level_at(index);

        Some(TickSpec {
            timestamp,
            position_percent,
            level,
            show_label: level == TickLevel::Large,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Marks {}

impl FusedIterator for Marks {}

/// Ticks covering `window` at the finest step of `steps`.
///
/// Runs from the first grid line at or after the window start up to and
/// including `window.end()`. Positions are never clamped at 100%; the loop
/// bound alone limits the range and clipping is the renderer's job.
///
/// Fails with [`CoreError::InvalidRange`] when either bound is more than
/// 2^53 steps away from zero.
pub fn generate_marks(window: &TimeWindow, steps: &StepConfig) -> CoreResult<Marks> {
    let step = steps.level4_step;
    let out_of_grid = || CoreError::InvalidRange {
        start: window.start(),
        end: window.end(),
    };

    let start_grid = grid_coordinate(window.start(), step).ok_or_else(out_of_grid)?;
    let end_grid = grid_coordinate(window.end(), step).ok_or_else(out_of_grid)?;

    let (origin, on_grid) = snap_floor(start_grid);
    let next = if on_grid { origin } else { origin + 1 };
    let (last, _) = snap_floor(end_grid);

    Ok(Marks {
        window: *window,
        steps: *steps,
        origin,
        next,
        last,
    })
}

/// Validates the window and collects its ticks.
pub fn timeline_marks(
    start: TimeSec,
    end: TimeSec,
    steps: &StepConfig,
) -> CoreResult<Vec<TickSpec>> {
    let window = TimeWindow::new(start, end)?;
    let marks = generate_marks(&window, steps)?;

    debug!(
        "Timeline marks: window {:.3}~{:.3}s, step {}s, {} ticks",
        start,
        end,
        steps.level4_step,
        marks.len()
    );

    Ok(marks.collect())
}
