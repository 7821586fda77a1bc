//! Beat-grid quantization for editor navigation.

/// Fraction of a step inside which a position counts as already on a line.
const ON_LINE_EPSILON: f64 = 0.01;
/// Float-noise tolerance on the side a position approaches a line from.
const NOISE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Evenly spaced grid lines anchored at `origin_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGrid {
    pub origin_ms: f64,
    pub step_ms: f64,
}

impl SnapGrid {
    /// Snap grid of a chart: `snaps` extra lines between consecutive beats.
    ///
    /// `None` without a positive bpm or without an origin.
    pub fn from_timing(bpm: Option<f64>, snaps: u32, origin_ms: Option<f64>) -> Option<Self> {
        let beat = Self::beat_grid(bpm, origin_ms)?;
        Some(Self {
            step_ms: beat.step_ms / f64::from(snaps + 1),
            ..beat
        })
    }

    /// One line per beat.
    pub fn beat_grid(bpm: Option<f64>, origin_ms: Option<f64>) -> Option<Self> {
        let bpm = bpm.filter(|b| b.is_finite() && *b > 0.0)?;
        let origin_ms = origin_ms.filter(|o| o.is_finite())?;
        Some(Self {
            origin_ms,
            step_ms: 60_000.0 / bpm,
        })
    }

    /// Time of grid line `index`.
    pub fn line(&self, index: f64) -> f64 {
        self.origin_ms + index * self.step_ms
    }
}

/// Moves `time_ms` to the next grid line in `direction`.
///
/// A position on a line, or just past one in the travel direction, moves a
/// whole line further so repeated calls always make progress. Without a
/// grid the position is returned unchanged.
pub fn snap_to(time_ms: f64, direction: Direction, grid: Option<&SnapGrid>) -> f64 {
    let Some(grid) = grid else {
        return time_ms;
    };

    let beat = (time_ms - grid.origin_ms) / grid.step_ms;
    let frac = beat.rem_euclid(1.0);

    let index = match direction {
        Direction::Forward => {
            if frac < ON_LINE_EPSILON || 1.0 - frac < NOISE_EPSILON {
                beat.round() + 1.0
            } else {
                beat.ceil()
            }
        }
        Direction::Backward => {
            if 1.0 - frac < ON_LINE_EPSILON || frac < NOISE_EPSILON {
                beat.round() - 1.0
            } else {
                beat.floor()
            }
        }
    };

    grid.line(index)
}
