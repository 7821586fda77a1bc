//! Definitions and constructors for hit window timing thresholds.

use crate::models::stats::Judgement;
use serde::{Deserialize, Serialize};

/// Tiered timing windows, in milliseconds of absolute timing error.
///
/// `miss_ms` is the outer bound: a press further than that from its note is
/// not a hit at all, and a note left unanswered for that long times out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitWindow {
    pub perfect_ms: f64,
    pub good_ms: f64,
    pub miss_ms: f64,
}

impl HitWindow {
    /// Default windows used when settings don't override them.
    pub fn new() -> Self {
        Self {
            perfect_ms: 40.0,
            good_ms: 100.0,
            miss_ms: 250.0,
        }
    }

    /// Utility constructor for fully custom values.
    pub fn from_custom(perfect: f64, good: f64, miss: f64) -> Self {
        Self {
            perfect_ms: perfect,
            good_ms: good,
            miss_ms: miss,
        }
    }

    /// Tier bounds from innermost to outermost.
    pub fn tiers(&self) -> [f64; 3] {
        [self.perfect_ms, self.good_ms, self.miss_ms]
    }

    /// Tiers must be positive, finite and strictly increasing.
    pub fn is_valid(&self) -> bool {
        let tiers = self.tiers();
        tiers.iter().all(|t| t.is_finite() && *t > 0.0) && tiers.windows(2).all(|w| w[0] < w[1])
    }

    /// True when a timing error is close enough to count as a hit attempt.
    pub fn contains(&self, timing_diff_ms: f64) -> bool {
        timing_diff_ms.abs() <= self.miss_ms
    }

    /// Classifies a signed timing error.
    ///
    /// Returns `None` past the outer tier: such presses are ignored entirely.
    pub fn judge(&self, timing_diff_ms: f64) -> Option<Judgement> {
        let abs_diff = timing_diff_ms.abs();

        if abs_diff <= self.perfect_ms {
            Some(Judgement::Perfect)
        } else if abs_diff <= self.good_ms {
            Some(Judgement::Good)
        } else if abs_diff <= self.miss_ms {
            Some(Judgement::Miss)
        } else {
            None
        }
    }
}

impl Default for HitWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_inclusive() {
        let w = HitWindow::new();
        assert_eq!(w.judge(0.0), Some(Judgement::Perfect));
        assert_eq!(w.judge(-40.0), Some(Judgement::Perfect));
        assert_eq!(w.judge(40.5), Some(Judgement::Good));
        assert_eq!(w.judge(-100.0), Some(Judgement::Good));
        assert_eq!(w.judge(180.0), Some(Judgement::Miss));
        assert_eq!(w.judge(250.0), Some(Judgement::Miss));
        assert_eq!(w.judge(250.1), None);
        assert_eq!(w.judge(-900.0), None);
    }

    #[test]
    fn validity() {
        assert!(HitWindow::new().is_valid());
        assert!(!HitWindow::from_custom(50.0, 40.0, 250.0).is_valid());
        assert!(!HitWindow::from_custom(0.0, 40.0, 250.0).is_valid());
        assert!(!HitWindow::from_custom(10.0, 40.0, f64::NAN).is_valid());
    }
}
