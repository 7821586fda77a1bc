//! Running statistics for a play session.

use crate::models::hit_window::HitWindow;
use crate::models::stats::{Judgement, ScoreWeights, SessionResult, Stats};

/// Input to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    /// A press with its signed timing error in ms.
    Hit(f64),
    /// A note that timed out.
    Miss,
}

#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    window: HitWindow,
    weights: ScoreWeights,
    stats: Stats,
    hits: u32,
}

impl ScoreAggregator {
    pub fn new(window: HitWindow, weights: ScoreWeights) -> Self {
        Self {
            window,
            weights,
            stats: Stats::new(),
            hits: 0,
        }
    }

    /// Folds one outcome into the statistics.
    ///
    /// Returns the judgement applied, or `None` for a hit beyond every tier,
    /// which leaves the stats untouched.
    pub fn record(&mut self, delta: Delta) -> Option<Judgement> {
        let judgement = match delta {
            Delta::Miss => Judgement::Miss,
            Delta::Hit(ms) => self.window.judge(ms)?,
        };

        match judgement {
            Judgement::Miss => {
                self.stats.miss += 1;
                self.stats.combo = 0;
            }
            Judgement::Perfect | Judgement::Good => {
                if judgement == Judgement::Perfect {
                    self.stats.perfect += 1;
                } else {
                    self.stats.good += 1;
                }
                self.stats.combo += 1;
                self.stats.max_combo = self.stats.max_combo.max(self.stats.combo);

                if let Delta::Hit(ms) = delta {
                    self.hits += 1;
                    self.stats.mean_delta_ms += (ms - self.stats.mean_delta_ms) / f64::from(self.hits);
                }
            }
        }

        Some(judgement)
    }

    pub fn snapshot(&self) -> Stats {
        self.stats
    }

    pub fn reset(&mut self) {
        self.stats = Stats::new();
        self.hits = 0;
    }

    pub fn finish(&self) -> SessionResult {
        SessionResult::from_stats(self.stats, &self.weights)
    }
}
