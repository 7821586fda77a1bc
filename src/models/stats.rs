//! Hit statistics, judgement types and grades.
//!
//! This module defines the judgement system used for scoring, including
//! accuracy calculation and the letter grade shown on the results screen.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hit judgement types from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgement {
    /// Inside the innermost window.
    Perfect,
    /// Inside the second window.
    Good,
    /// Late/early beyond the good window, or never pressed.
    Miss,
}

impl Judgement {
    /// Returns true if this judgement keeps the combo going.
    pub fn continues_combo(&self) -> bool {
        !matches!(self, Judgement::Miss)
    }
}

impl fmt::Display for Judgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Judgement::Perfect => write!(f, "perfect"),
            Judgement::Good => write!(f, "good"),
            Judgement::Miss => write!(f, "miss"),
        }
    }
}

/// Points per judgement used by the accuracy formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
}

impl ScoreWeights {
    pub fn new() -> Self {
        Self {
            perfect: 3,
            good: 1,
            miss: 0,
        }
    }

    /// A perfect must be worth strictly more than a good, and a miss nothing.
    pub fn is_valid(&self) -> bool {
        self.perfect > self.good && self.miss == 0
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulated statistics for a play session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
    pub combo: u32,
    pub max_combo: u32,
    /// Mean signed timing error of perfects and goods (negative = early).
    pub mean_delta_ms: f64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notes that received a judgement.
    pub fn judged(&self) -> u32 {
        self.perfect + self.good + self.miss
    }

    pub fn is_full_combo(&self) -> bool {
        self.miss == 0
    }

    /// Weighted accuracy in `0.0..=1.0`.
    ///
    /// `None` when nothing was judged; the ratio is undefined then.
    pub fn accuracy(&self, weights: &ScoreWeights) -> Option<f64> {
        let judged = self.judged();
        if judged == 0 || weights.perfect == 0 {
            return None;
        }

        let score = u64::from(self.perfect) * u64::from(weights.perfect)
            + u64::from(self.good) * u64::from(weights.good)
            + u64::from(self.miss) * u64::from(weights.miss);
        let max_score = u64::from(judged) * u64::from(weights.perfect);

        Some(score as f64 / max_score as f64)
    }
}

/// Letter grades from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    F,
    C,
    B,
    A,
    S,
    X,
}

impl Grade {
    pub const ALL: [Grade; 6] = [Grade::F, Grade::C, Grade::B, Grade::A, Grade::S, Grade::X];

    /// Minimum accuracy for `F`, `C`, `B`, `A`, `S`.
    const ACCURACY_REQS: [f64; 5] = [0.0, 0.6, 0.75, 0.9, 1.0];

    /// Grades an accuracy; a full combo promotes by one letter.
    ///
    /// Ungraded sessions (`None`) get the lowest letter.
    pub fn from_accuracy(accuracy: Option<f64>, full_combo: bool) -> Self {
        let Some(accuracy) = accuracy.filter(|a| a.is_finite()) else {
            return Grade::F;
        };

        let base = Self::ACCURACY_REQS
            .iter()
            .rposition(|req| accuracy >= *req)
            .unwrap_or(0);
        let idx = (base + usize::from(full_combo)).min(Self::ALL.len() - 1);
        Self::ALL[idx]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::F => "F",
            Grade::C => "C",
            Grade::B => "B",
            Grade::A => "A",
            Grade::S => "S",
            Grade::X => "X",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("unknown grade: {s}"))
    }
}

/// Final numbers of a finished session, as shown on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub stats: Stats,
    /// `None` when no note was judged.
    pub accuracy: Option<f64>,
    pub grade: Grade,
    pub full_combo: bool,
}

impl SessionResult {
    pub fn from_stats(stats: Stats, weights: &ScoreWeights) -> Self {
        let accuracy = stats.accuracy(weights);
        let full_combo = stats.is_full_combo();
        Self {
            stats,
            accuracy,
            grade: Grade::from_accuracy(accuracy, full_combo),
            full_combo,
        }
    }

    /// Accuracy as a percentage, if the session was graded.
    pub fn accuracy_percent(&self) -> Option<f64> {
        self.accuracy.map(|a| a * 100.0)
    }

    pub fn is_graded(&self) -> bool {
        self.accuracy.is_some()
    }
}
