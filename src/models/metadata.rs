//! Chart metadata and the song-select ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Difficulty labels, declared from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Fated,
}

impl Difficulty {
    /// Position in the song-select list.
    pub fn rank(&self) -> u8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
            Difficulty::Fated => 3,
        }
    }

    /// Label shortened for the difficulty badge.
    pub fn badge(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medi.",
            Difficulty::Hard => "hard",
            Difficulty::Fated => "fated",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Fated => "fated",
        };
        f.write_str(s)
    }
}

/// Contents of a chart folder's `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,

    pub bpm: Option<f64>,
    #[serde(default)]
    pub first_beat: f64,
    #[serde(default)]
    pub preview_time: f64,
    pub measure_size: Option<u32>,
    #[serde(default)]
    pub snaps: u32,

    pub audio_ext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_ext: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_chart: Option<String>,
}

impl ChartMetadata {
    /// Fresh metadata for a newly created chart.
    pub fn new(id: impl Into<String>, title: impl Into<String>, audio_ext: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            difficulty: Difficulty::Easy,
            bpm: None,
            first_beat: 0.0,
            preview_time: 0.0,
            measure_size: None,
            snaps: 0,
            audio_ext: audio_ext.into(),
            img_ext: None,
            credit_audio: None,
            credit_img: None,
            credit_chart: None,
        }
    }
}

/// Total order used by the chart list: difficulty first, then title, then id.
pub fn compare_charts(a: &ChartMetadata, b: &ChartMetadata) -> Ordering {
    a.difficulty
        .rank()
        .cmp(&b.difficulty.rank())
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts charts for the song-select list.
pub fn sort_charts(charts: &mut [ChartMetadata]) {
    charts.sort_by(compare_charts);
}
