//! User settings persisted as TOML.

use crate::models::hit_window::HitWindow;
use crate::models::stats::ScoreWeights;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables read by game and editor sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Added to every playback position before it reaches the core.
    pub offset_ms: f64,
    /// How long before its hit time a note becomes active.
    pub activation_duration_ms: i64,
    /// Time span over which a hit ring closes on its key.
    pub hitring_duration_ms: f64,
    /// How long after the last event a session keeps running.
    pub end_grace_ms: f64,
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub hitsound_volume: f32,
    pub hit_window: HitWindow,
    pub score_weights: ScoreWeights,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            offset_ms: 0.0,
            activation_duration_ms: 800,
            hitring_duration_ms: 400.0,
            end_grace_ms: 5000.0,
            music_volume: 1.0,
            sfx_volume: 1.0,
            hitsound_volume: 1.0,
            hit_window: HitWindow::new(),
            score_weights: ScoreWeights::new(),
        }
    }

    /// Loads settings, falling back to defaults on any problem.
    pub fn load_or_default(path: &Path) -> Self {
        match load_toml::<Settings>(path) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("SETTINGS: using defaults ({:?}: {})", path, e);
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, content).map_err(|e| e.to_string())
    }

    /// Replaces out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::new();

        if !self.hit_window.is_valid() {
            log::warn!("SETTINGS: invalid hit window {:?}, using defaults", self.hit_window);
            self.hit_window = defaults.hit_window;
        }
        if !self.score_weights.is_valid() {
            log::warn!("SETTINGS: invalid score weights {:?}, using defaults", self.score_weights);
            self.score_weights = defaults.score_weights;
        }
        if self.activation_duration_ms < 0 {
            self.activation_duration_ms = defaults.activation_duration_ms;
        }
        if !(self.hitring_duration_ms.is_finite() && self.hitring_duration_ms > 0.0) {
            self.hitring_duration_ms = defaults.hitring_duration_ms;
        }
        if !(self.end_grace_ms.is_finite() && self.end_grace_ms >= 0.0) {
            self.end_grace_ms = defaults.end_grace_ms;
        }
        if !self.offset_ms.is_finite() {
            self.offset_ms = defaults.offset_ms;
        }
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.hitsound_volume = self.hitsound_volume.clamp(0.0, 1.0);

        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    match toml::from_str(&content) {
        Ok(data) => Ok(data),
        Err(e) => {
            log::error!("Failed to parse TOML file {:?}: {}", path, e);
            Err(e.to_string())
        }
    }
}
