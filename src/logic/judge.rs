//! Hit judgement against per-key queues of outstanding notes.

use crate::models::hit_window::HitWindow;
use crate::models::stats::Judgement;
use std::collections::{HashMap, VecDeque};

/// Outcome of a key press that resolved a note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judged {
    pub key: char,
    pub hit_time_ms: i64,
    /// `position - hit_time`; negative means early.
    pub delta_ms: f64,
    pub judgement: Judgement,
}

/// A note that was never pressed in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissedNote {
    pub key: char,
    pub hit_time_ms: i64,
}

/// Matches key presses to the oldest outstanding note of each key.
#[derive(Debug, Clone, Default)]
pub struct HitJudge {
    queues: HashMap<char, VecDeque<i64>>,
    window: HitWindow,
}

impl HitJudge {
    pub fn new(window: HitWindow) -> Self {
        Self {
            queues: HashMap::new(),
            window,
        }
    }

    pub fn window(&self) -> &HitWindow {
        &self.window
    }

    /// Queues a note that just became active.
    pub fn enqueue(&mut self, key: char, hit_time_ms: i64) {
        self.queues.entry(key).or_default().push_back(hit_time_ms);
    }

    /// Judges a press of `key` at `position_ms`.
    ///
    /// Only the oldest note of the key is considered. A press farther than
    /// the miss tier from it is ignored and the note stays queued.
    pub fn on_key_press(&mut self, key: char, position_ms: f64, enabled: bool) -> Option<Judged> {
        if !enabled {
            return None;
        }

        let queue = self.queues.get_mut(&key)?;
        let hit_time_ms = *queue.front()?;
        let delta_ms = position_ms - hit_time_ms as f64;

        let Some(judgement) = self.window.judge(delta_ms) else {
            log::trace!("JUDGE: ignored {:?} at {:.1} ({:+.1} ms)", key, position_ms, delta_ms);
            return None;
        };

        queue.pop_front();
        Some(Judged {
            key,
            hit_time_ms,
            delta_ms,
            judgement,
        })
    }

    /// Drops a specific outstanding note and reports it as missed.
    pub fn on_timeout(&mut self, key: char, hit_time_ms: i64) -> Option<MissedNote> {
        let queue = self.queues.get_mut(&key)?;
        let idx = queue.iter().position(|t| *t == hit_time_ms)?;
        queue.remove(idx);
        Some(MissedNote { key, hit_time_ms })
    }

    /// Times out every note whose miss window has closed at `position_ms`.
    ///
    /// Results are ordered by hit time, then key.
    pub fn expire(&mut self, position_ms: f64) -> Vec<MissedNote> {
        let miss_ms = self.window.miss_ms;
        let mut due: Vec<(i64, char)> = self
            .queues
            .iter()
            .flat_map(|(key, queue)| {
                queue
                    .iter()
                    .take_while(move |t| position_ms >= **t as f64 + miss_ms)
                    .map(move |t| (*t, *key))
            })
            .collect();
        due.sort_unstable();

        due.into_iter()
            .filter_map(|(hit_time_ms, key)| self.on_timeout(key, hit_time_ms))
            .collect()
    }

    /// Outstanding hit times for `key`, oldest first.
    pub fn pending(&self, key: char) -> impl Iterator<Item = i64> + '_ {
        self.queues.get(&key).into_iter().flatten().copied()
    }

    /// Number of outstanding notes over all keys.
    pub fn outstanding(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    pub fn clear(&mut self) {
        self.queues.clear();
    }
}
