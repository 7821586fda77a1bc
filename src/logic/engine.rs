use crate::logic::judge::{HitJudge, Judged, MissedNote};
use crate::logic::scheduler::EventScheduler;
use crate::logic::score::{Delta, ScoreAggregator};
use crate::models::event::MuseEvent;
use crate::models::event_store::OrderedEventStore;
use crate::models::hit_window::HitWindow;
use crate::models::settings::Settings;
use crate::models::stats::{ScoreWeights, SessionResult, Stats};
use crate::system::emitter::EventEmitter;
use std::mem;

/// Read-only tunables shared by every session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub offset_ms: f64,
    pub activation_ms: i64,
    pub hitring_ms: f64,
    pub end_grace_ms: f64,
    pub hit_window: HitWindow,
    pub weights: ScoreWeights,
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            offset_ms: settings.offset_ms,
            activation_ms: settings.activation_duration_ms,
            hitring_ms: settings.hitring_duration_ms,
            end_grace_ms: settings.end_grace_ms,
            hit_window: settings.hit_window,
            weights: settings.score_weights,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Started,
    Ended,
}

/// What happened during one `tick`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub fired: Vec<MuseEvent>,
    pub missed: Vec<MissedNote>,
    pub ended: bool,
    /// Set on the tick that ends the session.
    pub result: Option<SessionResult>,
}

/// One play-through of a chart.
#[derive(Debug)]
pub struct GameSession {
    config: SessionConfig,
    scheduler: EventScheduler,
    judge: HitJudge,
    score: ScoreAggregator,
    stage: Stage,
    paused: bool,

    // Catch-up output of key presses, reported by the next tick.
    pending_fired: Vec<MuseEvent>,
    pending_missed: Vec<MissedNote>,
    result: Option<SessionResult>,
}

impl GameSession {
    pub fn new(store: &OrderedEventStore, config: SessionConfig) -> Self {
        log::info!(
            "GAME: session with {} events (activation {} ms, offset {} ms)",
            store.len(),
            config.activation_ms,
            config.offset_ms
        );

        Self {
            scheduler: EventScheduler::from_store(store, config.activation_ms, config.end_grace_ms),
            judge: HitJudge::new(config.hit_window),
            score: ScoreAggregator::new(config.hit_window, config.weights),
            config,
            stage: Stage::Loading,
            paused: false,
            pending_fired: Vec::new(),
            pending_missed: Vec::new(),
            result: None,
        }
    }

    /// Raw audio position shifted by the configured offset.
    pub fn position(&self, raw_position_ms: f64) -> f64 {
        raw_position_ms + self.config.offset_ms
    }

    pub fn tick(&mut self, raw_position_ms: f64) -> TickReport {
        if self.stage == Stage::Ended {
            return TickReport::default();
        }
        let pos = self.position(raw_position_ms);

        self.catch_up(pos);
        let mut report = TickReport {
            fired: mem::take(&mut self.pending_fired),
            missed: mem::take(&mut self.pending_missed),
            ..TickReport::default()
        };

        // Every queued note must be judged or timed out before the end.
        if self.judge.outstanding() == 0 && self.scheduler.check_end(pos) {
            let result = self.score.finish();
            log::info!(
                "GAME: ended, accuracy {:?}, grade {}, max combo {}",
                result.accuracy_percent(),
                result.grade,
                result.stats.max_combo
            );
            self.stage = Stage::Ended;
            self.result = Some(result);
            report.ended = true;
            report.result = Some(result);
        }

        report
    }

    /// Handles a key press at `raw_position_ms`.
    ///
    /// The scheduler is first brought up to the press position so a note
    /// activating in between is visible to the judge.
    pub fn key_down(&mut self, key: char, raw_position_ms: f64) -> Option<Judged> {
        if self.stage == Stage::Ended {
            return None;
        }
        let pos = self.position(raw_position_ms);
        self.catch_up(pos);

        let judged = self.judge.on_key_press(key, pos, !self.paused)?;
        self.score.record(Delta::Hit(judged.delta_ms));
        log::debug!(
            "GAME: {} on {:?} ({:+.1} ms)",
            judged.judgement,
            key,
            judged.delta_ms
        );
        Some(judged)
    }

    fn catch_up(&mut self, pos: f64) {
        self.stage = Stage::Started;

        let fired = self.scheduler.advance(pos, &mut self.judge);
        self.pending_fired.extend(fired);

        let missed = self.scheduler.check_timeouts(pos, &mut self.judge);
        for _ in &missed {
            self.score.record(Delta::Miss);
        }
        self.pending_missed.extend(missed);
    }

    /// Closing progress of each pending hit ring of `key`, oldest first.
    ///
    /// 1.0 means the ring just appeared, 0.0 means it is on the key; late
    /// notes go negative until they time out.
    pub fn hit_ring_progress(&self, key: char, raw_position_ms: f64) -> Vec<f64> {
        let pos = self.position(raw_position_ms);
        self.judge
            .pending(key)
            .map(|hit| (hit as f64 - pos) / self.config.hitring_ms)
            .collect()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Starts over from position 0 with fresh statistics.
    pub fn restart(&mut self) {
        log::info!("GAME: restart");
        self.scheduler.reset(&mut self.judge);
        self.score.reset();
        self.pending_fired.clear();
        self.pending_missed.clear();
        self.result = None;
        self.paused = false;
        self.stage = Stage::Loading;
    }

    /// Tears the session down: queues cleared, listeners detached.
    pub fn stop(&mut self) {
        self.judge.clear();
        self.scheduler.emitter_mut().clear();
        self.pending_fired.clear();
        self.pending_missed.clear();
        self.stage = Stage::Ended;
    }

    pub fn emitter_mut(&mut self) -> &mut EventEmitter {
        self.scheduler.emitter_mut()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn stats(&self) -> Stats {
        self.score.snapshot()
    }

    pub fn result(&self) -> Option<SessionResult> {
        self.result
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
