//! Drives the activation-ordered event sequence against the playback clock.

use crate::logic::judge::{HitJudge, MissedNote};
use crate::models::chart::session_events;
use crate::models::event::MuseEvent;
use crate::models::event_store::OrderedEventStore;
use crate::system::emitter::{EventEmitter, START_KIND};

/// Default time a session keeps running after its last event.
pub const END_GRACE_MS: f64 = 5000.0;

#[derive(Debug)]
pub struct EventScheduler {
    events: Vec<MuseEvent>,
    cursor: usize,
    started: bool,
    end_signaled: bool,
    grace_ms: f64,
    emitter: EventEmitter,
}

impl EventScheduler {
    /// `events` must already be in activation order.
    pub fn new(events: Vec<MuseEvent>, grace_ms: f64) -> Self {
        debug_assert!(events.is_sorted_by_key(|e| e.timestamp_ms));
        Self {
            events,
            cursor: 0,
            started: false,
            end_signaled: false,
            grace_ms,
            emitter: EventEmitter::new(),
        }
    }

    /// Builds the session sequence of a loaded chart.
    pub fn from_store(store: &OrderedEventStore, activation_ms: i64, grace_ms: f64) -> Self {
        Self::new(session_events(store.iter(), activation_ms), grace_ms)
    }

    /// Fires every event due at `position_ms`, in order.
    ///
    /// The first call after construction or `reset` also emits `START_KIND`.
    /// Notes are queued on `judge` as they activate.
    pub fn advance(&mut self, position_ms: f64, judge: &mut HitJudge) -> Vec<MuseEvent> {
        if !self.started {
            self.started = true;
            log::info!("SCHEDULER: start ({} events)", self.events.len());
            self.emitter.emit(START_KIND, &MuseEvent::new(0, START_KIND));
        }

        let mut fired = Vec::new();
        while let Some(event) = self.events.get(self.cursor) {
            if event.timestamp_ms as f64 > position_ms {
                break;
            }

            if let Some(key) = event.note_key() {
                judge.enqueue(key, event.hit_time_ms.unwrap_or(event.timestamp_ms));
            }
            self.emitter.emit(&event.kind, event);
            fired.push(event.clone());
            self.cursor += 1;
        }

        fired
    }

    /// Resolves notes left unanswered past the miss tier.
    pub fn check_timeouts(&mut self, position_ms: f64, judge: &mut HitJudge) -> Vec<MissedNote> {
        judge.expire(position_ms)
    }

    /// True exactly once, when every event has fired and the grace period
    /// after the last one has run out.
    pub fn check_end(&mut self, position_ms: f64) -> bool {
        if self.end_signaled || self.cursor < self.events.len() {
            return false;
        }
        if position_ms > self.last_event_time() as f64 + self.grace_ms {
            self.end_signaled = true;
            log::info!("SCHEDULER: end at {:.0} ms", position_ms);
            return true;
        }
        false
    }

    /// Activation time of the last event, 0 for an empty chart.
    pub fn last_event_time(&self) -> i64 {
        self.events.last().map_or(0, |e| e.timestamp_ms)
    }

    /// Rewinds to the beginning and drops every outstanding note.
    pub fn reset(&mut self, judge: &mut HitJudge) {
        self.cursor = 0;
        self.started = false;
        self.end_signaled = false;
        judge.clear();
    }

    pub fn emitter_mut(&mut self) -> &mut EventEmitter {
        &mut self.emitter
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chart::load_chart;
    use crate::models::hit_window::HitWindow;
    use std::sync::{Arc, Mutex};

    fn scheduler(chart: &str) -> EventScheduler {
        EventScheduler::from_store(&load_chart(chart).unwrap(), 800, END_GRACE_MS)
    }

    #[test]
    fn emits_start_once_then_due_events() {
        let mut sched = scheduler("0 intro\n1000 :z\n1500 flash");
        let mut judge = HitJudge::new(HitWindow::new());
        let (_, start_rx) = sched.emitter_mut().subscribe_channel(START_KIND);

        let fired = sched.advance(0.0, &mut judge);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, "intro");
        assert_eq!(start_rx.try_iter().count(), 1);

        let fired = sched.advance(200.0, &mut judge);
        assert_eq!(fired[0].hit_time_ms, Some(1000));
        assert_eq!(judge.pending('z').collect::<Vec<_>>(), [1000]);

        assert!(sched.advance(200.0, &mut judge).is_empty());
        assert!(sched.advance(1499.0, &mut judge).is_empty());
        assert_eq!(sched.advance(1500.0, &mut judge).len(), 1);
        assert_eq!(start_rx.try_iter().count(), 0);
        assert_eq!(judge.outstanding(), 1);
    }

    #[test]
    fn chart_tag_named_start_is_not_the_start_signal() {
        let mut sched = scheduler("0 start\n0 :z");
        let mut judge = HitJudge::new(HitWindow::new());
        let (_, start_rx) = sched.emitter_mut().subscribe_channel(START_KIND);
        let (_, tag_rx) = sched.emitter_mut().subscribe_channel("start");

        sched.advance(1000.0, &mut judge);
        assert_eq!(start_rx.try_iter().count(), 1);
        let tags: Vec<_> = tag_rx.try_iter().collect();
        assert_eq!(tags, [MuseEvent::new(0, "start")]);
    }

    #[test]
    fn listeners_get_their_kind() {
        let mut sched = scheduler("100 :z\n200 :x\n300 :z");
        let mut judge = HitJudge::new(HitWindow::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        sched
            .emitter_mut()
            .subscribe(":z", move |e| sink.lock().unwrap().push(e.hit_time_ms));

        sched.advance(10_000.0, &mut judge);
        assert_eq!(*seen.lock().unwrap(), [Some(100), Some(300)]);
    }

    #[test]
    fn end_is_signaled_exactly_once() {
        let mut sched = scheduler("1000 :z");
        let mut judge = HitJudge::new(HitWindow::new());

        sched.advance(5200.0, &mut judge);
        assert_eq!(sched.last_event_time(), 200);
        assert!(!sched.check_end(5200.0));
        assert!(sched.check_end(5200.5));
        assert!(!sched.check_end(6000.0));
    }

    #[test]
    fn empty_chart_ends_after_grace() {
        let mut sched = scheduler("");
        let mut judge = HitJudge::new(HitWindow::new());
        sched.advance(0.0, &mut judge);
        assert!(!sched.check_end(5000.0));
        assert!(sched.check_end(5001.0));
    }

    #[test]
    fn no_end_before_every_event_fired() {
        let mut sched = scheduler("1000 :z");
        assert!(!sched.check_end(100_000.0));
    }

    #[test]
    fn reset_replays_from_the_top() {
        let mut sched = scheduler("100 :z\n900 :z");
        let mut judge = HitJudge::new(HitWindow::new());
        sched.advance(500.0, &mut judge);
        assert_eq!(judge.outstanding(), 2);

        sched.reset(&mut judge);
        assert_eq!(judge.outstanding(), 0);
        assert!(!sched.is_started());
        assert_eq!(sched.remaining(), 2);
        assert_eq!(sched.advance(100.0, &mut judge).len(), 2);
    }
}
