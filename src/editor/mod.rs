//! Chart editor model.
//!
//! Holds the chart being edited together with its metadata, an undo/redo
//! history of single-event edits, and the navigation rules used to move the
//! playback position around the timeline.

pub mod snap;

use crate::database::charts::{self, ChartError};
use crate::models::chart::serialize_chart;
use crate::models::event::MuseEvent;
use crate::models::event_store::OrderedEventStore;
use crate::models::metadata::ChartMetadata;
use self::snap::{Direction, SnapGrid, snap_to};
use std::path::Path;

/// How far behind the position hit rings stay visible.
pub const RING_TRAIL_MS: i64 = 500;

/// One reversible edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Added(MuseEvent),
    /// `index` is the event's position among those sharing its timestamp.
    Removed { event: MuseEvent, index: usize },
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    store: OrderedEventStore,
    metadata: ChartMetadata,
    activation_ms: i64,

    history: Vec<Edit>,
    history_pos: usize,
    saved: bool,
    input_enabled: bool,
}

impl EditorSession {
    pub fn new(store: OrderedEventStore, metadata: ChartMetadata, activation_ms: i64) -> Self {
        log::info!(
            "EDITOR: opened {:?} ({} events)",
            metadata.title,
            store.len()
        );
        Self {
            store,
            metadata,
            activation_ms,
            history: Vec::new(),
            history_pos: 0,
            saved: true,
            input_enabled: true,
        }
    }

    pub fn store(&self) -> &OrderedEventStore {
        &self.store
    }

    pub fn metadata(&self) -> &ChartMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: ChartMetadata) {
        self.metadata = metadata;
        self.saved = false;
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Key input is turned off while a modal dialog is open.
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    // --- Editing ---

    /// Adds a note for `key` at the position, or removes it if one is
    /// already there. Returns the edit made, if input is enabled.
    pub fn toggle_note(&mut self, key: char, position_ms: f64) -> Option<Edit> {
        if !self.input_enabled {
            return None;
        }

        let event = MuseEvent::note(position_ms.round() as i64, key);
        let edit = match self.store.remove_indexed(event.timestamp_ms, &event.kind) {
            Some((index, event)) => Edit::Removed { event, index },
            None => {
                self.store.insert(event.clone());
                Edit::Added(event)
            }
        };

        self.saved = false;
        self.push_history(edit.clone());
        Some(edit)
    }

    pub fn add_event(&mut self, event: MuseEvent) {
        self.store.insert(event.clone());
        self.saved = false;
        self.push_history(Edit::Added(event));
    }

    /// Deletes an event by time and kind. Returns false if it wasn't there.
    pub fn delete_event(&mut self, time_ms: i64, kind: &str) -> bool {
        let Some((index, event)) = self.store.remove_indexed(time_ms, kind) else {
            return false;
        };
        self.saved = false;
        self.push_history(Edit::Removed { event, index });
        true
    }

    fn push_history(&mut self, edit: Edit) {
        if self.history_pos > 0 && self.history[self.history_pos - 1] == edit {
            return;
        }
        self.history.truncate(self.history_pos);
        self.history.push(edit);
        self.history_pos = self.history.len();
    }

    pub fn undo(&mut self) -> bool {
        if self.history_pos == 0 {
            return false;
        }
        self.history_pos -= 1;
        let edit = self.history[self.history_pos].clone();
        match edit {
            Edit::Added(event) => self.unapply_add(&event),
            Edit::Removed { event, index } => self.store.insert_at(event, index),
        }
        self.saved = false;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(edit) = self.history.get(self.history_pos).cloned() else {
            return false;
        };
        self.history_pos += 1;
        match edit {
            Edit::Added(event) => self.store.insert(event),
            Edit::Removed { event, .. } => self.unapply_add(&event),
        }
        self.saved = false;
        true
    }

    fn unapply_add(&mut self, event: &MuseEvent) {
        self.store.remove(event.timestamp_ms, &event.kind);
    }

    pub fn can_undo(&self) -> bool {
        self.history_pos > 0
    }

    pub fn can_redo(&self) -> bool {
        self.history_pos < self.history.len()
    }

    /// The chart as it would be written on save.
    pub fn chart_text(&self) -> String {
        serialize_chart(&self.store)
    }

    /// Writes `chart.txt` and `metadata.json` into `folder`.
    pub fn save(&mut self, folder: &Path) -> Result<(), ChartError> {
        charts::write_chart_file(&folder.join(charts::CHART_FILE), &self.store)?;
        charts::write_metadata(&folder.join(charts::METADATA_FILE), &self.metadata)?;
        self.saved = true;
        log::info!("EDITOR: saved {:?}", folder);
        Ok(())
    }

    // --- Navigation ---

    fn first_event_ms(&self) -> Option<f64> {
        self.store.first_time().map(|t| t as f64)
    }

    /// Snap grid anchored at the first event.
    pub fn snap_grid(&self) -> Option<SnapGrid> {
        SnapGrid::from_timing(self.metadata.bpm, self.metadata.snaps, self.first_event_ms())
    }

    /// Wheel navigation: one snap per notch, one beat with `coarse`.
    ///
    /// An empty chart anchors the grid at 0.
    pub fn scroll(&self, position_ms: f64, direction: Direction, coarse: bool) -> f64 {
        let origin = Some(self.first_event_ms().unwrap_or(0.0));
        let grid = if coarse {
            SnapGrid::beat_grid(self.metadata.bpm, origin)
        } else {
            SnapGrid::from_timing(self.metadata.bpm, self.metadata.snaps, origin)
        };
        snap_to(position_ms, direction, grid.as_ref()).max(0.0)
    }

    /// Back one snap; at or before the first event, jump to the start.
    pub fn shift_left(&self, position_ms: f64) -> f64 {
        let (Some(first), Some(grid)) = (self.first_event_ms(), self.snap_grid()) else {
            return position_ms;
        };
        if position_ms <= first {
            return 0.0;
        }
        snap_to(position_ms, Direction::Backward, Some(&grid))
    }

    /// Forward one snap; before the first event, jump to it.
    pub fn shift_right(&self, position_ms: f64) -> f64 {
        let (Some(first), Some(grid)) = (self.first_event_ms(), self.snap_grid()) else {
            return position_ms;
        };
        if position_ms < first {
            return first;
        }
        snap_to(position_ms, Direction::Forward, Some(&grid))
    }

    /// One-millisecond nudge.
    pub fn nudge(&self, position_ms: f64, direction: Direction) -> f64 {
        match direction {
            Direction::Forward => position_ms + 1.0,
            Direction::Backward => (position_ms - 1.0).max(0.0),
        }
    }

    // --- Display helpers ---

    /// Hit times of `key` notes with a ring on screen around the position.
    pub fn visible_notes(&self, key: char, position_ms: f64) -> Vec<i64> {
        let pos = position_ms.round() as i64;
        self.store
            .range(pos - RING_TRAIL_MS..pos + self.activation_ms)
            .filter(|e| e.note_key() == Some(key))
            .map(|e| e.timestamp_ms)
            .collect()
    }

    /// Time of the next note at or after the position, for the hitsound.
    pub fn next_note_time(&self, position_ms: f64) -> Option<i64> {
        let pos = position_ms.ceil() as i64;
        self.store
            .range(pos..)
            .find(|e| e.is_note())
            .map(|e| e.timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chart::load_chart;

    fn editor(chart: &str, bpm: Option<f64>, snaps: u32) -> EditorSession {
        let metadata = ChartMetadata {
            bpm,
            snaps,
            ..ChartMetadata::new("id", "song", "mp3")
        };
        EditorSession::new(load_chart(chart).unwrap(), metadata, 800)
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut ed = editor("", None, 0);
        assert_eq!(ed.toggle_note('z', 1000.4), Some(Edit::Added(MuseEvent::note(1000, 'z'))));
        assert!(!ed.is_saved());
        assert_eq!(ed.chart_text(), "1000 :z");

        assert!(matches!(ed.toggle_note('z', 999.6), Some(Edit::Removed { .. })));
        assert!(ed.store().is_empty());
    }

    #[test]
    fn toggle_only_touches_its_own_key() {
        let mut ed = editor("1000 flash\n1000 :x", None, 0);
        ed.toggle_note('z', 1000.0);
        assert_eq!(ed.store().len(), 3);
        ed.toggle_note('x', 1000.0);
        assert_eq!(ed.chart_text(), "1000 flash\n1000 :z");
    }

    #[test]
    fn toggle_is_ignored_while_modal_open() {
        let mut ed = editor("", None, 0);
        ed.set_input_enabled(false);
        assert!(ed.toggle_note('z', 10.0).is_none());
        assert!(ed.store().is_empty());
        assert!(ed.is_saved());
    }

    #[test]
    fn undo_redo_walks_history() {
        let mut ed = editor("", None, 0);
        ed.toggle_note('a', 100.0);
        ed.toggle_note('b', 200.0);
        assert!(ed.delete_event(100, ":a"));
        assert_eq!(ed.chart_text(), "200 :b");

        assert!(ed.undo());
        assert_eq!(ed.chart_text(), "100 :a\n200 :b");
        assert!(ed.undo());
        assert!(ed.undo());
        assert!(!ed.undo());
        assert!(ed.store().is_empty());

        assert!(ed.redo());
        assert!(ed.redo());
        assert_eq!(ed.chart_text(), "100 :a\n200 :b");
        assert!(ed.can_redo());
    }

    #[test]
    fn undo_delete_restores_order_within_timestamp() {
        let mut ed = editor("1000 flash\n1000 :x", None, 0);
        assert!(ed.delete_event(1000, "flash"));
        assert!(ed.undo());
        assert_eq!(ed.chart_text(), "1000 flash\n1000 :x");

        let edit = ed.toggle_note('x', 1000.0);
        let expected = Edit::Removed {
            event: MuseEvent::note(1000, 'x'),
            index: 1,
        };
        assert_eq!(edit, Some(expected));
        assert!(ed.undo());
        assert_eq!(ed.chart_text(), "1000 flash\n1000 :x");
    }

    #[test]
    fn new_edit_truncates_redo_tail() {
        let mut ed = editor("", None, 0);
        ed.toggle_note('a', 100.0);
        ed.toggle_note('b', 200.0);
        ed.undo();
        ed.toggle_note('c', 300.0);
        assert!(!ed.can_redo());
        assert!(!ed.redo());
        assert_eq!(ed.chart_text(), "100 :a\n300 :c");
    }

    #[test]
    fn repeated_identical_edit_is_recorded_once() {
        let mut ed = editor("", None, 0);
        ed.add_event(MuseEvent::new(50, "flash"));
        ed.add_event(MuseEvent::new(50, "flash"));
        assert_eq!(ed.store().len(), 2);

        ed.undo();
        assert_eq!(ed.store().len(), 1);
        assert!(!ed.can_undo());
    }

    #[test]
    fn failed_delete_leaves_history_alone() {
        let mut ed = editor("100 :a", None, 0);
        assert!(!ed.delete_event(100, ":b"));
        assert!(!ed.can_undo());
        assert!(ed.is_saved());
    }

    #[test]
    fn shift_keys_follow_first_event() {
        let ed = editor("1000 :a\n3000 :b", Some(120.0), 1);

        assert_eq!(ed.shift_right(10.0), 1000.0);
        assert_eq!(ed.shift_right(1000.0), 1250.0);
        assert_eq!(ed.shift_left(1000.0), 0.0);
        assert_eq!(ed.shift_left(1300.0), 1250.0);
    }

    #[test]
    fn navigation_without_timing_stays_put() {
        let ed = editor("1000 :a", None, 1);
        assert_eq!(ed.shift_right(10.0), 10.0);
        assert_eq!(ed.scroll(10.0, Direction::Forward, false), 10.0);

        let empty = editor("", Some(120.0), 0);
        assert_eq!(empty.shift_left(700.0), 700.0);
        assert_eq!(empty.scroll(700.0, Direction::Forward, false), 1000.0);
    }

    #[test]
    fn scroll_by_snap_or_beat() {
        let ed = editor("100 :a", Some(120.0), 3);
        assert_eq!(ed.scroll(100.0, Direction::Forward, false), 225.0);
        assert_eq!(ed.scroll(100.0, Direction::Forward, true), 600.0);
        assert_eq!(ed.scroll(100.0, Direction::Backward, false), 0.0);
        assert_eq!(ed.nudge(0.0, Direction::Backward), 0.0);
        assert_eq!(ed.nudge(10.0, Direction::Forward), 11.0);
    }

    #[test]
    fn visible_notes_window() {
        let ed = editor("400 :z\n600 :z\n1000 :x\n1700 :z\n1800 :z", None, 0);
        assert_eq!(ed.visible_notes('z', 1000.0), [600, 1700]);
        assert_eq!(ed.next_note_time(1000.0), Some(1000));
        assert_eq!(ed.next_note_time(1000.5), Some(1700));
        assert_eq!(ed.next_note_time(2000.0), None);
    }

    #[test]
    fn save_writes_chart_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut ed = editor("", Some(100.0), 0);
        ed.toggle_note('k', 250.0);
        ed.save(dir.path()).unwrap();

        assert!(ed.is_saved());
        let (store, meta) = charts::read_chart_folder(dir.path()).unwrap();
        assert_eq!(serialize_chart(&store), "250 :k");
        assert_eq!(meta, *ed.metadata());
    }
}
