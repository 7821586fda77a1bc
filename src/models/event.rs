//! Timestamped chart events.

use std::fmt;

/// Prefixes marking an event kind as a playable note.
pub const NOTE_PREFIXES: [char; 2] = [':', '.'];

/// A single event of a chart.
///
/// In a chart file or in the editor store, `timestamp_ms` is the time written
/// in the file and `hit_time_ms` is `None`. In the activation-ordered
/// sequence driven by a game session, note events carry their true hit time
/// in `hit_time_ms` and `timestamp_ms` is the (earlier) activation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MuseEvent {
    pub timestamp_ms: i64,
    pub kind: String,
    pub hit_time_ms: Option<i64>,
}

impl MuseEvent {
    /// Creates a chart event with no hit time.
    pub fn new(timestamp_ms: i64, kind: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            kind: kind.into(),
            hit_time_ms: None,
        }
    }

    /// Creates a note event for `key` at `timestamp_ms`.
    pub fn note(timestamp_ms: i64, key: char) -> Self {
        Self::new(timestamp_ms, format!(":{key}"))
    }

    /// Returns the activation-shifted copy of a note event.
    ///
    /// The activation time never goes below zero.
    pub fn activated(&self, activation_ms: i64) -> Self {
        Self {
            timestamp_ms: (self.timestamp_ms - activation_ms).max(0),
            kind: self.kind.clone(),
            hit_time_ms: Some(self.timestamp_ms),
        }
    }

    /// Returns true if the kind starts with a note prefix.
    pub fn is_note(&self) -> bool {
        self.kind.starts_with(NOTE_PREFIXES)
    }

    /// The input key a note event is bound to.
    ///
    /// `None` for non-note kinds and for a bare prefix.
    pub fn note_key(&self) -> Option<char> {
        let mut chars = self.kind.strip_prefix(NOTE_PREFIXES)?.chars();
        chars.next()
    }
}

impl fmt::Display for MuseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.timestamp_ms, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_key_reads_char_after_prefix() {
        assert_eq!(MuseEvent::new(0, ":z").note_key(), Some('z'));
        assert_eq!(MuseEvent::new(0, ".k").note_key(), Some('k'));
        assert_eq!(MuseEvent::new(0, "flash").note_key(), None);
        assert_eq!(MuseEvent::new(0, ":").note_key(), None);
    }

    #[test]
    fn activation_is_clamped_to_zero() {
        let early = MuseEvent::note(300, 'a').activated(800);
        assert_eq!(early.timestamp_ms, 0);
        assert_eq!(early.hit_time_ms, Some(300));

        let late = MuseEvent::note(1000, 'a').activated(800);
        assert_eq!(late.timestamp_ms, 200);
        assert!(late.timestamp_ms <= late.hit_time_ms.unwrap());
    }
}
