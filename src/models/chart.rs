//! Chart text format.
//!
//! A chart is plain text with one `"<ms> <kind>"` record per line. Kinds
//! starting with `:` or `.` are notes for the character after the prefix;
//! anything else is a passthrough tag for presentation code.

use super::event::MuseEvent;
use super::event_store::OrderedEventStore;
use thiserror::Error;

/// Failure to read a chart record. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: invalid timestamp {token:?}")]
    InvalidTimestamp { line: usize, token: String },
    #[error("line {line}: expected `<ms> <kind>`, got {record:?}")]
    MalformedRecord { line: usize, record: String },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::InvalidTimestamp { line, .. } | ParseError::MalformedRecord { line, .. } => {
                *line
            }
        }
    }
}

/// Parses chart text into events, in file order.
pub fn parse_chart(text: &str) -> Result<Vec<MuseEvent>, ParseError> {
    let mut events = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let record = raw.trim();
        if record.is_empty() {
            continue;
        }
        events.push(parse_record(record, idx + 1)?);
    }

    Ok(events)
}

fn parse_record(record: &str, line: usize) -> Result<MuseEvent, ParseError> {
    let mut tokens = record.split(' ');
    let (Some(time), Some(kind), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(ParseError::MalformedRecord {
            line,
            record: record.to_string(),
        });
    };
    if kind.is_empty() {
        return Err(ParseError::MalformedRecord {
            line,
            record: record.to_string(),
        });
    }

    let timestamp_ms = time
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidTimestamp {
            line,
            token: time.to_string(),
        })?;

    Ok(MuseEvent::new(timestamp_ms, kind))
}

/// Parses chart text straight into an ordered store.
///
/// Nothing is returned on error; a chart either loads fully or not at all.
pub fn load_chart(text: &str) -> Result<OrderedEventStore, ParseError> {
    let events = parse_chart(text)?;
    log::debug!("CHART: parsed {} events", events.len());
    Ok(events.into_iter().collect())
}

/// Writes the store back to chart text, ascending.
pub fn serialize_chart(store: &OrderedEventStore) -> String {
    store
        .iter()
        .map(|event| event.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the activation-ordered sequence a game session plays through.
///
/// `events` must be ascending. Notes are shifted earlier by `activation_ms`
/// and carry their real hit time; other events are kept as they are.
pub fn session_events<'a, I>(events: I, activation_ms: i64) -> Vec<MuseEvent>
where
    I: IntoIterator<Item = &'a MuseEvent>,
{
    let mut notes = Vec::new();
    let mut others = Vec::new();

    for event in events {
        if event.is_note() {
            notes.push(event.activated(activation_ms));
        } else {
            others.push(event.clone());
        }
    }

    merge_events(others, notes)
}

/// Stable two-pointer merge of two ascending sequences.
///
/// On equal timestamps, elements of `a` come before elements of `b`.
pub fn merge_events(a: Vec<MuseEvent>, b: Vec<MuseEvent>) -> Vec<MuseEvent> {
    debug_assert!(a.is_sorted_by_key(|e| e.timestamp_ms));
    debug_assert!(b.is_sorted_by_key(|e| e.timestamp_ms));

    let mut merged = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();

    loop {
        let take_a = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => x.timestamp_ms <= y.timestamp_ms,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_a { a.next() } else { b.next() };
        merged.extend(next);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_records() {
        let events = parse_chart("100 :z\n250 flash\r\n250 .k\n").unwrap();
        assert_eq!(
            events,
            vec![
                MuseEvent::new(100, ":z"),
                MuseEvent::new(250, "flash"),
                MuseEvent::new(250, ".k"),
            ]
        );
    }

    #[test]
    fn empty_chart_has_no_events() {
        assert!(parse_chart("").unwrap().is_empty());
        assert!(parse_chart("  \n").unwrap().is_empty());
        assert!(load_chart("").unwrap().is_empty());
    }

    #[test]
    fn bad_timestamp_names_the_line() {
        let err = parse_chart("100 :z\nabc :x\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidTimestamp {
                line: 2,
                token: "abc".into()
            }
        );
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn wrong_token_count_is_malformed() {
        assert!(matches!(
            parse_chart("100"),
            Err(ParseError::MalformedRecord { line: 1, .. })
        ));
        assert!(matches!(
            parse_chart("0 :a\n100 :z extra"),
            Err(ParseError::MalformedRecord { line: 2, .. })
        ));
        assert!(matches!(
            parse_chart("100  :z"),
            Err(ParseError::MalformedRecord { line: 1, .. })
        ));
    }

    #[test]
    fn serialize_sorts_by_time() {
        let store = load_chart("900 :b\n100 :a\n100 cue").unwrap();
        assert_eq!(serialize_chart(&store), "100 :a\n100 cue\n900 :b");
    }

    #[test]
    fn session_events_shift_notes_and_keep_others() {
        let store = load_chart("0 intro\n500 :z\n1000 drop\n1800 :x").unwrap();
        let seq = session_events(store.iter(), 800);

        let expected = vec![
            MuseEvent::new(0, "intro"),
            MuseEvent {
                timestamp_ms: 0,
                kind: ":z".into(),
                hit_time_ms: Some(500),
            },
            MuseEvent::new(1000, "drop"),
            MuseEvent {
                timestamp_ms: 1000,
                kind: ":x".into(),
                hit_time_ms: Some(1800),
            },
        ];
        assert_eq!(seq, expected);
    }

    #[test]
    fn merge_prefers_first_sequence_on_ties() {
        let a = vec![MuseEvent::new(10, "a1"), MuseEvent::new(20, "a2")];
        let b = vec![MuseEvent::new(10, "b1"), MuseEvent::new(15, "b2")];
        let kinds: Vec<_> = merge_events(a, b).into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, ["a1", "b1", "b2", "a2"]);
    }

    fn arb_kind() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]".prop_map(|k| format!(":{k}")),
            "[a-z]".prop_map(|k| format!(".{k}")),
            "[a-z_]{1,8}",
        ]
    }

    fn arb_sorted(max: usize) -> impl Strategy<Value = Vec<MuseEvent>> {
        prop::collection::vec((0i64..5_000, arb_kind()), 0..max).prop_map(|mut raw| {
            raw.sort_by_key(|(t, _)| *t);
            raw.into_iter().map(|(t, k)| MuseEvent::new(t, k)).collect()
        })
    }

    proptest! {
        #[test]
        fn round_trip_is_lossless(events in arb_sorted(64)) {
            let text = events
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n");
            let store = load_chart(&text).unwrap();
            prop_assert_eq!(serialize_chart(&store), text.clone());
            prop_assert_eq!(parse_chart(&serialize_chart(&store)).unwrap(), events);
        }

        #[test]
        fn merge_is_sorted_and_keeps_every_event(a in arb_sorted(32), b in arb_sorted(32)) {
            let merged = merge_events(a.clone(), b.clone());
            prop_assert!(merged.is_sorted_by_key(|e| e.timestamp_ms));

            let mut expected: Vec<_> = a.into_iter().chain(b).map(|e| (e.timestamp_ms, e.kind)).collect();
            let mut actual: Vec<_> = merged.into_iter().map(|e| (e.timestamp_ms, e.kind)).collect();
            expected.sort();
            actual.sort();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn session_sequence_is_activation_ordered(events in arb_sorted(64), activation in 0i64..1_000) {
            let seq = session_events(events.iter(), activation);
            prop_assert_eq!(seq.len(), events.len());
            prop_assert!(seq.is_sorted_by_key(|e| e.timestamp_ms));
            for e in &seq {
                if let Some(hit) = e.hit_time_ms {
                    prop_assert!(e.timestamp_ms <= hit);
                    prop_assert_eq!(e.timestamp_ms, (hit - activation).max(0));
                }
            }
        }
    }
}
