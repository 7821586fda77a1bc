//! Per-chart leaderboard stored as an append-only CSV file.
//!
//! One line per finished session:
//! `timestamp_ms,accuracy_percent,max_combo,grade,FC` (the last field is
//! empty without a full combo).

use crate::models::stats::{Grade, SessionResult};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub const LEADERBOARD_FILE: &str = "leaderboard.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub timestamp_ms: u64,
    pub accuracy_percent: f64,
    pub max_combo: u32,
    pub grade: Grade,
    pub full_combo: bool,
}

impl LeaderboardEntry {
    /// Entry for a finished session. `None` if it was never graded.
    pub fn from_result(result: &SessionResult, timestamp_ms: u64) -> Option<Self> {
        Some(Self {
            timestamp_ms,
            accuracy_percent: result.accuracy_percent()?,
            max_combo: result.stats.max_combo,
            grade: result.grade,
            full_combo: result.full_combo,
        })
    }

    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{:.3},{},{},{}",
            self.timestamp_ms,
            self.accuracy_percent,
            self.max_combo,
            self.grade,
            if self.full_combo { "FC" } else { "" }
        )
    }

    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.trim_end_matches('\r').split(',');
        let entry = Self {
            timestamp_ms: fields.next()?.parse().ok()?,
            accuracy_percent: fields.next()?.parse().ok()?,
            max_combo: fields.next()?.parse().ok()?,
            grade: fields.next()?.parse().ok()?,
            full_combo: fields.next()? == "FC",
        };
        fields.next().is_none().then_some(entry)
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Appends a session to the leaderboard. Ungraded sessions are not written.
///
/// Returns whether a line was written.
pub fn record_result(path: &Path, result: &SessionResult) -> io::Result<bool> {
    let Some(entry) = LeaderboardEntry::from_result(result, now_ms()) else {
        log::info!("LEADERBOARD: ungraded session not recorded");
        return Ok(false);
    };
    append_entry(path, &entry)?;
    Ok(true)
}

pub fn append_entry(path: &Path, entry: &LeaderboardEntry) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", entry.to_csv_line())
}

/// Reads a leaderboard, best entries first (grade, then accuracy).
///
/// A missing file is an empty leaderboard; malformed lines are skipped.
pub fn read_leaderboard(path: &Path) -> io::Result<Vec<LeaderboardEntry>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut entries: Vec<_> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let entry = LeaderboardEntry::parse_line(line);
            if entry.is_none() {
                log::warn!("LEADERBOARD: skipping malformed line {:?}", line);
            }
            entry
        })
        .collect();

    entries.sort_by(|a, b| {
        b.grade
            .cmp(&a.grade)
            .then_with(|| b.accuracy_percent.total_cmp(&a.accuracy_percent))
    });
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stats::{ScoreWeights, Stats};

    fn entry(accuracy_percent: f64, grade: Grade) -> LeaderboardEntry {
        LeaderboardEntry {
            timestamp_ms: 1_700_000_000_000,
            accuracy_percent,
            max_combo: 12,
            grade,
            full_combo: false,
        }
    }

    #[test]
    fn csv_line_format() {
        let mut e = entry(66.66666, Grade::C);
        assert_eq!(e.to_csv_line(), "1700000000000,66.667,12,C,");
        e.full_combo = true;
        assert_eq!(e.to_csv_line(), "1700000000000,66.667,12,C,FC");
        assert!(LeaderboardEntry::parse_line("1,66.667,12,C,FC").unwrap().full_combo);
    }

    #[test]
    fn malformed_lines_do_not_parse() {
        assert!(LeaderboardEntry::parse_line("").is_none());
        assert!(LeaderboardEntry::parse_line("1,2,3,Q,").is_none());
        assert!(LeaderboardEntry::parse_line("1,2,3,A").is_none());
        assert!(LeaderboardEntry::parse_line("1,2,3,A,,x").is_none());
    }

    #[test]
    fn ungraded_result_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEADERBOARD_FILE);
        let result = SessionResult::from_stats(Stats::new(), &ScoreWeights::new());

        assert!(!record_result(&path, &result).unwrap());
        assert!(!path.exists());
        assert!(read_leaderboard(&path).unwrap().is_empty());
    }

    #[test]
    fn sorted_by_grade_then_accuracy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEADERBOARD_FILE);

        for e in [
            entry(80.0, Grade::B),
            entry(95.0, Grade::A),
            entry(85.0, Grade::A),
            entry(70.0, Grade::C),
        ] {
            append_entry(&path, &e).unwrap();
        }
        let mut raw = fs::read_to_string(&path).unwrap();
        raw.push_str("garbage line\n");
        fs::write(&path, raw).unwrap();

        let board = read_leaderboard(&path).unwrap();
        let order: Vec<_> = board.iter().map(|e| (e.grade, e.accuracy_percent)).collect();
        assert_eq!(
            order,
            [(Grade::A, 95.0), (Grade::A, 85.0), (Grade::B, 80.0), (Grade::C, 70.0)]
        );
    }

    #[test]
    fn recorded_result_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEADERBOARD_FILE);
        let stats = Stats {
            perfect: 4,
            max_combo: 4,
            ..Stats::new()
        };
        let result = SessionResult::from_stats(stats, &ScoreWeights::new());

        assert!(record_result(&path, &result).unwrap());
        let board = read_leaderboard(&path).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].grade, Grade::X);
        assert!(board[0].full_combo);
        assert_eq!(board[0].accuracy_percent, 100.0);
    }
}
