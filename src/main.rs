//! Command line front end for chart folders and simulated play sessions.

use clap::{Parser, Subcommand};
use muse::database::charts::{self, ChartEntry};
use muse::database::leaderboard::{self, LEADERBOARD_FILE};
use muse::logic::{GameSession, SessionConfig};
use muse::models::Settings;
use muse::models::event_store::OrderedEventStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Tick interval of the simulated clock, matching a 200 Hz logic loop.
const TICK_MS: f64 = 5.0;

#[derive(Parser)]
#[command(name = "muse", about = "Inspect charts and simulate play sessions")]
struct Args {
    /// Settings file (TOML)
    #[arg(long, default_value = "settings.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List charts in song-select order with their best score
    List { charts_dir: PathBuf },
    /// Validate a chart file and summarise its contents
    Check { chart: PathBuf },
    /// Play a chart with scripted key presses and print the result
    Autoplay {
        chart: PathBuf,

        /// Timing error applied to every other press, alternating early/late
        #[arg(long, default_value = "0")]
        jitter_ms: f64,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::load_or_default(&args.settings);

    let outcome = match args.command {
        Command::List { charts_dir } => list(&charts_dir),
        Command::Check { chart } => check(&chart),
        Command::Autoplay { chart, jitter_ms } => autoplay(&chart, jitter_ms, &settings),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("MAIN: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn list(charts_dir: &Path) -> Result<(), String> {
    let charts = charts::load_all_charts(charts_dir).map_err(|e| e.to_string())?;

    for ChartEntry { folder, metadata } in &charts {
        let best = leaderboard::read_leaderboard(&folder.join(LEADERBOARD_FILE))
            .map_err(|e| e.to_string())?
            .into_iter()
            .next();
        let best = best.map_or_else(
            || "-".to_string(),
            |e| format!("{} {:.3}%{}", e.grade, e.accuracy_percent, if e.full_combo { " FC" } else { "" }),
        );
        println!(
            "{:<6} {:<10} {:<40} {}",
            metadata.difficulty.badge(),
            metadata.id,
            metadata.title,
            best
        );
    }

    Ok(())
}

fn check(chart: &Path) -> Result<(), String> {
    let store = charts::read_chart_file(chart).map_err(|e| e.to_string())?;

    let mut per_key: BTreeMap<char, usize> = BTreeMap::new();
    let mut tags = 0;
    for event in store.iter() {
        match event.note_key() {
            Some(key) => *per_key.entry(key).or_default() += 1,
            None => tags += 1,
        }
    }

    println!("events: {}", store.len());
    println!("tags:   {}", tags);
    for (key, count) in &per_key {
        println!("  {key}: {count}");
    }
    if let (Some(first), Some(last)) = (store.first_time(), store.last_time()) {
        println!("span:   {first} ms .. {last} ms");
    }

    Ok(())
}

fn autoplay(chart: &Path, jitter_ms: f64, settings: &Settings) -> Result<(), String> {
    let store = charts::read_chart_file(chart).map_err(|e| e.to_string())?;
    let presses = scripted_presses(&store, jitter_ms);

    // Scripted presses are already in chart time.
    let config = SessionConfig {
        offset_ms: 0.0,
        ..SessionConfig::from_settings(settings)
    };
    let mut session = GameSession::new(&store, config);

    let mut presses = presses.into_iter().peekable();
    let mut pos = 0.0;
    let result = loop {
        while let Some((at, key)) = presses.next_if(|(at, _)| *at <= pos) {
            session.key_down(key, at);
        }
        if let Some(result) = session.tick(pos).result {
            break result;
        }
        pos += TICK_MS;
    };

    let stats = result.stats;
    println!(
        "perfect {}  good {}  miss {}  max combo {}",
        stats.perfect, stats.good, stats.miss, stats.max_combo
    );
    match result.accuracy_percent() {
        Some(acc) => println!(
            "accuracy {:.3}%  grade {}{}  mean delta {:+.1} ms",
            acc,
            result.grade,
            if result.full_combo { " FC" } else { "" },
            stats.mean_delta_ms
        ),
        None => println!("no notes judged"),
    }

    Ok(())
}

/// One press per note at its hit time, every other one shifted by
/// `jitter_ms` (late, then early).
fn scripted_presses(store: &OrderedEventStore, jitter_ms: f64) -> Vec<(f64, char)> {
    let mut presses: Vec<(f64, char)> = store
        .iter()
        .filter_map(|e| e.note_key().map(|key| (e.timestamp_ms as f64, key)))
        .enumerate()
        .map(|(i, (at, key))| {
            let jitter = match i % 4 {
                1 => jitter_ms,
                3 => -jitter_ms,
                _ => 0.0,
            };
            ((at + jitter).max(0.0), key)
        })
        .collect();
    presses.sort_by(|a, b| a.0.total_cmp(&b.0));
    presses
}
