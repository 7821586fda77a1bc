//! Chart folders on disk.
//!
//! Each chart lives in its own folder under the charts root, named
//! `"<id> <title>"`, holding `chart.txt`, `metadata.json` and the audio and
//! image assets referenced by the metadata.

use crate::models::chart::{ParseError, load_chart, serialize_chart};
use crate::models::event_store::OrderedEventStore;
use crate::models::metadata::{ChartMetadata, compare_charts};
use rand::Rng;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CHART_FILE: &str = "chart.txt";
pub const METADATA_FILE: &str = "metadata.json";

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";
const ID_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid chart: {0}")]
    Parse(#[from] ParseError),
    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// A chart found under the charts root.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartEntry {
    pub folder: PathBuf,
    pub metadata: ChartMetadata,
}

/// Folder name for a chart, with path-unsafe title characters replaced.
pub fn chart_folder_name(id: &str, title: &str) -> String {
    let title: String = title
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{id} {title}").trim().to_string()
}

/// Random chart id.
pub fn new_chart_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect()
}

pub fn read_chart_file(path: &Path) -> Result<OrderedEventStore, ChartError> {
    let text = fs::read_to_string(path)?;
    Ok(load_chart(&text)?)
}

pub fn write_chart_file(path: &Path, store: &OrderedEventStore) -> Result<(), ChartError> {
    fs::write(path, serialize_chart(store))?;
    Ok(())
}

pub fn read_metadata(path: &Path) -> Result<ChartMetadata, ChartError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn write_metadata(path: &Path, metadata: &ChartMetadata) -> Result<(), ChartError> {
    fs::write(path, serde_json::to_string_pretty(metadata)?)?;
    Ok(())
}

/// Reads both files of a chart folder.
pub fn read_chart_folder(folder: &Path) -> Result<(OrderedEventStore, ChartMetadata), ChartError> {
    let store = read_chart_file(&folder.join(CHART_FILE))?;
    let metadata = read_metadata(&folder.join(METADATA_FILE))?;
    Ok((store, metadata))
}

/// Creates the folder of a new, empty chart under `root`.
pub fn create_chart(root: &Path, title: &str, audio_ext: &str) -> Result<ChartEntry, ChartError> {
    let metadata = ChartMetadata::new(new_chart_id(), title, audio_ext);
    let folder = root.join(chart_folder_name(&metadata.id, title));

    fs::create_dir_all(&folder)?;
    write_chart_file(&folder.join(CHART_FILE), &OrderedEventStore::new())?;
    write_metadata(&folder.join(METADATA_FILE), &metadata)?;
    log::info!("CHARTS: created {:?}", folder);

    Ok(ChartEntry { folder, metadata })
}

/// Lists every chart folder under `root` in song-select order.
///
/// Folders without readable metadata are skipped.
pub fn load_all_charts(root: &Path) -> io::Result<Vec<ChartEntry>> {
    if !root.exists() {
        log::warn!("CHARTS: {:?} does not exist", root);
        return Ok(Vec::new());
    }

    let mut charts = Vec::new();
    for entry in fs::read_dir(root)? {
        let folder = entry?.path();
        if !folder.is_dir() {
            continue;
        }

        match read_metadata(&folder.join(METADATA_FILE)) {
            Ok(metadata) => charts.push(ChartEntry { folder, metadata }),
            Err(e) => log::warn!("CHARTS: skipping {:?}: {}", folder, e),
        }
    }

    charts.sort_by(|a, b| compare_charts(&a.metadata, &b.metadata));
    log::info!("CHARTS: found {} charts in {:?}", charts.len(), root);
    Ok(charts)
}
