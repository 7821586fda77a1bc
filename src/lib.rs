//! Core of the muse rhythm game: chart format, gameplay timing and scoring,
//! the chart editor model and on-disk chart folders.

pub mod database;
pub mod editor;
pub mod logic;
pub mod models;
pub mod system;
