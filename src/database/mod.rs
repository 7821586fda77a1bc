pub mod charts;
pub mod leaderboard;

pub use charts::{ChartEntry, ChartError, load_all_charts, read_chart_folder};
pub use leaderboard::{LeaderboardEntry, read_leaderboard, record_result};
