//! Gameplay core: scheduling chart events against the playback clock,
//! judging key presses and keeping score.

pub mod engine;
pub mod judge;
pub mod scheduler;
pub mod score;

pub use engine::{GameSession, SessionConfig, Stage, TickReport};
pub use judge::{HitJudge, Judged, MissedNote};
pub use scheduler::EventScheduler;
pub use score::{Delta, ScoreAggregator};
