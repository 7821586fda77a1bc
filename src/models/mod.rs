pub mod chart;
pub mod event;
pub mod event_store;
pub mod hit_window;
pub mod metadata;
pub mod settings;
pub mod stats;

pub use chart::{ParseError, load_chart, serialize_chart};
pub use event::MuseEvent;
pub use event_store::OrderedEventStore;
pub use hit_window::HitWindow;
pub use metadata::{ChartMetadata, Difficulty};
pub use settings::Settings;
pub use stats::{Grade, Judgement, ScoreWeights, SessionResult, Stats};
