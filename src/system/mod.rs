pub mod emitter;

pub use emitter::{EventEmitter, ListenerId};
