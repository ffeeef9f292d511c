mod engine;
mod interval;

pub use engine::{TimerEngine, TimerSnapshot, TimerStatus, MAX_SESSION_SECS, MIN_SESSION_SECS};
pub use interval::{IntervalConfig, Phase, RawInterval};
