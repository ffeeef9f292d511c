//! # StudyQuest Core Library
//!
//! Core business logic for the StudyQuest timer and progression engine.
//! All operations are available through this library; the CLI binary is
//! a thin layer over it, and any GUI is expected to be the same.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-based state machine with an injected
//!   clock -- no ticking thread, elapsed time is recomputed on demand and
//!   the snapshot is persisted on every transition
//! - **Session Splitter**: turns raw intervals into calendar-day-bounded
//!   records
//! - **Progression**: XP calculation, daily streak continuity with
//!   holiday freezing, and multi-level badge unlocks
//! - **Storage**: SQLite-based session/profile/badge persistence and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`Progression`]: the XP/streak/badge pipeline
//! - [`Database`]: persistence
//! - [`Config`]: application configuration

pub mod badges;
pub mod clock;
pub mod error;
pub mod events;
pub mod profile;
pub mod progression;
pub mod session;
pub mod storage;
pub mod streak;
pub mod timer;
pub mod xp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, TimerError, ValidationError};
pub use events::{Event, XpSource};
pub use profile::ProgressionProfile;
pub use progression::Progression;
pub use session::{split_interval, SessionRecord};
pub use storage::{Config, Database, Stats};
pub use streak::{ContinuityOutcome, DayMetrics, StreakMode, StreakPolicy};
pub use timer::{
    IntervalConfig, Phase, RawInterval, TimerEngine, TimerSnapshot, TimerStatus, MAX_SESSION_SECS,
    MIN_SESSION_SECS,
};
pub use xp::{level_for_xp, TaskCompletion, TaskKind, XpBreakdown};
