use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;
use crate::xp::XpBreakdown;

/// What earned a batch of XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    Task,
    TimerSession,
    Badge,
}

/// Every state change in the engine produces an Event.
///
/// Events are transient signals for the UI layer; the engine never
/// persists them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        subject_ref: String,
        phase: Phase,
        interval_mode: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Timer stopped. `recorded` is false when the interval was under the
    /// minimum session duration and silently dropped.
    TimerStopped {
        subject_ref: String,
        duration_secs: u64,
        recorded: bool,
        at: DateTime<Utc>,
    },
    PhaseAdvanced {
        phase: Phase,
        cycle: u32,
        target_secs: u64,
        running: bool,
        at: DateTime<Utc>,
    },
    XpGained {
        source: XpSource,
        breakdown: XpBreakdown,
        total_xp: u64,
        at: DateTime<Utc>,
    },
    LevelUp {
        from_level: u32,
        to_level: u32,
        at: DateTime<Utc>,
    },
    StreakExtended {
        current_days: u32,
        longest_days: u32,
        at: DateTime<Utc>,
    },
    /// Streak reached one of the milestone values (7, 30, 100, 365).
    StreakMilestone {
        days: u32,
        at: DateTime<Utc>,
    },
    StreakBroken {
        previous_days: u32,
        at: DateTime<Utc>,
    },
    BadgeUnlocked {
        badge_id: String,
        level: u32,
        xp_awarded: u64,
        at: DateTime<Utc>,
    },
}
