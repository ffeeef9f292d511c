//! Daily streak continuity.
//!
//! Two independent operations: [`record_active_day`] extends the streak
//! when a day's activity satisfies the configured policy (idempotent per
//! calendar day), and [`check_continuity`] breaks it when days were
//! missed -- unless every missed day was marked a holiday, which freezes
//! the streak instead of breaking it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::profile::ProgressionProfile;

/// Streak milestone values surfaced as notification signals.
pub const STREAK_MILESTONES: [u32; 4] = [7, 30, 100, 365];

/// How the per-day conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakMode {
    /// Any single condition qualifies the day.
    Any,
    /// Minutes and task conditions must both hold.
    All,
}

/// Continuity policy; malformed or missing config falls back to these
/// serde defaults rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreakPolicy {
    #[serde(default = "default_min_minutes")]
    pub min_minutes: u32,
    #[serde(default = "default_min_tasks")]
    pub min_tasks: u32,
    #[serde(default)]
    pub require_all_scheduled_tasks: bool,
    #[serde(default = "default_mode")]
    pub mode: StreakMode,
}

fn default_min_minutes() -> u32 {
    25
}
fn default_min_tasks() -> u32 {
    1
}
fn default_mode() -> StreakMode {
    StreakMode::Any
}

impl Default for StreakPolicy {
    fn default() -> Self {
        Self {
            min_minutes: default_min_minutes(),
            min_tasks: default_min_tasks(),
            require_all_scheduled_tasks: false,
            mode: StreakMode::Any,
        }
    }
}

/// Activity counters for a single calendar day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DayMetrics {
    pub study_minutes: u32,
    pub tasks_completed: u32,
    pub tasks_scheduled: u32,
}

/// Outcome of [`record_active_day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// The day's activity did not satisfy the policy; nothing changed.
    NotQualified,
    /// Already counted today (idempotent re-invocation).
    AlreadyCounted,
    Extended {
        current_days: u32,
        longest_days: u32,
        milestone: Option<u32>,
    },
}

/// Outcome of [`check_continuity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ContinuityOutcome {
    /// No streak yet, or no gap to examine.
    Intact,
    /// Days were missed but every one was a holiday; streak preserved.
    Frozen { missed_days: u32 },
    Broken { previous_days: u32 },
}

/// Whether a day's metrics satisfy the policy.
pub fn day_qualifies(metrics: &DayMetrics, policy: &StreakPolicy) -> bool {
    let all_tasks_done =
        metrics.tasks_scheduled > 0 && metrics.tasks_completed >= metrics.tasks_scheduled;
    match policy.mode {
        StreakMode::All => {
            let base = metrics.study_minutes >= policy.min_minutes
                && metrics.tasks_completed >= policy.min_tasks;
            if policy.require_all_scheduled_tasks {
                base && all_tasks_done
            } else {
                base
            }
        }
        StreakMode::Any => {
            metrics.study_minutes >= policy.min_minutes
                || metrics.tasks_completed >= policy.min_tasks
                || all_tasks_done
        }
    }
}

/// Mark `today` active if the policy is satisfied.
///
/// Idempotent: a day already counted is a no-op. A non-qualifying day
/// changes nothing (breaking is [`check_continuity`]'s job).
pub fn record_active_day(
    profile: &mut ProgressionProfile,
    metrics: &DayMetrics,
    policy: &StreakPolicy,
    today: NaiveDate,
) -> StreakUpdate {
    if !day_qualifies(metrics, policy) {
        return StreakUpdate::NotQualified;
    }
    if profile.last_active_date == Some(today) {
        return StreakUpdate::AlreadyCounted;
    }
    profile.current_streak_days += 1;
    profile.longest_streak_days = profile.longest_streak_days.max(profile.current_streak_days);
    profile.last_active_date = Some(today);
    profile.total_active_days += 1;

    let milestone = STREAK_MILESTONES
        .iter()
        .copied()
        .find(|m| *m == profile.current_streak_days);
    StreakUpdate::Extended {
        current_days: profile.current_streak_days,
        longest_days: profile.longest_streak_days,
        milestone,
    }
}

/// Evaluate whether the streak survived the gap since the last active
/// day. Holidays freeze the streak: a gap is forgiven only when every
/// missed date in it is marked as a holiday.
pub fn check_continuity(
    profile: &mut ProgressionProfile,
    today: NaiveDate,
    is_holiday: impl Fn(NaiveDate) -> bool,
) -> ContinuityOutcome {
    let Some(last_active) = profile.last_active_date else {
        // New user; streak not started yet.
        return ContinuityOutcome::Intact;
    };
    let gap_days = (today - last_active).num_days();
    if gap_days <= 1 {
        return ContinuityOutcome::Intact;
    }

    let mut missed = 0u32;
    let mut day = last_active;
    loop {
        day = match day.succ_opt() {
            Some(d) if d < today => d,
            _ => break,
        };
        if !is_holiday(day) {
            let previous = profile.current_streak_days;
            profile.current_streak_days = 0;
            log::debug!(
                "streak of {previous} broken for '{}': {day} was missed and is not a holiday",
                profile.user_ref
            );
            return ContinuityOutcome::Broken {
                previous_days: previous,
            };
        }
        missed += 1;
    }
    ContinuityOutcome::Frozen {
        missed_days: missed,
    }
}
