//! Experience point calculator.
//!
//! Pure functions that turn task and session attributes into an
//! [`XpBreakdown`]. The breakdown is always returned whole (never a bare
//! scalar) so every bonus can be inspected, displayed, and tested
//! component by component.

use serde::{Deserialize, Serialize};

/// Duration bonus cap: 1 XP per minute, at most 120.
pub const MAX_DURATION_BONUS: u32 = 120;

/// Streak bonus: 5% of base per consecutive day, capped at 100% (day 20+).
pub const STREAK_BONUS_PER_DAY: f64 = 0.05;

/// Kind of study task, used to look up the default base XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Reading,
    Lecture,
    Revision,
    Practice,
    Exam,
}

impl TaskKind {
    /// Default base XP for this kind.
    pub fn default_base_xp(&self) -> u32 {
        match self {
            TaskKind::Reading => 40,
            TaskKind::Lecture => 40,
            TaskKind::Revision => 50,
            TaskKind::Practice => 60,
            TaskKind::Exam => 80,
        }
    }

    pub fn is_exam(&self) -> bool {
        matches!(self, TaskKind::Exam)
    }
}

/// Attributes of a completed task relevant to scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub kind: TaskKind,
    /// Explicit base XP set on the task; wins over the kind default.
    pub base_xp_override: Option<u32>,
    pub duration_minutes: u32,
    /// Score achieved, 0-100, only meaningful for exam kinds.
    pub accuracy_percent: Option<f64>,
}

/// Per-component XP breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpBreakdown {
    pub base_xp: u32,
    pub duration_bonus: u32,
    pub streak_bonus: u32,
    pub accuracy_bonus: u32,
    pub total: u32,
}

/// Compute the XP breakdown for a completed task.
pub fn for_task(task: &TaskCompletion, current_streak_days: u32) -> XpBreakdown {
    let base_xp = task
        .base_xp_override
        .unwrap_or_else(|| task.kind.default_base_xp());
    let duration_bonus = task.duration_minutes.min(MAX_DURATION_BONUS);
    let streak_bonus = streak_bonus(base_xp, current_streak_days);
    let accuracy_bonus = if task.kind.is_exam() {
        task.accuracy_percent.map(accuracy_tier).unwrap_or(0)
    } else {
        0
    };
    let total = base_xp + duration_bonus + streak_bonus + accuracy_bonus;
    XpBreakdown {
        base_xp,
        duration_bonus,
        streak_bonus,
        accuracy_bonus,
        total,
    }
}

/// Compute the XP breakdown for a finished focus session.
///
/// Sessions shorter than one minute never reach this function; the timer
/// engine drops them at `stop()`.
pub fn for_timer_session(duration_secs: u64, current_streak_days: u32) -> XpBreakdown {
    let base_xp = ((duration_secs as f64) / 60.0).round() as u32;
    let streak = streak_bonus(base_xp, current_streak_days);
    XpBreakdown {
        base_xp,
        duration_bonus: 0,
        streak_bonus: streak,
        accuracy_bonus: 0,
        total: base_xp + streak,
    }
}

/// Streak multiplier bonus: `round(base * min(days * 0.05, 1.0))`.
fn streak_bonus(base_xp: u32, current_streak_days: u32) -> u32 {
    let multiplier = (current_streak_days as f64 * STREAK_BONUS_PER_DAY).min(1.0);
    (base_xp as f64 * multiplier).round() as u32
}

/// Four-tier step function over exam accuracy. Not continuous.
fn accuracy_tier(accuracy_percent: f64) -> u32 {
    if accuracy_percent >= 90.0 {
        100
    } else if accuracy_percent >= 75.0 {
        60
    } else if accuracy_percent >= 50.0 {
        30
    } else {
        10
    }
}

/// Level derived from total XP: `floor(sqrt(total_xp / 100)) + 1`.
///
/// Always recomputed, never stored, so it cannot drift from `total_xp`.
pub fn level_for_xp(total_xp: u64) -> u32 {
    (total_xp as f64 / 100.0).sqrt().floor() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(kind: TaskKind) -> TaskCompletion {
        TaskCompletion {
            kind,
            base_xp_override: None,
            duration_minutes: 0,
            accuracy_percent: None,
        }
    }

    #[test]
    fn streak_bonus_step_function() {
        // Zero streak: no bonus.
        let b = for_task(&task(TaskKind::Practice), 0);
        assert_eq!(b.streak_bonus, 0);
        // Day 20: multiplier capped at 1.0, bonus equals base exactly.
        let b = for_task(&task(TaskKind::Practice), 20);
        assert_eq!(b.streak_bonus, b.base_xp);
        // Day 40 is identical to day 20.
        let b40 = for_task(&task(TaskKind::Practice), 40);
        assert_eq!(b40.streak_bonus, b.streak_bonus);
    }

    #[test]
    fn duration_bonus_caps_at_120() {
        let mut t = task(TaskKind::Reading);
        t.duration_minutes = 45;
        assert_eq!(for_task(&t, 0).duration_bonus, 45);
        t.duration_minutes = 300;
        assert_eq!(for_task(&t, 0).duration_bonus, 120);
    }

    #[test]
    fn base_xp_override_wins() {
        let mut t = task(TaskKind::Reading);
        t.base_xp_override = Some(75);
        assert_eq!(for_task(&t, 0).base_xp, 75);
        t.base_xp_override = None;
        assert_eq!(for_task(&t, 0).base_xp, 40);
    }

    #[test]
    fn exam_accuracy_tiers() {
        let expect = [(49.0, 10), (50.0, 30), (74.0, 30), (75.0, 60), (89.0, 60), (90.0, 100)];
        for (pct, bonus) in expect {
            let mut t = task(TaskKind::Exam);
            t.accuracy_percent = Some(pct);
            assert_eq!(for_task(&t, 0).accuracy_bonus, bonus, "accuracy {pct}");
        }
    }

    #[test]
    fn exam_without_accuracy_gets_no_bonus() {
        let t = task(TaskKind::Exam);
        assert_eq!(for_task(&t, 0).accuracy_bonus, 0);
    }

    #[test]
    fn non_exam_ignores_accuracy() {
        let mut t = task(TaskKind::Practice);
        t.accuracy_percent = Some(95.0);
        assert_eq!(for_task(&t, 0).accuracy_bonus, 0);
    }

    #[test]
    fn practice_task_end_to_end() {
        // streak 10 -> 50% multiplier on base 60.
        let mut t = task(TaskKind::Practice);
        t.duration_minutes = 45;
        let b = for_task(&t, 10);
        assert_eq!(b.base_xp, 60);
        assert_eq!(b.duration_bonus, 45);
        assert_eq!(b.streak_bonus, 30);
        assert_eq!(b.accuracy_bonus, 0);
        assert_eq!(b.total, 135);
    }

    #[test]
    fn timer_session_xp() {
        // 25 minutes, no streak: 25 XP flat.
        let b = for_timer_session(25 * 60, 0);
        assert_eq!(b.base_xp, 25);
        assert_eq!(b.total, 25);
        // With streak 10: 50% bonus.
        let b = for_timer_session(25 * 60, 10);
        assert_eq!(b.streak_bonus, 13); // round(25 * 0.5)
        assert_eq!(b.total, 38);
    }

    #[test]
    fn level_curve() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(399), 2);
        assert_eq!(level_for_xp(400), 3);
        assert_eq!(level_for_xp(10_000), 11);
    }
}
