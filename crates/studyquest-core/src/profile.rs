//! Per-user progression profile.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::xp::level_for_xp;

/// One row per user, mutated by the XP, streak and badge engines.
///
/// `total_xp` only moves upward through this engine. The level is always
/// derived from `total_xp` via [`level_for_xp`], never stored, so the
/// two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionProfile {
    pub user_ref: String,
    pub total_xp: u64,
    pub lifetime_xp: u64,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub last_active_date: Option<NaiveDate>,
    pub total_active_days: u32,
    /// Cumulative tasks completed through this engine (badge metric).
    pub tasks_completed: u64,
    /// Best single-exam accuracy seen so far, 0-100 (badge metric).
    pub best_exam_accuracy: f64,
    pub has_goal: bool,
    pub has_exam: bool,
}

impl ProgressionProfile {
    pub fn new(user_ref: impl Into<String>) -> Self {
        Self {
            user_ref: user_ref.into(),
            total_xp: 0,
            lifetime_xp: 0,
            current_streak_days: 0,
            longest_streak_days: 0,
            last_active_date: None,
            total_active_days: 0,
            tasks_completed: 0,
            best_exam_accuracy: 0.0,
            has_goal: false,
            has_exam: false,
        }
    }

    /// Current level, derived: `floor(sqrt(total_xp / 100)) + 1`.
    pub fn level(&self) -> u32 {
        level_for_xp(self.total_xp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_derived_from_total_xp() {
        let mut p = ProgressionProfile::new("user-1");
        assert_eq!(p.level(), 1);
        p.total_xp = 400;
        assert_eq!(p.level(), 3);
    }
}
