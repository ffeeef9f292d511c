//! Badge definitions and the unlock evaluation pass.
//!
//! Badge definitions are read-only reference data. After any XP-earning
//! event the whole catalog is re-evaluated against a consistent metrics
//! snapshot (taken before any XP mutation in the pass, so one badge's
//! reward never inflates the metrics another badge in the same pass
//! sees). Definitions are independent; evaluation order does not affect
//! correctness.

mod catalog;

pub use catalog::default_catalog;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::profile::ProgressionProfile;

/// Boolean "first time this ever happened" conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstOccurrenceKind {
    Goal,
    TimerSession,
    Exam,
}

/// Closed set of unlock condition kinds, each with its threshold field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnlockCondition {
    Streak { days: u32 },
    TotalHours { hours: u32 },
    TasksCompleted { count: u32 },
    ExamAccuracy { pct: u32 },
    FirstOccurrence { kind: FirstOccurrenceKind },
}

/// Cumulative metrics a badge condition can dispatch on.
///
/// One snapshot is collected per evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    pub streak_days: u32,
    pub total_focus_hours: f64,
    pub tasks_completed: u64,
    pub best_exam_accuracy: f64,
    pub has_goal: bool,
    pub has_timer_session: bool,
    pub has_exam: bool,
}

impl ProgressMetrics {
    /// Snapshot from a profile plus the focus-time aggregate.
    pub fn from_profile(profile: &ProgressionProfile, total_focus_secs: u64, has_timer_session: bool) -> Self {
        Self {
            streak_days: profile.current_streak_days,
            total_focus_hours: total_focus_secs as f64 / 3600.0,
            tasks_completed: profile.tasks_completed,
            best_exam_accuracy: profile.best_exam_accuracy,
            has_goal: profile.has_goal,
            has_timer_session,
            has_exam: profile.has_exam,
        }
    }
}

impl UnlockCondition {
    /// Current value of the metric this condition watches.
    pub fn metric_value(&self, metrics: &ProgressMetrics) -> f64 {
        match self {
            UnlockCondition::Streak { .. } => metrics.streak_days as f64,
            UnlockCondition::TotalHours { .. } => metrics.total_focus_hours,
            UnlockCondition::TasksCompleted { .. } => metrics.tasks_completed as f64,
            UnlockCondition::ExamAccuracy { .. } => metrics.best_exam_accuracy,
            UnlockCondition::FirstOccurrence { kind } => {
                let hit = match kind {
                    FirstOccurrenceKind::Goal => metrics.has_goal,
                    FirstOccurrenceKind::TimerSession => metrics.has_timer_session,
                    FirstOccurrenceKind::Exam => metrics.has_exam,
                };
                if hit {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Threshold for single-level badges, taken from the condition's own
    /// numeric field; boolean first-occurrence conditions default to 1.
    pub fn single_level_threshold(&self) -> f64 {
        match self {
            UnlockCondition::Streak { days } => *days as f64,
            UnlockCondition::TotalHours { hours } => *hours as f64,
            UnlockCondition::TasksCompleted { count } => *count as f64,
            UnlockCondition::ExamAccuracy { pct } => *pct as f64,
            UnlockCondition::FirstOccurrence { .. } => 1.0,
        }
    }
}

/// One rung of a multi-level badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeLevel {
    pub level: u32,
    pub threshold: u32,
    pub xp_reward: u64,
}

/// Read-only badge reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: String,
    pub name: String,
    pub condition: UnlockCondition,
    /// Rungs for multi-level badges; empty for single-level badges.
    #[serde(default)]
    pub levels: Vec<BadgeLevel>,
    /// Flat reward for single-level badges (ignored when `levels` is
    /// non-empty).
    #[serde(default)]
    pub xp_reward: u64,
}

impl BadgeDefinition {
    pub fn is_multi_level(&self) -> bool {
        !self.levels.is_empty()
    }
}

/// A newly reached badge level produced by an evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub badge_id: String,
    pub from_level: u32,
    pub to_level: u32,
    /// Cumulative reward for every rung between `from_level` (exclusive)
    /// and `to_level` (inclusive); a jump over two rungs pays both.
    pub xp_awarded: u64,
}

/// Evaluate every definition against one consistent metrics snapshot.
///
/// `current_levels` maps badge id to the user's held level (absent means
/// never awarded). Returns the awards to apply; a level only ever
/// increases, and single-level badges already held are skipped.
pub fn evaluate(
    definitions: &[BadgeDefinition],
    metrics: &ProgressMetrics,
    current_levels: &HashMap<String, u32>,
) -> Vec<BadgeAward> {
    let mut awards = Vec::new();
    for def in definitions {
        let current = current_levels.get(&def.id).copied().unwrap_or(0);
        let award = if def.is_multi_level() {
            evaluate_multi_level(def, metrics, current)
        } else {
            evaluate_single_level(def, metrics, current)
        };
        if let Some(award) = award {
            awards.push(award);
        }
    }
    awards
}

fn evaluate_multi_level(
    def: &BadgeDefinition,
    metrics: &ProgressMetrics,
    current: u32,
) -> Option<BadgeAward> {
    let value = def.condition.metric_value(metrics);
    let mut levels = def.levels.clone();
    levels.sort_by_key(|l| l.threshold);

    let qualified = levels
        .iter()
        .filter(|l| (l.threshold as f64) <= value)
        .map(|l| l.level)
        .max()
        .unwrap_or(0);
    if qualified <= current {
        return None;
    }
    let cumulative = |up_to: u32| -> u64 {
        levels
            .iter()
            .filter(|l| l.level <= up_to)
            .map(|l| l.xp_reward)
            .sum()
    };
    Some(BadgeAward {
        badge_id: def.id.clone(),
        from_level: current,
        to_level: qualified,
        xp_awarded: cumulative(qualified) - cumulative(current),
    })
}

fn evaluate_single_level(
    def: &BadgeDefinition,
    metrics: &ProgressMetrics,
    current: u32,
) -> Option<BadgeAward> {
    // Single-level badges are non-repeatable.
    if current > 0 {
        return None;
    }
    let value = def.condition.metric_value(metrics);
    if value < def.condition.single_level_threshold() {
        return None;
    }
    Some(BadgeAward {
        badge_id: def.id.clone(),
        from_level: 0,
        to_level: 1,
        xp_awarded: def.xp_reward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi_def() -> BadgeDefinition {
        BadgeDefinition {
            id: "task-master".into(),
            name: "Task Master".into(),
            condition: UnlockCondition::TasksCompleted { count: 0 },
            levels: vec![
                BadgeLevel { level: 1, threshold: 10, xp_reward: 50 },
                BadgeLevel { level: 2, threshold: 50, xp_reward: 150 },
                BadgeLevel { level: 3, threshold: 100, xp_reward: 500 },
            ],
            xp_reward: 0,
        }
    }

    fn metrics_with_tasks(n: u64) -> ProgressMetrics {
        ProgressMetrics {
            tasks_completed: n,
            ..ProgressMetrics::default()
        }
    }

    #[test]
    fn jump_over_two_levels_pays_both_rewards() {
        // 5 -> 60 tasks crosses level 1 and 2 thresholds in one pass.
        let defs = [multi_def()];
        let mut held = HashMap::new();
        let awards = evaluate(&defs, &metrics_with_tasks(60), &held);
        assert_eq!(awards.len(), 1);
        assert_eq!(awards[0].to_level, 2);
        assert_eq!(awards[0].xp_awarded, 200); // 50 + 150

        // Re-evaluation at the same metric awards nothing.
        held.insert("task-master".into(), 2);
        assert!(evaluate(&defs, &metrics_with_tasks(60), &held).is_empty());
    }

    #[test]
    fn partial_level_up_pays_only_new_rungs() {
        let defs = [multi_def()];
        let mut held = HashMap::new();
        held.insert("task-master".into(), 1);
        let awards = evaluate(&defs, &metrics_with_tasks(120), &held);
        assert_eq!(awards[0].from_level, 1);
        assert_eq!(awards[0].to_level, 3);
        assert_eq!(awards[0].xp_awarded, 650); // 150 + 500
    }

    #[test]
    fn below_first_threshold_awards_nothing() {
        let defs = [multi_def()];
        assert!(evaluate(&defs, &metrics_with_tasks(5), &HashMap::new()).is_empty());
    }

    #[test]
    fn single_level_awards_once() {
        let def = BadgeDefinition {
            id: "first-steps".into(),
            name: "First Steps".into(),
            condition: UnlockCondition::FirstOccurrence {
                kind: FirstOccurrenceKind::TimerSession,
            },
            levels: vec![],
            xp_reward: 50,
        };
        let metrics = ProgressMetrics {
            has_timer_session: true,
            ..ProgressMetrics::default()
        };
        let defs = [def];
        let mut held = HashMap::new();
        let awards = evaluate(&defs, &metrics, &held);
        assert_eq!(awards.len(), 1);
        assert_eq!(awards[0].xp_awarded, 50);

        held.insert("first-steps".into(), 1);
        assert!(evaluate(&defs, &metrics, &held).is_empty());
    }

    #[test]
    fn single_level_numeric_threshold() {
        let def = BadgeDefinition {
            id: "sharpshooter".into(),
            name: "Sharpshooter".into(),
            condition: UnlockCondition::ExamAccuracy { pct: 90 },
            levels: vec![],
            xp_reward: 200,
        };
        let defs = [def];
        let low = ProgressMetrics {
            best_exam_accuracy: 89.5,
            ..ProgressMetrics::default()
        };
        assert!(evaluate(&defs, &low, &HashMap::new()).is_empty());
        let high = ProgressMetrics {
            best_exam_accuracy: 92.0,
            ..ProgressMetrics::default()
        };
        assert_eq!(evaluate(&defs, &high, &HashMap::new()).len(), 1);
    }

    #[test]
    fn streak_condition_reads_streak_metric() {
        let def = BadgeDefinition {
            id: "streak-keeper".into(),
            name: "Streak Keeper".into(),
            condition: UnlockCondition::Streak { days: 0 },
            levels: vec![
                BadgeLevel { level: 1, threshold: 3, xp_reward: 50 },
                BadgeLevel { level: 2, threshold: 7, xp_reward: 100 },
            ],
            xp_reward: 0,
        };
        let metrics = ProgressMetrics {
            streak_days: 7,
            ..ProgressMetrics::default()
        };
        let awards = evaluate(&[def], &metrics, &HashMap::new());
        assert_eq!(awards[0].to_level, 2);
        assert_eq!(awards[0].xp_awarded, 150);
    }
}
