//! Built-in badge catalog.
//!
//! Ships as reference data; deployments can replace it with their own
//! definitions loaded from storage.

use super::{BadgeDefinition, BadgeLevel, FirstOccurrenceKind, UnlockCondition};

fn levels(rungs: &[(u32, u32, u64)]) -> Vec<BadgeLevel> {
    rungs
        .iter()
        .map(|&(level, threshold, xp_reward)| BadgeLevel {
            level,
            threshold,
            xp_reward,
        })
        .collect()
}

/// The default badge set.
pub fn default_catalog() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition {
            id: "first-steps".into(),
            name: "First Steps".into(),
            condition: UnlockCondition::FirstOccurrence {
                kind: FirstOccurrenceKind::TimerSession,
            },
            levels: vec![],
            xp_reward: 50,
        },
        BadgeDefinition {
            id: "goal-setter".into(),
            name: "Goal Setter".into(),
            condition: UnlockCondition::FirstOccurrence {
                kind: FirstOccurrenceKind::Goal,
            },
            levels: vec![],
            xp_reward: 25,
        },
        BadgeDefinition {
            id: "exam-rookie".into(),
            name: "Exam Rookie".into(),
            condition: UnlockCondition::FirstOccurrence {
                kind: FirstOccurrenceKind::Exam,
            },
            levels: vec![],
            xp_reward: 50,
        },
        BadgeDefinition {
            id: "streak-keeper".into(),
            name: "Streak Keeper".into(),
            condition: UnlockCondition::Streak { days: 0 },
            levels: levels(&[
                (1, 3, 50),
                (2, 7, 100),
                (3, 30, 300),
                (4, 100, 1000),
                (5, 365, 5000),
            ]),
            xp_reward: 0,
        },
        BadgeDefinition {
            id: "deep-diver".into(),
            name: "Deep Diver".into(),
            condition: UnlockCondition::TotalHours { hours: 0 },
            levels: levels(&[(1, 10, 100), (2, 50, 250), (3, 100, 500), (4, 500, 2000)]),
            xp_reward: 0,
        },
        BadgeDefinition {
            id: "task-master".into(),
            name: "Task Master".into(),
            condition: UnlockCondition::TasksCompleted { count: 0 },
            levels: levels(&[(1, 10, 50), (2, 50, 150), (3, 100, 500), (4, 500, 1500)]),
            xp_reward: 0,
        },
        BadgeDefinition {
            id: "sharpshooter".into(),
            name: "Sharpshooter".into(),
            condition: UnlockCondition::ExamAccuracy { pct: 90 },
            levels: vec![],
            xp_reward: 200,
        },
    ]
}
