use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use studyquest_core::storage::{Config, Database};
use studyquest_core::{Event, Progression, TaskCompletion, TaskKind, XpBreakdown};

use crate::common::print_json;

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Reading,
    Lecture,
    Revision,
    Practice,
    Exam,
}

impl From<KindArg> for TaskKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Reading => TaskKind::Reading,
            KindArg::Lecture => TaskKind::Lecture,
            KindArg::Revision => TaskKind::Revision,
            KindArg::Practice => TaskKind::Practice,
            KindArg::Exam => TaskKind::Exam,
        }
    }
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Mark a task complete and award XP
    Complete {
        /// Task kind
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Explicit base XP override
        #[arg(long)]
        base_xp: Option<u32>,
        /// Time spent in minutes
        #[arg(long, default_value = "0")]
        duration_min: u32,
        /// Exam accuracy percentage (0-100)
        #[arg(long)]
        accuracy: Option<f64>,
    },
    /// Record that the first goal was created (badge metric)
    GoalCreated,
}

#[derive(Serialize)]
struct CompletionView {
    breakdown: XpBreakdown,
    events: Vec<Event>,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let progression = Progression::new(&db).with_policy(config.streak);

    match action {
        TaskAction::Complete {
            kind,
            base_xp,
            duration_min,
            accuracy,
        } => {
            let task = TaskCompletion {
                kind: kind.into(),
                base_xp_override: base_xp,
                duration_minutes: duration_min,
                accuracy_percent: accuracy,
            };
            let (breakdown, events) = progression.mark_task_complete(&config.user_ref, &task)?;
            print_json(&CompletionView { breakdown, events })?;
        }
        TaskAction::GoalCreated => {
            let events = progression.record_goal_created(&config.user_ref)?;
            print_json(&events)?;
        }
    }
    Ok(())
}
