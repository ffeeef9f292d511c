use clap::Subcommand;
use serde::Serialize;
use studyquest_core::storage::{Config, Database};
use studyquest_core::{ContinuityOutcome, Event, Progression};

use crate::common::{print_json, today};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Record today's activity against the streak policy
    Record {
        /// Tasks completed today
        #[arg(long, default_value = "0")]
        tasks_done: u32,
        /// Tasks scheduled for today
        #[arg(long, default_value = "0")]
        tasks_scheduled: u32,
    },
    /// Check continuity since the last active day
    Check,
}

#[derive(Serialize)]
struct RecordView {
    current_streak_days: u32,
    longest_streak_days: u32,
    events: Vec<Event>,
}

#[derive(Serialize)]
struct CheckView {
    #[serde(flatten)]
    outcome: ContinuityOutcome,
    events: Vec<Event>,
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let progression = Progression::new(&db).with_policy(config.streak);

    match action {
        StreakAction::Record {
            tasks_done,
            tasks_scheduled,
        } => {
            let metrics =
                progression.day_metrics(&config.user_ref, today(), tasks_done, tasks_scheduled)?;
            let events = progression.record_active_day(&config.user_ref, &metrics, today())?;
            let profile = db.ensure_profile(&config.user_ref)?;
            print_json(&RecordView {
                current_streak_days: profile.current_streak_days,
                longest_streak_days: profile.longest_streak_days,
                events,
            })?;
        }
        StreakAction::Check => {
            let (outcome, events) = progression.check_continuity(&config.user_ref, today())?;
            print_json(&CheckView { outcome, events })?;
        }
    }
    Ok(())
}
