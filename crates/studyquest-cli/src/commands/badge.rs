use clap::Subcommand;
use serde::Serialize;
use studyquest_core::badges::{default_catalog, UnlockCondition};
use studyquest_core::storage::{Config, Database};
use studyquest_core::Progression;

use crate::common::print_json;

#[derive(Subcommand)]
pub enum BadgeAction {
    /// List the badge catalog with current progress
    List,
}

#[derive(Serialize)]
struct BadgeView {
    id: String,
    name: String,
    condition: UnlockCondition,
    held_level: u32,
    max_level: u32,
    current_value: f64,
    next_threshold: Option<u32>,
}

pub fn run(action: BadgeAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();

    match action {
        BadgeAction::List => {
            let metrics = Progression::new(&db).progress_metrics(&config.user_ref)?;
            let held = db.badge_levels(&config.user_ref)?;

            let views: Vec<BadgeView> = default_catalog()
                .into_iter()
                .map(|def| {
                    let held_level = held.get(&def.id).copied().unwrap_or(0);
                    let max_level = if def.is_multi_level() {
                        def.levels.iter().map(|l| l.level).max().unwrap_or(1)
                    } else {
                        1
                    };
                    let next_threshold = if def.is_multi_level() {
                        def.levels
                            .iter()
                            .filter(|l| l.level > held_level)
                            .map(|l| l.threshold)
                            .min()
                    } else if held_level == 0 {
                        Some(def.condition.single_level_threshold() as u32)
                    } else {
                        None
                    };
                    BadgeView {
                        current_value: def.condition.metric_value(&metrics),
                        id: def.id,
                        name: def.name,
                        condition: def.condition,
                        held_level,
                        max_level,
                        next_threshold,
                    }
                })
                .collect();
            print_json(&views)?;
        }
    }
    Ok(())
}
