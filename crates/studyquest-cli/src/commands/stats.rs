use clap::Subcommand;
use serde::Serialize;
use studyquest_core::storage::{Config, Database};
use studyquest_core::{level_for_xp, ProgressionProfile};

use crate::common::{print_json, today};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Show session totals
    Show,
    /// Show the progression profile
    Profile,
}

#[derive(Serialize)]
struct ProfileView {
    #[serde(flatten)]
    profile: ProgressionProfile,
    level: u32,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();

    match action {
        StatsAction::Show => {
            let stats = db.stats(&config.user_ref, today())?;
            print_json(&stats)?;
        }
        StatsAction::Profile => {
            let profile = db.ensure_profile(&config.user_ref)?;
            let level = level_for_xp(profile.total_xp);
            print_json(&ProfileView { profile, level })?;
        }
    }
    Ok(())
}
