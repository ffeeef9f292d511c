use chrono::NaiveDate;
use clap::Subcommand;
use studyquest_core::storage::{Config, Database};

use crate::common::print_json;

#[derive(Subcommand)]
pub enum HolidayAction {
    /// Mark a date as a holiday (streak freeze)
    Add {
        /// Date in YYYY-MM-DD form
        date: NaiveDate,
    },
    /// Unmark a holiday
    Remove {
        /// Date in YYYY-MM-DD form
        date: NaiveDate,
    },
    /// List registered holidays
    List,
}

pub fn run(action: HolidayAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();

    match action {
        HolidayAction::Add { date } => {
            db.add_holiday(&config.user_ref, date)?;
            print_json(&serde_json::json!({ "added": date.to_string() }))?;
        }
        HolidayAction::Remove { date } => {
            db.remove_holiday(&config.user_ref, date)?;
            print_json(&serde_json::json!({ "removed": date.to_string() }))?;
        }
        HolidayAction::List => {
            let days = db.list_holidays(&config.user_ref)?;
            print_json(&days)?;
        }
    }
    Ok(())
}
