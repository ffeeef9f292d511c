use chrono::{Local, Utc};
use clap::Subcommand;
use serde::Serialize;
use studyquest_core::storage::{Config, Database};
use studyquest_core::{Event, Progression, SystemClock, TimerEngine, TimerSnapshot};

use crate::common::print_json;

const SNAPSHOT_KEY: &str = "timer_snapshot";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus timer for a subject
    Start {
        /// Subject or task identifier being timed
        subject: String,
        /// Use interval (pomodoro) cycling from config
        #[arg(long)]
        interval: bool,
        /// Discard an already-active timer instead of failing
        #[arg(long)]
        discard_active: bool,
    },
    /// Pause the running timer
    Pause,
    /// Resume a paused timer
    Resume,
    /// Stop the timer, persist the session and award XP
    Stop,
    /// Advance between focus and break phases (interval mode)
    Advance,
    /// Reset to idle, discarding in-flight time
    Reset,
    /// Print current timer state as JSON
    Status,
}

#[derive(Serialize)]
struct TimerStatusView<'a> {
    snapshot: &'a TimerSnapshot,
    elapsed_secs: u64,
    target_secs: Option<u64>,
}

fn load_engine(db: &Database) -> TimerEngine<SystemClock> {
    if let Ok(Some(json)) = db.kv_get(SNAPSHOT_KEY) {
        match serde_json::from_str::<TimerSnapshot>(&json) {
            Ok(snapshot) => return TimerEngine::from_snapshot(snapshot, SystemClock),
            Err(e) => log::warn!("discarding unreadable timer snapshot: {e}"),
        }
    }
    TimerEngine::new(SystemClock)
}

fn save_engine(
    db: &Database,
    engine: &TimerEngine<SystemClock>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(engine.snapshot())?;
    db.kv_set(SNAPSHOT_KEY, &json)?;
    Ok(())
}

fn print_status(engine: &TimerEngine<SystemClock>) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&TimerStatusView {
        snapshot: engine.snapshot(),
        elapsed_secs: engine.elapsed_secs(),
        target_secs: engine.interval_target_secs(),
    })
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let mut engine = load_engine(&db);

    match action {
        TimerAction::Start {
            subject,
            interval,
            discard_active,
        } => {
            let interval_config = interval.then_some(config.pomodoro);
            let event = engine.start(&subject, interval_config, discard_active)?;
            save_engine(&db, &engine)?;
            print_json(&event)?;
        }
        TimerAction::Pause => {
            if let Some(event) = engine.pause() {
                save_engine(&db, &engine)?;
                print_json(&event)?;
            } else {
                print_status(&engine)?;
            }
        }
        TimerAction::Resume => {
            if let Some(event) = engine.resume() {
                save_engine(&db, &engine)?;
                print_json(&event)?;
            } else {
                print_status(&engine)?;
            }
        }
        TimerAction::Stop => {
            let interval = engine.stop();
            save_engine(&db, &engine)?;
            match interval {
                Some(interval) => {
                    let mut events = vec![Event::TimerStopped {
                        subject_ref: interval.subject_ref.clone(),
                        duration_secs: interval.duration_secs(),
                        recorded: true,
                        at: Utc::now(),
                    }];
                    let progression = Progression::new(&db).with_policy(config.streak);
                    events.extend(progression.record_focus_session(
                        &config.user_ref,
                        &interval,
                        &Local,
                    )?);
                    print_json(&events)?;
                }
                // Idle stop, or an interval under the minimum session
                // duration; nothing was recorded either way.
                None => println!("{{\"type\": \"timer_stopped\", \"recorded\": false}}"),
            }
        }
        TimerAction::Advance => {
            if let Some(event) = engine.advance_phase() {
                save_engine(&db, &engine)?;
                print_json(&event)?;
            } else {
                print_status(&engine)?;
            }
        }
        TimerAction::Reset => {
            engine.reset();
            save_engine(&db, &engine)?;
            println!("{{\"type\": \"timer_reset\"}}");
        }
        TimerAction::Status => print_status(&engine)?,
    }
    Ok(())
}
