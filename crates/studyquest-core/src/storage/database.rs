//! SQLite-backed persistence.
//!
//! Stores day-bounded session records, the per-user progression
//! profile, awarded badges, the user's holiday calendar, and a
//! key-value store used for the timer snapshot.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::DatabaseError;
use crate::profile::ProgressionProfile;
use crate::session::SessionRecord;
use crate::timer::Phase;

/// Aggregate session statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_focus_min: u64,
    pub total_break_min: u64,
    pub today_sessions: u64,
    pub today_focus_min: u64,
}

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/studyquest/studyquest.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?
            .join("studyquest.db");
        Self::open_at(path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: impl Into<std::path::PathBuf>) -> Result<Self, DatabaseError> {
        let path = path.into();
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests and simulations).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id               INTEGER PRIMARY KEY AUTOINCREMENT,
                    subject_ref      TEXT NOT NULL,
                    owner_ref        TEXT NOT NULL,
                    phase            TEXT NOT NULL,
                    interval_mode    INTEGER NOT NULL DEFAULT 0,
                    cycle            INTEGER NOT NULL DEFAULT 1,
                    paused_seconds   INTEGER NOT NULL DEFAULT 0,
                    duration_seconds INTEGER NOT NULL,
                    day              TEXT NOT NULL,
                    start_time       TEXT NOT NULL,
                    end_time         TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS profiles (
                    user_ref            TEXT PRIMARY KEY,
                    total_xp            INTEGER NOT NULL DEFAULT 0,
                    lifetime_xp         INTEGER NOT NULL DEFAULT 0,
                    current_streak_days INTEGER NOT NULL DEFAULT 0,
                    longest_streak_days INTEGER NOT NULL DEFAULT 0,
                    last_active_date    TEXT,
                    total_active_days   INTEGER NOT NULL DEFAULT 0,
                    tasks_completed     INTEGER NOT NULL DEFAULT 0,
                    best_exam_accuracy  REAL NOT NULL DEFAULT 0,
                    has_goal            INTEGER NOT NULL DEFAULT 0,
                    has_exam            INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS awarded_badges (
                    user_ref TEXT NOT NULL,
                    badge_id TEXT NOT NULL,
                    level    INTEGER NOT NULL,
                    PRIMARY KEY (user_ref, badge_id)
                );

                CREATE TABLE IF NOT EXISTS holidays (
                    user_ref TEXT NOT NULL,
                    day      TEXT NOT NULL,
                    PRIMARY KEY (user_ref, day)
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_owner_day ON sessions(owner_ref, day);
                CREATE INDEX IF NOT EXISTS idx_sessions_owner_phase ON sessions(owner_ref, phase);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Insert one day-bounded session record. Records are immutable.
    pub fn insert_session(&self, record: &SessionRecord) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (subject_ref, owner_ref, phase, interval_mode, cycle,
                                   paused_seconds, duration_seconds, day, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.subject_ref,
                record.owner_ref,
                record.phase.as_str(),
                record.interval_mode,
                record.cycle,
                record.paused_seconds,
                record.duration_secs(),
                record.day.to_string(),
                record.start_time.to_rfc3339(),
                record.end_time.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Net focus minutes recorded on a calendar day.
    pub fn focus_minutes_on(&self, owner_ref: &str, day: NaiveDate) -> Result<u64, DatabaseError> {
        let secs: u64 = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_seconds), 0) FROM sessions
             WHERE owner_ref = ?1 AND day = ?2 AND phase = 'focus'",
            params![owner_ref, day.to_string()],
            |row| row.get(0),
        )?;
        Ok(secs / 60)
    }

    /// Total net focus seconds across all time.
    pub fn total_focus_secs(&self, owner_ref: &str) -> Result<u64, DatabaseError> {
        let secs: u64 = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_seconds), 0) FROM sessions
             WHERE owner_ref = ?1 AND phase = 'focus'",
            params![owner_ref],
            |row| row.get(0),
        )?;
        Ok(secs)
    }

    pub fn has_any_session(&self, owner_ref: &str) -> Result<bool, DatabaseError> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE owner_ref = ?1",
            params![owner_ref],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Aggregate statistics; `today` is the caller's local date.
    pub fn stats(&self, owner_ref: &str, today: NaiveDate) -> Result<Stats, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT phase, COUNT(*), COALESCE(SUM(duration_seconds), 0)
             FROM sessions WHERE owner_ref = ?1
             GROUP BY phase",
        )?;
        let mut stats = Stats::default();
        let rows = stmt.query_map(params![owner_ref], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;
        for row in rows {
            let (phase, count, secs) = row?;
            stats.total_sessions += count;
            match phase.as_str() {
                "focus" => stats.total_focus_min += secs / 60,
                "break" => stats.total_break_min += secs / 60,
                _ => {}
            }
        }

        let (today_sessions, today_secs): (u64, u64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_seconds), 0)
             FROM sessions
             WHERE owner_ref = ?1 AND day = ?2 AND phase = 'focus'",
            params![owner_ref, today.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        stats.today_sessions = today_sessions;
        stats.today_focus_min = today_secs / 60;
        Ok(stats)
    }

    // ── Profiles ─────────────────────────────────────────────────────

    pub fn get_profile(&self, user_ref: &str) -> Result<Option<ProgressionProfile>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT user_ref, total_xp, lifetime_xp, current_streak_days, longest_streak_days,
                        last_active_date, total_active_days, tasks_completed, best_exam_accuracy,
                        has_goal, has_exam
                 FROM profiles WHERE user_ref = ?1",
                params![user_ref],
                |row| {
                    let last_active: Option<String> = row.get(5)?;
                    Ok(ProgressionProfile {
                        user_ref: row.get(0)?,
                        total_xp: row.get(1)?,
                        lifetime_xp: row.get(2)?,
                        current_streak_days: row.get(3)?,
                        longest_streak_days: row.get(4)?,
                        last_active_date: last_active.and_then(|s| s.parse().ok()),
                        total_active_days: row.get(6)?,
                        tasks_completed: row.get(7)?,
                        best_exam_accuracy: row.get(8)?,
                        has_goal: row.get(9)?,
                        has_exam: row.get(10)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Fetch the profile, creating an empty one on first touch.
    pub fn ensure_profile(&self, user_ref: &str) -> Result<ProgressionProfile, DatabaseError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO profiles (user_ref) VALUES (?1)",
            params![user_ref],
        )?;
        self.get_profile(user_ref)?
            .ok_or_else(|| DatabaseError::QueryFailed(format!("profile '{user_ref}' vanished")))
    }

    /// Atomically add XP to both running totals and return the new
    /// `total_xp`. A single SQL increment, so two near-simultaneous
    /// completions cannot lose an update.
    pub fn add_xp(&self, user_ref: &str, delta: u64) -> Result<u64, DatabaseError> {
        self.conn.execute(
            "UPDATE profiles SET total_xp = total_xp + ?2, lifetime_xp = lifetime_xp + ?2
             WHERE user_ref = ?1",
            params![user_ref, delta],
        )?;
        let total: u64 = self.conn.query_row(
            "SELECT total_xp FROM profiles WHERE user_ref = ?1",
            params![user_ref],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Persist the streak-related fields of a profile.
    pub fn update_streak(&self, profile: &ProgressionProfile) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE profiles SET current_streak_days = ?2, longest_streak_days = ?3,
                                 last_active_date = ?4, total_active_days = ?5
             WHERE user_ref = ?1",
            params![
                profile.user_ref,
                profile.current_streak_days,
                profile.longest_streak_days,
                profile.last_active_date.map(|d| d.to_string()),
                profile.total_active_days,
            ],
        )?;
        Ok(())
    }

    /// Bump the cumulative task counters used as badge metrics.
    pub fn record_task_completion(
        &self,
        user_ref: &str,
        accuracy_percent: Option<f64>,
        is_exam: bool,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE profiles SET
                 tasks_completed = tasks_completed + 1,
                 best_exam_accuracy = MAX(best_exam_accuracy, ?2),
                 has_exam = has_exam OR ?3
             WHERE user_ref = ?1",
            params![user_ref, accuracy_percent.unwrap_or(0.0), is_exam],
        )?;
        Ok(())
    }

    pub fn set_has_goal(&self, user_ref: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE profiles SET has_goal = 1 WHERE user_ref = ?1",
            params![user_ref],
        )?;
        Ok(())
    }

    // ── Badges ───────────────────────────────────────────────────────

    /// Held badge levels, keyed by badge id.
    pub fn badge_levels(&self, user_ref: &str) -> Result<HashMap<String, u32>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT badge_id, level FROM awarded_badges WHERE user_ref = ?1")?;
        let rows = stmt.query_map(params![user_ref], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;
        let mut levels = HashMap::new();
        for row in rows {
            let (id, level) = row?;
            levels.insert(id, level);
        }
        Ok(levels)
    }

    /// Insert on first qualification, update in place on level-up.
    /// The level only ever increases.
    pub fn upsert_badge(
        &self,
        user_ref: &str,
        badge_id: &str,
        level: u32,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO awarded_badges (user_ref, badge_id, level) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_ref, badge_id)
             DO UPDATE SET level = excluded.level WHERE excluded.level > level",
            params![user_ref, badge_id, level],
        )?;
        Ok(())
    }

    // ── Holidays ─────────────────────────────────────────────────────

    pub fn add_holiday(&self, user_ref: &str, day: NaiveDate) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO holidays (user_ref, day) VALUES (?1, ?2)",
            params![user_ref, day.to_string()],
        )?;
        Ok(())
    }

    pub fn remove_holiday(&self, user_ref: &str, day: NaiveDate) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM holidays WHERE user_ref = ?1 AND day = ?2",
            params![user_ref, day.to_string()],
        )?;
        Ok(())
    }

    pub fn is_holiday(&self, user_ref: &str, day: NaiveDate) -> Result<bool, DatabaseError> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM holidays WHERE user_ref = ?1 AND day = ?2",
            params![user_ref, day.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list_holidays(&self, user_ref: &str) -> Result<Vec<NaiveDate>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT day FROM holidays WHERE user_ref = ?1 ORDER BY day")?;
        let rows = stmt.query_map(params![user_ref], |row| row.get::<_, String>(0))?;
        let mut days = Vec::new();
        for row in rows {
            if let Ok(day) = row?.parse() {
                days.push(day);
            }
        }
        Ok(days)
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(Into::into)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: NaiveDate, phase: Phase, secs: i64) -> SessionRecord {
        let start = day.and_hms_opt(9, 0, 0).unwrap().and_utc();
        SessionRecord {
            subject_ref: "algebra".into(),
            owner_ref: "user-1".into(),
            start_time: start,
            end_time: start + chrono::Duration::seconds(secs),
            day,
            phase,
            interval_mode: false,
            cycle: 1,
            paused_seconds: 0,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn session_aggregates() {
        let db = Database::open_memory().unwrap();
        db.insert_session(&record(day(1), Phase::Focus, 1800)).unwrap();
        db.insert_session(&record(day(1), Phase::Break, 300)).unwrap();
        db.insert_session(&record(day(2), Phase::Focus, 3600)).unwrap();

        assert_eq!(db.focus_minutes_on("user-1", day(1)).unwrap(), 30);
        assert_eq!(db.total_focus_secs("user-1").unwrap(), 5400);
        assert!(db.has_any_session("user-1").unwrap());
        assert!(!db.has_any_session("user-2").unwrap());

        let stats = db.stats("user-1", day(2)).unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_focus_min, 90);
        assert_eq!(stats.total_break_min, 5);
        assert_eq!(stats.today_sessions, 1);
        assert_eq!(stats.today_focus_min, 60);
    }

    #[test]
    fn profile_lifecycle_and_atomic_xp() {
        let db = Database::open_memory().unwrap();
        assert!(db.get_profile("user-1").unwrap().is_none());

        let p = db.ensure_profile("user-1").unwrap();
        assert_eq!(p.total_xp, 0);
        assert_eq!(p.level(), 1);

        assert_eq!(db.add_xp("user-1", 135).unwrap(), 135);
        assert_eq!(db.add_xp("user-1", 65).unwrap(), 200);
        let p = db.get_profile("user-1").unwrap().unwrap();
        assert_eq!(p.total_xp, 200);
        assert_eq!(p.lifetime_xp, 200);
    }

    #[test]
    fn streak_fields_roundtrip() {
        let db = Database::open_memory().unwrap();
        let mut p = db.ensure_profile("user-1").unwrap();
        p.current_streak_days = 3;
        p.longest_streak_days = 5;
        p.last_active_date = Some(day(7));
        p.total_active_days = 12;
        db.update_streak(&p).unwrap();

        let loaded = db.get_profile("user-1").unwrap().unwrap();
        assert_eq!(loaded.current_streak_days, 3);
        assert_eq!(loaded.longest_streak_days, 5);
        assert_eq!(loaded.last_active_date, Some(day(7)));
        assert_eq!(loaded.total_active_days, 12);
    }

    #[test]
    fn task_counters_accumulate() {
        let db = Database::open_memory().unwrap();
        db.ensure_profile("user-1").unwrap();
        db.record_task_completion("user-1", None, false).unwrap();
        db.record_task_completion("user-1", Some(87.5), true).unwrap();
        db.record_task_completion("user-1", Some(62.0), true).unwrap();

        let p = db.get_profile("user-1").unwrap().unwrap();
        assert_eq!(p.tasks_completed, 3);
        assert_eq!(p.best_exam_accuracy, 87.5);
        assert!(p.has_exam);
        assert!(!p.has_goal);
    }

    #[test]
    fn badge_level_only_increases() {
        let db = Database::open_memory().unwrap();
        db.upsert_badge("user-1", "task-master", 2).unwrap();
        db.upsert_badge("user-1", "task-master", 1).unwrap();
        let levels = db.badge_levels("user-1").unwrap();
        assert_eq!(levels.get("task-master"), Some(&2));

        db.upsert_badge("user-1", "task-master", 3).unwrap();
        let levels = db.badge_levels("user-1").unwrap();
        assert_eq!(levels.get("task-master"), Some(&3));
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn holiday_calendar() {
        let db = Database::open_memory().unwrap();
        db.add_holiday("user-1", day(10)).unwrap();
        db.add_holiday("user-1", day(10)).unwrap();
        db.add_holiday("user-1", day(11)).unwrap();
        assert!(db.is_holiday("user-1", day(10)).unwrap());
        assert!(!db.is_holiday("user-1", day(12)).unwrap());
        assert_eq!(db.list_holidays("user-1").unwrap(), vec![day(10), day(11)]);

        db.remove_holiday("user-1", day(10)).unwrap();
        assert!(!db.is_holiday("user-1", day(10)).unwrap());
    }

    #[test]
    fn on_disk_database_persists_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyquest.db");

        let db = Database::open_at(&path).unwrap();
        db.insert_session(&record(day(1), Phase::Focus, 1500)).unwrap();
        db.ensure_profile("user-1").unwrap();
        db.add_xp("user-1", 25).unwrap();
        drop(db);

        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.focus_minutes_on("user-1", day(1)).unwrap(), 25);
        assert_eq!(db.get_profile("user-1").unwrap().unwrap().total_xp, 25);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("timer_snapshot").unwrap().is_none());
        db.kv_set("timer_snapshot", "{}").unwrap();
        assert_eq!(db.kv_get("timer_snapshot").unwrap().unwrap(), "{}");
    }
}
