//! Progression pipeline orchestration.
//!
//! Wires the pure engines (splitter, XP calculator, streak, badges) to
//! storage. One triggering event runs the whole pipeline sequentially:
//! persist -> XP -> profile -> badge pass. Profile XP updates go through
//! the database's atomic increment, and the badge pass reads one metrics
//! snapshot before any XP mutation so a badge's own reward never
//! inflates the metrics a later badge in the same pass sees.
//!
//! Transitions are optimistic: a storage failure surfaces to the caller
//! as a failed operation, nothing already written is rolled back, and
//! re-running a pass cannot double-credit already-held badge levels.

use std::collections::HashSet;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::badges::{self, BadgeDefinition, ProgressMetrics};
use crate::error::Result;
use crate::events::{Event, XpSource};
use crate::session::split_interval;
use crate::storage::Database;
use crate::streak::{self, ContinuityOutcome, DayMetrics, StreakPolicy, StreakUpdate};
use crate::timer::{Phase, RawInterval};
use crate::xp::{self, level_for_xp, TaskCompletion, XpBreakdown};

/// Progression service for a single user database.
pub struct Progression<'a> {
    db: &'a Database,
    catalog: Vec<BadgeDefinition>,
    policy: StreakPolicy,
}

impl<'a> Progression<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            catalog: badges::default_catalog(),
            policy: StreakPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StreakPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<BadgeDefinition>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn policy(&self) -> &StreakPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &[BadgeDefinition] {
        &self.catalog
    }

    /// Persist a stopped timer interval and award session XP.
    ///
    /// The interval is split into day-bounded records. Break-phase
    /// intervals are recorded but earn nothing.
    pub fn record_focus_session<Tz: TimeZone>(
        &self,
        user_ref: &str,
        interval: &RawInterval,
        tz: &Tz,
    ) -> Result<Vec<Event>> {
        let records = split_interval(interval, user_ref, tz);
        if records.is_empty() {
            return Ok(Vec::new());
        }
        for record in &records {
            self.db.insert_session(record)?;
        }
        log::debug!(
            "persisted {} session record(s) for '{}' ({})",
            records.len(),
            user_ref,
            interval.phase.as_str()
        );

        let mut events = Vec::new();
        if interval.phase == Phase::Focus {
            let profile = self.db.ensure_profile(user_ref)?;
            let breakdown =
                xp::for_timer_session(interval.duration_secs(), profile.current_streak_days);
            self.apply_xp(user_ref, XpSource::TimerSession, breakdown, &mut events)?;
            self.run_badges(user_ref, &mut events)?;
        }
        Ok(events)
    }

    /// Award XP for a completed task and re-run the badge pass.
    ///
    /// Returns the breakdown so the caller can display the reasoning.
    pub fn mark_task_complete(
        &self,
        user_ref: &str,
        task: &TaskCompletion,
    ) -> Result<(XpBreakdown, Vec<Event>)> {
        let profile = self.db.ensure_profile(user_ref)?;
        let breakdown = xp::for_task(task, profile.current_streak_days);

        let is_exam = task.kind.is_exam();
        self.db.record_task_completion(
            user_ref,
            task.accuracy_percent.filter(|_| is_exam),
            is_exam,
        )?;

        let mut events = Vec::new();
        self.apply_xp(user_ref, XpSource::Task, breakdown, &mut events)?;
        self.run_badges(user_ref, &mut events)?;
        Ok((breakdown, events))
    }

    /// Note that the user created their first goal (badge metric).
    pub fn record_goal_created(&self, user_ref: &str) -> Result<Vec<Event>> {
        self.db.ensure_profile(user_ref)?;
        self.db.set_has_goal(user_ref)?;
        let mut events = Vec::new();
        self.run_badges(user_ref, &mut events)?;
        Ok(events)
    }

    /// Extend the streak if today's activity satisfies the policy.
    ///
    /// Idempotent per calendar day; a qualifying day re-runs the badge
    /// pass since the streak is a badge metric.
    pub fn record_active_day(
        &self,
        user_ref: &str,
        metrics: &DayMetrics,
        today: NaiveDate,
    ) -> Result<Vec<Event>> {
        let mut profile = self.db.ensure_profile(user_ref)?;
        let update = streak::record_active_day(&mut profile, metrics, &self.policy, today);
        let mut events = Vec::new();
        if let StreakUpdate::Extended {
            current_days,
            longest_days,
            milestone,
        } = update
        {
            self.db.update_streak(&profile)?;
            events.push(Event::StreakExtended {
                current_days,
                longest_days,
                at: Utc::now(),
            });
            if let Some(days) = milestone {
                events.push(Event::StreakMilestone {
                    days,
                    at: Utc::now(),
                });
            }
            self.run_badges(user_ref, &mut events)?;
        }
        Ok(events)
    }

    /// Break the streak when days were missed, unless every missed day
    /// is a holiday. Run at session start or on a daily tick.
    pub fn check_continuity(
        &self,
        user_ref: &str,
        today: NaiveDate,
    ) -> Result<(ContinuityOutcome, Vec<Event>)> {
        let mut profile = self.db.ensure_profile(user_ref)?;

        // Prefetch the holiday calendar for the gap so a storage failure
        // aborts the evaluation before any state is mutated.
        let mut holidays = HashSet::new();
        if let Some(last_active) = profile.last_active_date {
            let mut day = last_active;
            while let Some(next) = day.succ_opt() {
                if next >= today {
                    break;
                }
                if self.db.is_holiday(user_ref, next)? {
                    holidays.insert(next);
                }
                day = next;
            }
        }

        let outcome = streak::check_continuity(&mut profile, today, |d| holidays.contains(&d));
        let mut events = Vec::new();
        if let ContinuityOutcome::Broken { previous_days } = outcome {
            self.db.update_streak(&profile)?;
            events.push(Event::StreakBroken {
                previous_days,
                at: Utc::now(),
            });
        }
        Ok((outcome, events))
    }

    /// Assemble today's activity counters. Study minutes come from the
    /// recorded sessions; task counts come from the caller, which owns
    /// task scheduling.
    pub fn day_metrics(
        &self,
        user_ref: &str,
        today: NaiveDate,
        tasks_completed: u32,
        tasks_scheduled: u32,
    ) -> Result<DayMetrics> {
        Ok(DayMetrics {
            study_minutes: self.db.focus_minutes_on(user_ref, today)? as u32,
            tasks_completed,
            tasks_scheduled,
        })
    }

    /// Metrics snapshot for a badge pass.
    pub fn progress_metrics(&self, user_ref: &str) -> Result<ProgressMetrics> {
        let profile = self.db.ensure_profile(user_ref)?;
        let total_focus_secs = self.db.total_focus_secs(user_ref)?;
        let has_timer_session = self.db.has_any_session(user_ref)?;
        Ok(ProgressMetrics::from_profile(
            &profile,
            total_focus_secs,
            has_timer_session,
        ))
    }

    fn apply_xp(
        &self,
        user_ref: &str,
        source: XpSource,
        breakdown: XpBreakdown,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let before = self.db.ensure_profile(user_ref)?.total_xp;
        let total_xp = self.db.add_xp(user_ref, breakdown.total as u64)?;
        events.push(Event::XpGained {
            source,
            breakdown,
            total_xp,
            at: Utc::now(),
        });
        push_level_up(before, total_xp, events);
        Ok(())
    }

    /// One badge evaluation pass.
    ///
    /// Awards are applied one at a time (badge row, then XP), so an
    /// error mid-pass leaves earlier awards in place and later badges
    /// untouched; a retry of the pass cannot re-credit held levels.
    fn run_badges(&self, user_ref: &str, events: &mut Vec<Event>) -> Result<()> {
        let metrics = self.progress_metrics(user_ref)?;
        let held = self.db.badge_levels(user_ref)?;
        let awards = badges::evaluate(&self.catalog, &metrics, &held);
        if awards.is_empty() {
            return Ok(());
        }

        let before = self.db.ensure_profile(user_ref)?.total_xp;
        let mut total_xp = before;
        for award in awards {
            self.db.upsert_badge(user_ref, &award.badge_id, award.to_level)?;
            total_xp = self.db.add_xp(user_ref, award.xp_awarded)?;
            log::info!(
                "badge '{}' reached level {} for '{}' (+{} XP)",
                award.badge_id,
                award.to_level,
                user_ref,
                award.xp_awarded
            );
            events.push(Event::BadgeUnlocked {
                badge_id: award.badge_id,
                level: award.to_level,
                xp_awarded: award.xp_awarded,
                at: Utc::now(),
            });
        }
        push_level_up(before, total_xp, events);
        Ok(())
    }
}

fn push_level_up(before_xp: u64, after_xp: u64, events: &mut Vec<Event>) {
    let from_level = level_for_xp(before_xp);
    let to_level = level_for_xp(after_xp);
    if to_level > from_level {
        events.push(Event::LevelUp {
            from_level,
            to_level,
            at: Utc::now(),
        });
    }
}
