//! Timer state machine.
//!
//! The engine is a wall-clock-based state machine. It does not use
//! internal threads and no tick is ever stored: elapsed time is
//! recomputed on demand from the snapshot's timestamps, so the engine
//! tolerates arbitrary downtime between persisted snapshots.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> Idle (stop/reset)
//! ```
//!
//! Within Running/Paused the phase independently alternates
//! `Focus <-> Break` via `advance_phase` when interval mode is on.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::interval::{IntervalConfig, Phase, RawInterval};
use crate::clock::Clock;
use crate::error::TimerError;
use crate::events::Event;

/// Hard elapsed ceiling: 12 hours. A missed stop (device sleep, crash)
/// must not produce absurd durations.
pub const MAX_SESSION_SECS: u64 = 12 * 60 * 60;

/// Intervals shorter than this are dropped at `stop()`, not recorded.
pub const MIN_SESSION_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// The single persisted timer state.
///
/// Written to storage on every transition so a process restart resumes
/// the in-progress timer exactly. Invariant: `subject_ref` is `Some`
/// iff `status != Idle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub phase: Phase,
    pub subject_ref: Option<String>,
    pub started_at_epoch_ms: u64,
    pub paused_at_epoch_ms: Option<u64>,
    pub accumulated_pause_ms: u64,
    /// Interval (pomodoro) configuration; `None` for open-ended timers.
    pub interval: Option<IntervalConfig>,
    /// 1-based focus cycle counter, meaningful in interval mode.
    pub current_cycle: u32,
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self {
            status: TimerStatus::Idle,
            phase: Phase::Focus,
            subject_ref: None,
            started_at_epoch_ms: 0,
            paused_at_epoch_ms: None,
            accumulated_pause_ms: 0,
            interval: None,
            current_cycle: 1,
        }
    }
}

/// Core timer engine: one owned snapshot plus an injected clock.
///
/// Not a singleton. Callers obtain an engine through their session
/// context, so tests can run many independent engines in parallel.
#[derive(Debug, Clone)]
pub struct TimerEngine<C: Clock> {
    snapshot: TimerSnapshot,
    clock: C,
}

impl<C: Clock> TimerEngine<C> {
    pub fn new(clock: C) -> Self {
        Self {
            snapshot: TimerSnapshot::default(),
            clock,
        }
    }

    /// Resume from a persisted snapshot (process restart).
    pub fn from_snapshot(snapshot: TimerSnapshot, clock: C) -> Self {
        Self { snapshot, clock }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.snapshot
    }

    pub fn status(&self) -> TimerStatus {
        self.snapshot.status
    }

    pub fn phase(&self) -> Phase {
        self.snapshot.phase
    }

    pub fn subject_ref(&self) -> Option<&str> {
        self.snapshot.subject_ref.as_deref()
    }

    /// Target length of the current phase in seconds, interval mode only.
    pub fn interval_target_secs(&self) -> Option<u64> {
        let cfg = self.snapshot.interval.as_ref()?;
        Some(match self.snapshot.phase {
            Phase::Focus => cfg.focus_secs(),
            Phase::Break => cfg.break_secs(self.snapshot.current_cycle),
        })
    }

    /// Elapsed seconds of the current phase, net of pauses.
    ///
    /// Pure recomputation from the snapshot and the clock; safe to call
    /// from a UI refresh loop at any cadence. Clamped to
    /// [`MAX_SESSION_SECS`].
    pub fn elapsed_secs(&self) -> u64 {
        if self.snapshot.status == TimerStatus::Idle {
            return 0;
        }
        let reference = self
            .snapshot
            .paused_at_epoch_ms
            .unwrap_or_else(|| self.clock.now_ms());
        let elapsed_ms = reference
            .saturating_sub(self.snapshot.started_at_epoch_ms)
            .saturating_sub(self.snapshot.accumulated_pause_ms);
        (elapsed_ms / 1000).min(MAX_SESSION_SECS)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start timing `subject_ref`.
    ///
    /// Refuses to start while another timer is active unless
    /// `discard_active` is set, in which case the in-flight timer's
    /// unsaved time is dropped. Callers that want to keep it must
    /// `stop()` and persist first.
    pub fn start(
        &mut self,
        subject_ref: impl Into<String>,
        interval: Option<IntervalConfig>,
        discard_active: bool,
    ) -> Result<Event, TimerError> {
        if self.snapshot.status != TimerStatus::Idle && !discard_active {
            return Err(TimerError::AlreadyActive {
                subject_ref: self.snapshot.subject_ref.clone().unwrap_or_default(),
            });
        }
        let subject_ref = subject_ref.into();
        let interval_mode = interval.is_some();
        self.snapshot = TimerSnapshot {
            status: TimerStatus::Running,
            phase: Phase::Focus,
            subject_ref: Some(subject_ref.clone()),
            started_at_epoch_ms: self.clock.now_ms(),
            paused_at_epoch_ms: None,
            accumulated_pause_ms: 0,
            interval,
            current_cycle: 1,
        };
        log::debug!("timer started for '{subject_ref}' (interval_mode={interval_mode})");
        Ok(Event::TimerStarted {
            subject_ref,
            phase: Phase::Focus,
            interval_mode,
            at: Utc::now(),
        })
    }

    /// No-op unless running.
    pub fn pause(&mut self) -> Option<Event> {
        if self.snapshot.status != TimerStatus::Running {
            return None;
        }
        self.snapshot.paused_at_epoch_ms = Some(self.clock.now_ms());
        self.snapshot.status = TimerStatus::Paused;
        Some(Event::TimerPaused {
            elapsed_secs: self.elapsed_secs(),
            at: Utc::now(),
        })
    }

    /// No-op unless paused.
    pub fn resume(&mut self) -> Option<Event> {
        if self.snapshot.status != TimerStatus::Paused {
            return None;
        }
        if let Some(paused_at) = self.snapshot.paused_at_epoch_ms.take() {
            self.snapshot.accumulated_pause_ms += self.clock.now_ms().saturating_sub(paused_at);
        }
        self.snapshot.status = TimerStatus::Running;
        Some(Event::TimerResumed {
            elapsed_secs: self.elapsed_secs(),
            at: Utc::now(),
        })
    }

    /// Stop the timer and reset to idle.
    ///
    /// Returns the measured interval, or `None` when no subject is
    /// active or the net duration is under [`MIN_SESSION_SECS`]
    /// (too-short sessions are dropped, not recorded).
    pub fn stop(&mut self) -> Option<RawInterval> {
        let subject_ref = self.snapshot.subject_ref.clone()?;
        let now = self.clock.now_ms();
        // An in-progress pause counts toward total pause time.
        let total_pause_ms = self.snapshot.accumulated_pause_ms
            + self
                .snapshot
                .paused_at_epoch_ms
                .map(|p| now.saturating_sub(p))
                .unwrap_or(0);
        let raw_secs = now
            .saturating_sub(self.snapshot.started_at_epoch_ms)
            .saturating_sub(total_pause_ms)
            / 1000;
        let duration_secs = raw_secs.min(MAX_SESSION_SECS);
        // Clamp the recorded end so segment spans stay consistent with
        // the capped duration.
        let end_epoch_ms = if raw_secs > MAX_SESSION_SECS {
            self.snapshot.started_at_epoch_ms + total_pause_ms + MAX_SESSION_SECS * 1000
        } else {
            now
        };

        let interval = RawInterval {
            subject_ref,
            start_epoch_ms: self.snapshot.started_at_epoch_ms,
            end_epoch_ms,
            phase: self.snapshot.phase,
            interval_mode: self.snapshot.interval.is_some(),
            cycle: self.snapshot.current_cycle,
            paused_seconds: total_pause_ms / 1000,
        };
        self.snapshot = TimerSnapshot::default();

        if duration_secs < MIN_SESSION_SECS {
            log::debug!("dropping {duration_secs}s interval below minimum session duration");
            return None;
        }
        Some(interval)
    }

    /// Reset to idle, discarding any in-flight time.
    pub fn reset(&mut self) {
        self.snapshot = TimerSnapshot::default();
    }

    /// Deterministic phase transition in interval mode.
    ///
    /// Focus -> break: break length is long when the current cycle has
    /// reached `cycles_before_long_break`; the phase clock restarts and
    /// the status follows `auto_start_break`. Break -> focus: the cycle
    /// increments, or resets to 1 when the finished break was a long
    /// one; status follows `auto_start_focus`.
    ///
    /// No-op when idle or not in interval mode.
    pub fn advance_phase(&mut self) -> Option<Event> {
        if self.snapshot.status == TimerStatus::Idle {
            return None;
        }
        let cfg = *self.snapshot.interval.as_ref()?;
        let (next_phase, next_cycle, auto_start) = match self.snapshot.phase {
            Phase::Focus => (Phase::Break, self.snapshot.current_cycle, cfg.auto_start_break),
            Phase::Break => {
                let next_cycle = if cfg.is_long_break(self.snapshot.current_cycle) {
                    1
                } else {
                    self.snapshot.current_cycle + 1
                };
                (Phase::Focus, next_cycle, cfg.auto_start_focus)
            }
        };

        self.snapshot.phase = next_phase;
        self.snapshot.current_cycle = next_cycle;
        self.snapshot.started_at_epoch_ms = self.clock.now_ms();
        self.snapshot.accumulated_pause_ms = 0;
        self.snapshot.status = if auto_start {
            self.snapshot.paused_at_epoch_ms = None;
            TimerStatus::Running
        } else {
            // Paused phases anchor elapsed time at the phase start.
            self.snapshot.paused_at_epoch_ms = Some(self.snapshot.started_at_epoch_ms);
            TimerStatus::Paused
        };

        let target_secs = self.interval_target_secs().unwrap_or(0);
        Some(Event::PhaseAdvanced {
            phase: next_phase,
            cycle: next_cycle,
            target_secs,
            running: auto_start,
            at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn engine() -> TimerEngine<ManualClock> {
        TimerEngine::new(ManualClock::new(1_700_000_000_000))
    }

    #[test]
    fn start_pause_resume_stop() {
        let mut e = engine();
        assert_eq!(e.status(), TimerStatus::Idle);

        e.start("algebra", None, false).unwrap();
        assert_eq!(e.status(), TimerStatus::Running);
        assert_eq!(e.subject_ref(), Some("algebra"));

        e.clock.advance_secs(120);
        assert!(e.pause().is_some());
        assert_eq!(e.status(), TimerStatus::Paused);

        e.clock.advance_secs(30);
        assert!(e.resume().is_some());
        assert_eq!(e.status(), TimerStatus::Running);

        e.clock.advance_secs(60);
        let interval = e.stop().expect("session long enough");
        assert_eq!(interval.subject_ref, "algebra");
        assert_eq!(interval.paused_seconds, 30);
        assert_eq!(interval.duration_secs(), 180);
        assert_eq!(e.status(), TimerStatus::Idle);
        assert_eq!(e.subject_ref(), None);
    }

    #[test]
    fn start_while_active_is_rejected() {
        let mut e = engine();
        e.start("algebra", None, false).unwrap();
        let err = e.start("history", None, false).unwrap_err();
        assert!(matches!(err, TimerError::AlreadyActive { subject_ref } if subject_ref == "algebra"));
        // Explicit discard replaces the active timer.
        e.start("history", None, true).unwrap();
        assert_eq!(e.subject_ref(), Some("history"));
    }

    #[test]
    fn pause_and_resume_are_noops_in_wrong_state() {
        let mut e = engine();
        assert!(e.pause().is_none());
        assert!(e.resume().is_none());
        e.start("algebra", None, false).unwrap();
        assert!(e.resume().is_none());
    }

    #[test]
    fn stop_when_idle_returns_none() {
        let mut e = engine();
        assert!(e.stop().is_none());
    }

    #[test]
    fn minimum_duration_boundary() {
        let mut e = engine();
        e.start("algebra", None, false).unwrap();
        e.clock.advance_secs(59);
        assert!(e.stop().is_none(), "59s is dropped");
        assert_eq!(e.status(), TimerStatus::Idle, "state still resets");

        e.start("algebra", None, false).unwrap();
        e.clock.advance_secs(60);
        let interval = e.stop().expect("60s is recorded");
        assert_eq!(interval.duration_secs(), 60);
    }

    #[test]
    fn elapsed_is_idempotent_and_conserves_pauses() {
        let mut e = engine();
        e.start("algebra", None, false).unwrap();
        e.clock.advance_secs(100);
        e.pause();
        e.clock.advance_secs(50);
        e.resume();
        e.clock.advance_secs(100);
        e.pause();
        e.clock.advance_secs(25);
        e.resume();
        e.clock.advance_secs(10);
        // 285s wall time, 75s paused.
        assert_eq!(e.elapsed_secs(), 210);
        assert_eq!(e.elapsed_secs(), 210, "same clock, same answer");
    }

    #[test]
    fn elapsed_frozen_while_paused() {
        let mut e = engine();
        e.start("algebra", None, false).unwrap();
        e.clock.advance_secs(90);
        e.pause();
        e.clock.advance_secs(600);
        assert_eq!(e.elapsed_secs(), 90);
    }

    #[test]
    fn elapsed_caps_at_twelve_hours() {
        let mut e = engine();
        e.start("algebra", None, false).unwrap();
        e.clock.advance_secs(20 * 60 * 60);
        assert_eq!(e.elapsed_secs(), MAX_SESSION_SECS);
        let interval = e.stop().unwrap();
        assert_eq!(interval.duration_secs(), MAX_SESSION_SECS);
    }

    #[test]
    fn advance_phase_cycles_focus_and_break() {
        let mut e = engine();
        let cfg = IntervalConfig {
            cycles_before_long_break: 2,
            auto_start_break: true,
            auto_start_focus: false,
            ..IntervalConfig::default()
        };
        e.start("algebra", Some(cfg), false).unwrap();
        assert_eq!(e.interval_target_secs(), Some(25 * 60));

        // Cycle 1 focus -> short break, auto-started.
        let ev = e.advance_phase().unwrap();
        assert!(matches!(ev, Event::PhaseAdvanced { phase: Phase::Break, running: true, .. }));
        assert_eq!(e.interval_target_secs(), Some(5 * 60));

        // Break -> focus, cycle 2, waits for the user.
        e.advance_phase().unwrap();
        assert_eq!(e.phase(), Phase::Focus);
        assert_eq!(e.snapshot().current_cycle, 2);
        assert_eq!(e.status(), TimerStatus::Paused);
        e.resume().unwrap();

        // Cycle 2 has reached the long-break threshold.
        e.advance_phase().unwrap();
        assert_eq!(e.interval_target_secs(), Some(15 * 60));

        // After a long break the cycle resets to 1.
        e.advance_phase().unwrap();
        assert_eq!(e.snapshot().current_cycle, 1);
    }

    #[test]
    fn advance_phase_resets_phase_clock() {
        let mut e = engine();
        e.start("algebra", Some(IntervalConfig::default()), false).unwrap();
        e.clock.advance_secs(25 * 60);
        assert_eq!(e.elapsed_secs(), 25 * 60);
        e.advance_phase().unwrap();
        assert_eq!(e.elapsed_secs(), 0);
        e.clock.advance_secs(60);
        assert_eq!(e.elapsed_secs(), 60);
    }

    #[test]
    fn advance_phase_noop_without_interval_mode() {
        let mut e = engine();
        e.start("algebra", None, false).unwrap();
        assert!(e.advance_phase().is_none());
    }

    #[test]
    fn snapshot_roundtrip_preserves_running_timer() {
        let mut e = engine();
        e.start("algebra", None, false).unwrap();
        e.clock.advance_secs(120);

        let json = serde_json::to_string(e.snapshot()).unwrap();
        let restored: TimerSnapshot = serde_json::from_str(&json).unwrap();
        let clock = e.clock.clone();
        let e2 = TimerEngine::from_snapshot(restored, clock);
        assert_eq!(e2.elapsed_secs(), 120);
        assert_eq!(e2.subject_ref(), Some("algebra"));
    }
}
