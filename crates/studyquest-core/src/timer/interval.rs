use serde::{Deserialize, Serialize};

/// The two alternating timer phases. Focus is billable study time,
/// break is rest time; only interval mode cycles between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::Break => "break",
        }
    }
}

/// Configuration for interval (pomodoro-style) cycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalConfig {
    /// Focus length in minutes.
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Number of focus cycles before the break becomes a long break.
    #[serde(default = "default_cycles_before_long_break")]
    pub cycles_before_long_break: u32,
    /// Whether a break starts running immediately after focus ends.
    #[serde(default = "default_true")]
    pub auto_start_break: bool,
    /// Whether the next focus starts running immediately after a break.
    #[serde(default)]
    pub auto_start_focus: bool,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_cycles_before_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            cycles_before_long_break: default_cycles_before_long_break(),
            auto_start_break: true,
            auto_start_focus: false,
        }
    }
}

impl IntervalConfig {
    /// Break length in seconds for the given cycle position.
    pub fn break_secs(&self, cycle: u32) -> u64 {
        if self.is_long_break(cycle) {
            self.long_break_minutes as u64 * 60
        } else {
            self.short_break_minutes as u64 * 60
        }
    }

    /// Whether the break after `cycle` focus cycles is a long break.
    pub fn is_long_break(&self, cycle: u32) -> bool {
        cycle >= self.cycles_before_long_break
    }

    pub fn focus_secs(&self) -> u64 {
        self.focus_minutes as u64 * 60
    }
}

/// Raw measured interval produced by `TimerEngine::stop`.
///
/// Ephemeral: consumed immediately by the session splitter, never
/// persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInterval {
    pub subject_ref: String,
    pub start_epoch_ms: u64,
    pub end_epoch_ms: u64,
    pub phase: Phase,
    pub interval_mode: bool,
    pub cycle: u32,
    pub paused_seconds: u64,
}

impl RawInterval {
    /// Net duration in whole seconds (span minus pause).
    pub fn duration_secs(&self) -> u64 {
        let span = self.end_epoch_ms.saturating_sub(self.start_epoch_ms) / 1000;
        span.saturating_sub(self.paused_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_config() {
        let cfg = IntervalConfig::default();
        assert_eq!(cfg.focus_minutes, 25);
        assert_eq!(cfg.short_break_minutes, 5);
        assert_eq!(cfg.long_break_minutes, 15);
        assert_eq!(cfg.cycles_before_long_break, 4);
        assert!(cfg.auto_start_break);
        assert!(!cfg.auto_start_focus);
    }

    #[test]
    fn break_length_depends_on_cycle() {
        let cfg = IntervalConfig::default();
        assert_eq!(cfg.break_secs(1), 5 * 60);
        assert_eq!(cfg.break_secs(3), 5 * 60);
        assert_eq!(cfg.break_secs(4), 15 * 60);
        assert!(cfg.is_long_break(4));
        assert!(!cfg.is_long_break(3));
    }
}
