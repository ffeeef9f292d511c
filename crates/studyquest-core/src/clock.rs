//! Wall-clock abstraction.
//!
//! The timer engine never runs its own ticking thread; every elapsed-time
//! query is recomputed from stored timestamps and the current wall clock.
//! Injecting the clock lets tests drive time deterministically and lets
//! multiple engines run in parallel without global state.

/// Source of "now" in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Production clock backed by `std::time::SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually advanced clock for tests and simulations.
///
/// Clones share the same underlying instant, so a test can keep a handle
/// while the engine owns its copy.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: std::rc::Rc<std::cell::Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: std::rc::Rc::new(std::cell::Cell::new(start_ms)),
        }
    }

    pub fn advance_ms(&self, delta_ms: u64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_ms(secs * 1000);
    }

    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance_secs(60);
        assert_eq!(clock.now_ms(), 61_000);
    }

    #[test]
    fn clones_share_the_same_instant() {
        let a = ManualClock::new(0);
        let b = a.clone();
        a.advance_ms(500);
        assert_eq!(b.now_ms(), 500);
    }

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
