//! Time sources for the scheduler

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds elapsed since the clock's epoch
    fn now_ms(&self) -> u64;

    /// Block until `deadline_ms` has been reached
    fn sleep_until(&self, deadline_ms: u64);
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep_until(&self, deadline_ms: u64) {
        let now = self.now_ms();
        if deadline_ms > now {
            std::thread::sleep(Duration::from_millis(deadline_ms - now));
        }
    }
}

/// Manually driven clock for tests and simulations
///
/// Clones share the same time, so a test can keep one handle while the
/// scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now_ms: Rc<Cell<u64>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(ms));
    }

    /// Move to `now_ms`; time never runs backwards
    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(self.now_ms.get().max(now_ms));
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn sleep_until(&self, deadline_ms: u64) {
        self.set(deadline_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_clock_shared_between_clones() {
        let clock = VirtualClock::new();
        let other = clock.clone();
        assert_eq!(clock.now_ms(), 0);

        other.advance(1500);
        assert_eq!(clock.now_ms(), 1500);

        clock.sleep_until(4000);
        assert_eq!(other.now_ms(), 4000);
    }

    #[test]
    fn test_virtual_clock_never_goes_back() {
        let clock = VirtualClock::starting_at(1000);
        clock.set(500);
        assert_eq!(clock.now_ms(), 1000);
        clock.sleep_until(200);
        assert_eq!(clock.now_ms(), 1000);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now_ms();
        clock.sleep_until(first + 2);
        assert!(clock.now_ms() >= first + 2);
    }
}
