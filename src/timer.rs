//! Time source used for deadlines and frame pacing.
//!
//! Both the transport engine and the diagnostic client read time through a
//! [`Clock`] so that timeouts and separation times can be driven by a
//! [`ManualClock`] in tests instead of the wall clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source with a blocking sleep.
pub trait Clock: Send {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
    /// Block the caller for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Simulated clock. Time only moves when somebody sleeps on it or calls
/// [`ManualClock::advance`]. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// A timeout window that can be restarted when progress is made.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Duration,
    timeout: Duration,
}

impl Deadline {
    pub fn start<C: Clock + ?Sized>(clock: &C, timeout: Duration) -> Self {
        Self {
            started: clock.now(),
            timeout,
        }
    }

    pub fn restart<C: Clock + ?Sized>(&mut self, clock: &C) {
        self.started = clock.now();
    }

    pub fn is_expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        clock.now().saturating_sub(self.started) >= self.timeout
    }

    pub fn remaining<C: Clock + ?Sized>(&self, clock: &C) -> Duration {
        self.timeout
            .saturating_sub(clock.now().saturating_sub(self.started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_on_sleep() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.sleep(Duration::from_millis(5));
        let shared = clock.clone();
        shared.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(10));
    }

    #[test]
    fn deadline_expires_and_restarts() {
        let clock = ManualClock::new();
        let mut deadline = Deadline::start(&clock, Duration::from_millis(100));
        clock.advance(Duration::from_millis(60));
        assert!(!deadline.is_expired(&clock));
        assert_eq!(deadline.remaining(&clock), Duration::from_millis(40));

        deadline.restart(&clock);
        clock.advance(Duration::from_millis(60));
        assert!(!deadline.is_expired(&clock));
        clock.advance(Duration::from_millis(40));
        assert!(deadline.is_expired(&clock));
        assert_eq!(deadline.remaining(&clock), Duration::ZERO);
    }
}
