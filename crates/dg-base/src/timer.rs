//! Cancelable deadlines driven by the event loop.
//!
//! Nothing here spawns threads or sleeps: the owner polls with the current
//! `Instant` and reacts when a deadline reports it fired. Dropping the owner
//! drops the timer, so a fired callback can never outlive its unit.

use std::time::{Duration, Instant};

/// One-shot timer. Re-arming replaces the previous due time.
#[derive(Debug, Default, Clone)]
pub struct Deadline {
    due: Option<Instant>,
}

impl Deadline {
    pub fn new() -> Self {
        Self { due: None }
    }

    /// Arm (or restart) the deadline `delay` after `now`.
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.due = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    pub fn due(&self) -> Option<Instant> {
        self.due
    }

    /// Returns true exactly once when the deadline has passed, then disarms.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

/// Repeating timer on a fixed cadence.
#[derive(Debug, Default, Clone)]
pub struct Interval {
    period: Duration,
    next: Option<Instant>,
}

impl Interval {
    pub fn new() -> Self {
        Self { period: Duration::ZERO, next: None }
    }

    /// Start ticking; the first tick is due one `period` after `now`.
    pub fn start(&mut self, now: Instant, period: Duration) {
        self.period = period;
        self.next = Some(now + period);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next
    }

    /// Fires at most once per call. Missed periods are skipped so a stalled
    /// loop does not produce a burst of ticks afterwards.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        let Some(mut next) = self.next else {
            return false;
        };
        if now < next {
            return false;
        }
        if self.period.is_zero() {
            self.next = Some(now);
            return true;
        }
        while next <= now {
            next += self.period;
        }
        self.next = Some(next);
        true
    }
}
