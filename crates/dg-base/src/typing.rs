//! Debounced "typing" state of the query input.
//!
//! Each keystroke raises the flag and re-arms one settle deadline; the event
//! loop polls it and the flag drops once input has been quiet for
//! `TYPING_DEBOUNCE_MS`.

use std::time::{Duration, Instant};

use crate::config::constants::TYPING_DEBOUNCE_MS;
use crate::timer::Deadline;

/// "Typing" flag of the query input, dropped after a quiet period.
#[derive(Debug, Default)]
pub struct TypingIndicator {
    typing: bool,
    settle: Deadline,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keystroke(&mut self, now: Instant) {
        self.typing = true;
        self.settle.arm(now, Duration::from_millis(TYPING_DEBOUNCE_MS));
    }

    /// Returns true when the flag just dropped.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.settle.fire_if_due(now) {
            self.typing = false;
            return true;
        }
        false
    }

    pub fn cancel(&mut self) {
        self.settle.cancel();
        self.typing = false;
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn due(&self) -> Option<Instant> {
        self.settle.due()
    }
}
