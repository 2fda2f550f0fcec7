//! Rotating subset of the example prompt catalog.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::constants::{ACTIVE_PROMPT_COUNT, PROMPT_ROTATION_MS};
use crate::config::{self, PromptCatalogEntry};
use crate::timer::Interval;

/// Partial Fisher–Yates: shuffles the first `take` slots uniformly and
/// truncates to them. Every permutation of the input is equally likely to
/// have produced the kept prefix.
pub fn fisher_yates_sample<T, R: Rng + ?Sized>(mut items: Vec<T>, take: usize, rng: &mut R) -> Vec<T> {
    let n = items.len();
    let take = take.min(n);
    for i in 0..take {
        let j = rng.random_range(i..n);
        items.swap(i, j);
    }
    items.truncate(take);
    items
}

/// Keeps `ACTIVE_PROMPT_COUNT` entries sampled from the catalog and
/// resamples them every `PROMPT_ROTATION_MS` while running.
pub struct PromptRotation {
    catalog: Vec<PromptCatalogEntry>,
    active: Vec<PromptCatalogEntry>,
    timer: Interval,
    rng: StdRng,
}

impl PromptRotation {
    /// Rotation over the embedded catalog, seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(config::prompt_catalog().to_vec(), StdRng::from_os_rng())
    }

    pub fn with_rng(catalog: Vec<PromptCatalogEntry>, rng: StdRng) -> Self {
        Self { catalog, active: Vec::new(), timer: Interval::new(), rng }
    }

    /// Sample immediately and schedule the next sample. Restarting a running
    /// rotation resets its period.
    pub fn start(&mut self, now: Instant) {
        self.resample();
        self.timer.start(now, Duration::from_millis(PROMPT_ROTATION_MS));
    }

    /// Cancel the interval. The last sample stays visible.
    pub fn stop(&mut self) {
        self.timer.stop();
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Resample if a period elapsed. Returns true when the set changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.timer.fire_if_due(now) {
            self.resample();
            return true;
        }
        false
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.timer.next_due()
    }

    pub fn active_set(&self) -> &[PromptCatalogEntry] {
        &self.active
    }

    fn resample(&mut self) {
        self.active = fisher_yates_sample(self.catalog.clone(), ACTIVE_PROMPT_COUNT, &mut self.rng);
    }
}

impl Default for PromptRotation {
    fn default() -> Self {
        Self::new()
    }
}
