use std::iter;
use std::time::{Duration, Instant};

use dg_base::code_block::{CodeBlockRegistry, CodeKey, Section};
use dg_base::pointer::{HitMap, PointerTracker};
use dg_base::prompts::PromptRotation;
use dg_base::search::SearchController;
use dg_base::timer::Deadline;
use dg_base::typing::TypingIndicator;

use crate::api::HealthReport;

/// How long a status-bar notice stays up
const NOTICE_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Checking,
    Healthy(String),
    Unreachable(String),
}

impl From<HealthReport> for HealthStatus {
    fn from(report: HealthReport) -> Self {
        match report {
            HealthReport::Healthy(status) => HealthStatus::Healthy(status),
            HealthReport::Unreachable(reason) => HealthStatus::Unreachable(reason),
        }
    }
}

/// Everything the screen shows. Only the UI thread touches it.
pub struct State {
    /// Query being edited
    pub input: String,
    /// Byte offset into `input`
    pub input_cursor: usize,
    pub search: SearchController,
    pub prompts: PromptRotation,
    pub pointer: PointerTracker,
    pub typing: TypingIndicator,
    pub code_blocks: CodeBlockRegistry,
    /// Code block targeted by Ctrl+Y
    pub focused_code: Option<CodeKey>,
    /// Interactive regions of the last drawn frame
    pub hits: HitMap,
    pub scroll_offset: u16,
    /// Set by the renderer from the content height
    pub max_scroll: u16,
    pub health: HealthStatus,
    pub api_base_url: String,
    pub spinner_frame: usize,
    notice: Option<String>,
    notice_timer: Deadline,
    pub dirty: bool,
}

impl State {
    pub fn new(api_base_url: String, prompts: PromptRotation) -> Self {
        Self {
            input: String::new(),
            input_cursor: 0,
            search: SearchController::new(),
            prompts,
            pointer: PointerTracker::new(),
            typing: TypingIndicator::new(),
            code_blocks: CodeBlockRegistry::new(),
            focused_code: None,
            hits: HitMap::new(),
            scroll_offset: 0,
            max_scroll: 0,
            health: HealthStatus::Checking,
            api_base_url,
            spinner_frame: 0,
            notice: None,
            notice_timer: Deadline::new(),
            dirty: true,
        }
    }

    /// Mount code block units for the answer on screen. Units survive as
    /// long as the same answer stays displayed.
    pub fn sync_code_blocks(&mut self) {
        match self.search.displayed() {
            Some(answer) => {
                let documents = answer
                    .results
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (Section::Result(i), r.explanation.as_str()))
                    .chain(iter::once((Section::Response, answer.response)));
                self.code_blocks.mount(answer.meta.generation, documents);
            }
            None => self.code_blocks.unmount(),
        }
        if let Some(key) = self.focused_code
            && self.code_blocks.get(&key).is_none()
        {
            self.focused_code = None;
        }
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, text: impl Into<String>, now: Instant) {
        self.notice = Some(text.into());
        self.notice_timer.arm(now, Duration::from_millis(NOTICE_MS));
    }

    /// Fire every due timer owned by the screen. Returns true if anything
    /// visible changed.
    pub fn poll_timers(&mut self, now: Instant) -> bool {
        let mut changed = self.prompts.poll(now);
        changed |= self.typing.poll(now);
        changed |= self.code_blocks.tick(now);
        if self.notice_timer.fire_if_due(now) {
            self.notice = None;
            changed = true;
        }
        changed
    }

    /// Cancel every pending timer. Used on teardown.
    pub fn cancel_timers(&mut self) {
        self.prompts.stop();
        self.typing.cancel();
        self.code_blocks.unmount();
        self.notice_timer.cancel();
    }
}

#[cfg(test)]
impl State {
    /// State with a seeded prompt rotation.
    pub fn for_tests() -> Self {
        use rand::SeedableRng;
        let catalog = dg_base::config::prompt_catalog().to_vec();
        let prompts = PromptRotation::with_rng(catalog, rand::rngs::StdRng::seed_from_u64(5));
        State::new("http://localhost:8000".into(), prompts)
    }
}
