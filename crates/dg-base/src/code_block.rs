//! Copy-to-clipboard state for rendered code blocks.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::constants::COPY_REVERT_MS;
use crate::markdown::{self, CodeNode};
use crate::timer::Deadline;

/// Typed error for clipboard writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// No clipboard mechanism usable in this environment
    Unavailable(String),
    /// A mechanism was found but the write failed
    Write(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Unavailable(msg) => write!(f, "Clipboard unavailable: {}", msg),
            ClipboardError::Write(msg) => write!(f, "Clipboard write failed: {}", msg),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Write-only clipboard capability.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;

    /// Finish writes that completed off-thread. Called once per loop turn.
    fn poll(&mut self) -> Result<(), ClipboardError> {
        Ok(())
    }
}

/// One code block on screen and its "Copied!" state.
#[derive(Debug, Clone)]
pub struct CodeBlockUnit {
    language: String,
    source: String,
    copied: bool,
    revert: Deadline,
}

impl CodeBlockUnit {
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self { language: language.into(), source: source.into(), copied: false, revert: Deadline::new() }
    }

    pub fn from_node(node: &CodeNode) -> Self {
        Self::new(node.language.clone(), node.source.clone())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_copied(&self) -> bool {
        self.copied
    }

    /// Whether a revert is scheduled. There is never more than one.
    pub fn revert_pending(&self) -> bool {
        self.revert.is_armed()
    }

    /// Copy the source verbatim. On failure nothing changes.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard, now: Instant) -> Result<(), ClipboardError> {
        clipboard.write_text(&self.source)?;
        self.copied = true;
        self.revert.arm(now, Duration::from_millis(COPY_REVERT_MS));
        Ok(())
    }

    /// Returns true when the revert fired and `copied` dropped back.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.revert.fire_if_due(now) {
            self.copied = false;
            return true;
        }
        false
    }
}

/// Which document of the answer a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    /// Per-result explanation, by result index
    Result(usize),
    /// The top-level response
    Response,
}

/// Stable identity of a code block: its section and its position among the
/// section's code blocks. Rendering is deterministic, so re-rendering the
/// same markdown maps every block back to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeKey {
    pub section: Section,
    pub ordinal: usize,
}

/// Owns the units of the displayed answer. Mounting a new answer drops the
/// old units together with their pending reverts.
#[derive(Debug, Default)]
pub struct CodeBlockRegistry {
    generation: Option<u64>,
    units: BTreeMap<CodeKey, CodeBlockUnit>,
}

impl CodeBlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate one unit per code block of `documents`, unless this
    /// generation is already mounted.
    pub fn mount<'a>(&mut self, generation: u64, documents: impl IntoIterator<Item = (Section, &'a str)>) {
        if self.generation == Some(generation) {
            return;
        }
        self.units.clear();
        self.generation = Some(generation);
        for (section, source) in documents {
            let blocks = markdown::render(source);
            for (ordinal, node) in markdown::code_nodes(&blocks).enumerate() {
                self.units.insert(CodeKey { section, ordinal }, CodeBlockUnit::from_node(node));
            }
        }
    }

    pub fn unmount(&mut self) {
        self.units.clear();
        self.generation = None;
    }

    pub fn get(&self, key: &CodeKey) -> Option<&CodeBlockUnit> {
        self.units.get(key)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Keys in display order (results first, then the response).
    pub fn keys(&self) -> Vec<CodeKey> {
        self.units.keys().copied().collect()
    }

    pub fn copy(
        &mut self,
        key: &CodeKey,
        clipboard: &mut dyn Clipboard,
        now: Instant,
    ) -> Option<Result<(), ClipboardError>> {
        self.units.get_mut(key).map(|unit| unit.copy(clipboard, now))
    }

    /// Fire due reverts. Returns true if any unit changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for unit in self.units.values_mut() {
            changed |= unit.tick(now);
        }
        changed
    }
}
