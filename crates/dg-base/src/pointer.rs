//! Pointer classification and the cosmetic cursor overlay state.
//!
//! The renderer registers every interactive region into a [`HitMap`] while
//! drawing. Pointer events are classified against the map as they arrive,
//! but the drawn position only moves once per frame in [`PointerTracker::commit_frame`].

use std::collections::VecDeque;
use std::io;

use ratatui::layout::{Position, Rect};

use crate::code_block::CodeKey;
use crate::config::constants::TRAIL_LEN;

/// What sits under a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Button,
    Link,
    TextInput,
    /// Any other control explicitly marked clickable (prompt chips, copy buttons)
    Clickable,
}

impl TargetKind {
    pub fn is_text_input(self) -> bool {
        matches!(self, TargetKind::TextInput)
    }
}

/// What a left click on a region does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    FocusInput,
    SubmitSearch,
    /// Index into the active prompt set
    PickPrompt(usize),
    CopyCode(CodeKey),
    /// Source links cannot be opened from a terminal, so they are copied
    CopyLink(String),
}

#[derive(Debug, Clone)]
struct Region {
    area: Rect,
    kind: TargetKind,
    action: ClickAction,
}

/// Interactive regions of the current frame, in paint order.
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    regions: Vec<Region>,
}

impl HitMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn register(&mut self, area: Rect, kind: TargetKind, action: ClickAction) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        self.regions.push(Region { area, kind, action });
    }

    /// The top-most region containing the cell. Later registrations paint
    /// over earlier ones.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<(TargetKind, &ClickAction)> {
        let pos = Position::new(x, y);
        self.regions.iter().rev().find(|r| r.area.contains(pos)).map(|r| (r.kind, &r.action))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Latest committed pointer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerSample {
    pub x: u16,
    pub y: u16,
    pub over_interactive: bool,
    pub over_text_input: bool,
}

/// Global pointer event subscription (mouse capture in a terminal).
pub trait PointerSource {
    fn subscribe(&mut self) -> io::Result<()>;
    fn unsubscribe(&mut self) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    subscribed: bool,
    /// Position has been committed at least once
    seen: bool,
    sample: PointerSample,
    pending: Option<(u16, u16)>,
    trail: VecDeque<(u16, u16)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe once. Calling again while active does nothing.
    pub fn start(&mut self, source: &mut dyn PointerSource) -> io::Result<()> {
        if self.subscribed {
            return Ok(());
        }
        source.subscribe()?;
        self.subscribed = true;
        Ok(())
    }

    /// Remove the subscription made by `start` and forget pending state.
    pub fn stop(&mut self, source: &mut dyn PointerSource) -> io::Result<()> {
        if !self.subscribed {
            return Ok(());
        }
        self.subscribed = false;
        self.seen = false;
        self.pending = None;
        self.trail.clear();
        self.sample = PointerSample::default();
        source.unsubscribe()
    }

    pub fn is_active(&self) -> bool {
        self.subscribed
    }

    /// Classify the target under the pointer now and queue the position
    /// for the next frame. Later moves in the same frame replace it.
    pub fn on_move(&mut self, x: u16, y: u16, hits: &HitMap) {
        if !self.subscribed {
            return;
        }
        let kind = hits.hit_test(x, y).map(|(kind, _)| kind);
        self.sample.over_interactive = kind.is_some();
        self.sample.over_text_input = kind.is_some_and(TargetKind::is_text_input);
        self.pending = Some((x, y));
    }

    /// Apply the queued position, if any. Returns true when something moved.
    pub fn commit_frame(&mut self) -> bool {
        let Some((x, y)) = self.pending.take() else {
            return false;
        };
        if self.seen && (self.sample.x, self.sample.y) == (x, y) {
            return false;
        }
        self.seen = true;
        self.sample.x = x;
        self.sample.y = y;
        if self.trail.len() == TRAIL_LEN {
            self.trail.pop_front();
        }
        self.trail.push_back((x, y));
        true
    }

    /// Committed sample, or None before the first commit.
    pub fn sample(&self) -> Option<PointerSample> {
        self.seen.then_some(self.sample)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Oldest first, the current position last.
    pub fn trail(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.trail.iter().copied()
    }
}
