use std::io;

use crossterm::ExecutableCommand;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, MouseButton, MouseEvent, MouseEventKind};

use dg_base::config::constants::SCROLL_LINES;
use dg_base::pointer::{ClickAction, PointerSource};

use crate::app::actions::Action;
use crate::state::State;

/// Mouse capture on stdout: the terminal's global pointer subscription.
pub struct MouseCapture;

impl PointerSource for MouseCapture {
    fn subscribe(&mut self) -> io::Result<()> {
        io::stdout().execute(EnableMouseCapture).map(|_| ())
    }

    fn unsubscribe(&mut self) -> io::Result<()> {
        io::stdout().execute(DisableMouseCapture).map(|_| ())
    }
}

/// Feed the pointer tracker and turn clicks and wheel notches into actions.
pub fn handle_mouse(event: &MouseEvent, state: &mut State) -> Action {
    let (x, y) = (event.column, event.row);

    match event.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            state.pointer.on_move(x, y, &state.hits);
            Action::None
        }
        MouseEventKind::Down(MouseButton::Left) => {
            state.pointer.on_move(x, y, &state.hits);
            handle_left_click(x, y, state)
        }
        MouseEventKind::ScrollUp => Action::ScrollUp(SCROLL_LINES),
        MouseEventKind::ScrollDown => Action::ScrollDown(SCROLL_LINES),
        _ => Action::None,
    }
}

fn handle_left_click(x: u16, y: u16, state: &State) -> Action {
    let Some((_, action)) = state.hits.hit_test(x, y) else {
        return Action::None;
    };
    match action {
        ClickAction::FocusInput => Action::CursorEnd,
        ClickAction::SubmitSearch => Action::Submit,
        ClickAction::PickPrompt(i) => Action::PickPrompt(*i),
        ClickAction::CopyCode(key) => Action::CopyCode(*key),
        ClickAction::CopyLink(url) => Action::CopyLink(url.clone()),
    }
}
