use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use dg_base::config::constants::{ACTIVE_PROMPT_COUNT, SCROLL_LINES, SCROLL_PAGE_LINES};

use crate::app::actions::Action;
use crate::app::mouse::handle_mouse;
use crate::state::State;

/// Map a terminal event to an action. `None` means quit.
pub fn handle_event(event: &Event, state: &mut State) -> Option<Action> {
    match event {
        Event::Key(key) => {
            if key.kind == KeyEventKind::Release {
                return Some(Action::None);
            }
            handle_key(key)
        }
        Event::Mouse(mouse) => Some(handle_mouse(mouse, state)),
        Event::Paste(text) => Some(Action::PasteText(text.clone())),
        Event::Resize(..) => {
            state.dirty = true;
            Some(Action::None)
        }
        _ => Some(Action::None),
    }
}

fn handle_key(key: &KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl {
        return match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') => None,
            KeyCode::Char('y') => Some(Action::CopyFocusedCode),
            KeyCode::Char('u') => Some(Action::ClearInput),
            KeyCode::Char('a') => Some(Action::CursorHome),
            KeyCode::Char('e') => Some(Action::CursorEnd),
            _ => Some(Action::None),
        };
    }

    // Alt+1..4 loads the matching example prompt
    if alt {
        if let KeyCode::Char(c) = key.code
            && let Some(digit) = c.to_digit(10)
            && (1..=ACTIVE_PROMPT_COUNT as u32).contains(&digit)
        {
            return Some(Action::PickPrompt(digit as usize - 1));
        }
        return Some(Action::None);
    }

    let action = match key.code {
        KeyCode::Esc => return None,
        KeyCode::Enter => Action::Submit,
        KeyCode::Char(c) => Action::InputChar(c),
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Delete => Action::InputDelete,
        KeyCode::Left => Action::CursorLeft,
        KeyCode::Right => Action::CursorRight,
        KeyCode::Home => Action::CursorHome,
        KeyCode::End => Action::CursorEnd,
        KeyCode::Up => Action::ScrollUp(SCROLL_LINES),
        KeyCode::Down => Action::ScrollDown(SCROLL_LINES),
        KeyCode::PageUp => Action::ScrollUp(SCROLL_PAGE_LINES),
        KeyCode::PageDown => Action::ScrollDown(SCROLL_PAGE_LINES),
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Action::FocusPrevCode,
        KeyCode::Tab => Action::FocusNextCode,
        KeyCode::BackTab => Action::FocusPrevCode,
        _ => Action::None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn map(event: Event) -> Option<Action> {
        let mut state = State::for_tests();
        handle_event(&event, &mut state)
    }

    #[test]
    fn quit_keys() {
        assert_eq!(map(key(KeyCode::Char('q'), KeyModifiers::CONTROL)), None);
        assert_eq!(map(key(KeyCode::Esc, KeyModifiers::NONE)), None);
    }

    #[test]
    fn typing_and_submit() {
        assert_eq!(map(key(KeyCode::Char('x'), KeyModifiers::NONE)), Some(Action::InputChar('x')));
        assert_eq!(map(key(KeyCode::Char('X'), KeyModifiers::SHIFT)), Some(Action::InputChar('X')));
        assert_eq!(map(key(KeyCode::Enter, KeyModifiers::NONE)), Some(Action::Submit));
    }

    #[test]
    fn alt_digits_pick_prompts() {
        assert_eq!(map(key(KeyCode::Char('1'), KeyModifiers::ALT)), Some(Action::PickPrompt(0)));
        assert_eq!(map(key(KeyCode::Char('4'), KeyModifiers::ALT)), Some(Action::PickPrompt(3)));
        assert_eq!(map(key(KeyCode::Char('5'), KeyModifiers::ALT)), Some(Action::None));
        assert_eq!(map(key(KeyCode::Char('0'), KeyModifiers::ALT)), Some(Action::None));
    }

    #[test]
    fn code_focus_and_copy() {
        assert_eq!(map(key(KeyCode::Tab, KeyModifiers::NONE)), Some(Action::FocusNextCode));
        assert_eq!(map(key(KeyCode::BackTab, KeyModifiers::SHIFT)), Some(Action::FocusPrevCode));
        assert_eq!(map(key(KeyCode::Char('y'), KeyModifiers::CONTROL)), Some(Action::CopyFocusedCode));
    }

    #[test]
    fn paste_passes_through() {
        assert_eq!(map(Event::Paste("abc".into())), Some(Action::PasteText("abc".into())));
    }
}
