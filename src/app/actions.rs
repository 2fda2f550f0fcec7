use std::time::Instant;

use dg_base::code_block::CodeKey;
use dg_base::search::SearchTicket;

use crate::state::State;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    InputChar(char),
    InputBackspace,
    InputDelete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    ClearInput,
    PasteText(String),
    Submit,
    /// Load an example prompt into the input (by active-set index)
    PickPrompt(usize),
    ScrollUp(u16),
    ScrollDown(u16),
    FocusNextCode,
    FocusPrevCode,
    CopyFocusedCode,
    CopyCode(CodeKey),
    CopyLink(String),
}

/// Side effects the app loop performs after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Nothing,
    /// Send this query to the answering service
    Search(SearchTicket),
    CopyCode(CodeKey),
    CopyText(String),
}

pub fn apply_action(state: &mut State, action: Action, now: Instant) -> ActionResult {
    match action {
        Action::None => return ActionResult::Nothing,
        Action::InputChar(c) => {
            state.input.insert(state.input_cursor, c);
            state.input_cursor += c.len_utf8();
            state.typing.keystroke(now);
        }
        Action::PasteText(text) => {
            // Single-line input: newlines become spaces
            let text: String = text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }).collect();
            state.input.insert_str(state.input_cursor, &text);
            state.input_cursor += text.len();
            state.typing.keystroke(now);
        }
        Action::InputBackspace => {
            if let Some(prev) = prev_boundary(&state.input, state.input_cursor) {
                state.input.replace_range(prev..state.input_cursor, "");
                state.input_cursor = prev;
                state.typing.keystroke(now);
            }
        }
        Action::InputDelete => {
            if let Some(next) = next_boundary(&state.input, state.input_cursor) {
                state.input.replace_range(state.input_cursor..next, "");
                state.typing.keystroke(now);
            }
        }
        Action::CursorLeft => {
            if let Some(prev) = prev_boundary(&state.input, state.input_cursor) {
                state.input_cursor = prev;
            }
        }
        Action::CursorRight => {
            if let Some(next) = next_boundary(&state.input, state.input_cursor) {
                state.input_cursor = next;
            }
        }
        Action::CursorHome => state.input_cursor = 0,
        Action::CursorEnd => state.input_cursor = state.input.len(),
        Action::ClearInput => {
            state.input.clear();
            state.input_cursor = 0;
        }
        Action::Submit => {
            if state.search.is_busy() {
                return ActionResult::Nothing;
            }
            let Some(ticket) = state.search.submit(&state.input, now) else {
                return ActionResult::Nothing;
            };
            state.typing.cancel();
            state.dirty = true;
            return ActionResult::Search(ticket);
        }
        Action::PickPrompt(index) => {
            if let Some(entry) = state.prompts.active_set().get(index) {
                state.input = entry.text.clone();
                state.input_cursor = state.input.len();
            }
        }
        Action::ScrollUp(n) => state.scroll_offset = state.scroll_offset.saturating_sub(n),
        Action::ScrollDown(n) => state.scroll_offset = state.scroll_offset.saturating_add(n).min(state.max_scroll),
        Action::FocusNextCode => state.focused_code = cycle_focus(state, true),
        Action::FocusPrevCode => state.focused_code = cycle_focus(state, false),
        Action::CopyFocusedCode => {
            state.dirty = true;
            return match state.focused_code {
                Some(key) => ActionResult::CopyCode(key),
                None => ActionResult::Nothing,
            };
        }
        Action::CopyCode(key) => {
            state.focused_code = Some(key);
            state.dirty = true;
            return ActionResult::CopyCode(key);
        }
        Action::CopyLink(url) => return ActionResult::CopyText(url),
    }
    state.dirty = true;
    ActionResult::Nothing
}

fn cycle_focus(state: &State, forward: bool) -> Option<CodeKey> {
    let keys = state.code_blocks.keys();
    if keys.is_empty() {
        return None;
    }
    let current = state.focused_code.and_then(|k| keys.iter().position(|c| *c == k));
    let index = match (current, forward) {
        (None, true) => 0,
        (None, false) => keys.len() - 1,
        (Some(i), true) => (i + 1) % keys.len(),
        (Some(i), false) => (i + keys.len() - 1) % keys.len(),
    };
    Some(keys[index])
}

fn prev_boundary(s: &str, cursor: usize) -> Option<usize> {
    s[..cursor].char_indices().next_back().map(|(i, _)| i)
}

fn next_boundary(s: &str, cursor: usize) -> Option<usize> {
    s[cursor..].chars().next().map(|c| cursor + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_base::code_block::Section;
    use dg_base::search::{SearchAnswer, SearchRequestState};

    fn type_str(state: &mut State, text: &str, now: Instant) {
        for c in text.chars() {
            apply_action(state, Action::InputChar(c), now);
        }
    }

    #[test]
    fn editing_handles_multibyte_chars() {
        let mut state = State::for_tests();
        let now = Instant::now();
        type_str(&mut state, "héllo", now);
        apply_action(&mut state, Action::CursorLeft, now);
        apply_action(&mut state, Action::CursorLeft, now);
        apply_action(&mut state, Action::CursorLeft, now);
        apply_action(&mut state, Action::InputBackspace, now);
        assert_eq!(state.input, "hllo");
        apply_action(&mut state, Action::InputDelete, now);
        assert_eq!(state.input, "hlo");
        apply_action(&mut state, Action::CursorEnd, now);
        assert_eq!(state.input_cursor, 3);
        assert!(state.typing.is_typing());
    }

    #[test]
    fn blank_submit_is_a_no_op() {
        let mut state = State::for_tests();
        let now = Instant::now();
        type_str(&mut state, "   ", now);
        assert_eq!(apply_action(&mut state, Action::Submit, now), ActionResult::Nothing);
        assert_eq!(state.search.state(), &SearchRequestState::Idle);
    }

    #[test]
    fn submit_issues_a_ticket_and_blocks_resubmission() {
        let mut state = State::for_tests();
        let now = Instant::now();
        type_str(&mut state, " How to implement authentication? ", now);
        let ActionResult::Search(ticket) = apply_action(&mut state, Action::Submit, now) else {
            panic!("expected a search");
        };
        assert_eq!(ticket.query, "How to implement authentication?");
        assert!(state.search.is_busy());
        assert!(!state.typing.is_typing());
        assert_eq!(apply_action(&mut state, Action::Submit, now), ActionResult::Nothing);
    }

    #[test]
    fn picking_a_prompt_fills_the_input_only() {
        let mut state = State::for_tests();
        let now = Instant::now();
        state.prompts.start(now);
        let expected = state.prompts.active_set()[2].text.clone();
        assert_eq!(apply_action(&mut state, Action::PickPrompt(2), now), ActionResult::Nothing);
        assert_eq!(state.input, expected);
        assert_eq!(state.input_cursor, expected.len());
        assert_eq!(state.search.state(), &SearchRequestState::Idle);

        apply_action(&mut state, Action::PickPrompt(9), now);
        assert_eq!(state.input, expected);
    }

    #[test]
    fn paste_flattens_newlines() {
        let mut state = State::for_tests();
        apply_action(&mut state, Action::PasteText("a\nb\r\nc".into()), Instant::now());
        assert_eq!(state.input, "a b  c");
    }

    #[test]
    fn scroll_is_clamped() {
        let mut state = State::for_tests();
        let now = Instant::now();
        state.max_scroll = 10;
        apply_action(&mut state, Action::ScrollDown(15), now);
        assert_eq!(state.scroll_offset, 10);
        apply_action(&mut state, Action::ScrollUp(3), now);
        assert_eq!(state.scroll_offset, 7);
        apply_action(&mut state, Action::ScrollUp(30), now);
        assert_eq!(state.scroll_offset, 0);
    }

    #[test]
    fn focus_cycles_through_code_blocks() {
        let mut state = State::for_tests();
        let now = Instant::now();
        assert_eq!(apply_action(&mut state, Action::CopyFocusedCode, now), ActionResult::Nothing);

        let ticket = state.search.submit("q", now).unwrap();
        let answer = SearchAnswer { results: Vec::new(), response: "```a\n1\n```\n\n```b\n2\n```".into() };
        state.search.resolve(ticket.seq, Ok(answer), now);
        state.sync_code_blocks();

        let first = CodeKey { section: Section::Response, ordinal: 0 };
        let second = CodeKey { section: Section::Response, ordinal: 1 };
        apply_action(&mut state, Action::FocusNextCode, now);
        assert_eq!(state.focused_code, Some(first));
        apply_action(&mut state, Action::FocusNextCode, now);
        assert_eq!(state.focused_code, Some(second));
        apply_action(&mut state, Action::FocusNextCode, now);
        assert_eq!(state.focused_code, Some(first));
        apply_action(&mut state, Action::FocusPrevCode, now);
        assert_eq!(state.focused_code, Some(second));
        assert_eq!(apply_action(&mut state, Action::CopyFocusedCode, now), ActionResult::CopyCode(second));
    }

    #[test]
    fn link_click_copies_the_url() {
        let mut state = State::for_tests();
        let result = apply_action(&mut state, Action::CopyLink("https://docs.rs".into()), Instant::now());
        assert_eq!(result, ActionResult::CopyText("https://docs.rs".into()));
    }
}
