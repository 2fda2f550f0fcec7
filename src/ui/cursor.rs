use ratatui::prelude::*;

use dg_base::config::{active_theme, theme};
use dg_base::pointer::PointerSample;

use crate::state::State;

/// Draw the pointer ring and its trail over the finished frame.
pub fn render_cursor(frame: &mut Frame, state: &State) {
    let Some(sample) = state.pointer.sample() else {
        return;
    };
    let area = frame.area();
    let glyphs = &active_theme().cursor;
    let buf = frame.buffer_mut();

    // Trail first so the ring lands on top; the newest entry is the ring itself
    let trail: Vec<(u16, u16)> = state.pointer.trail().collect();
    let trail_style = Style::default().fg(theme::accent_dim());
    for &(x, y) in trail.iter().rev().skip(1) {
        if area.contains(Position::new(x, y)) && (x, y) != (sample.x, sample.y) {
            buf[(x, y)].set_symbol(&glyphs.trail).set_style(trail_style);
        }
    }

    if !area.contains(Position::new(sample.x, sample.y)) {
        return;
    }
    let (symbol, style) = ring(sample, glyphs);
    buf[(sample.x, sample.y)].set_symbol(symbol).set_style(style);
}

fn ring(sample: PointerSample, glyphs: &dg_base::config::CursorGlyphs) -> (&str, Style) {
    if sample.over_text_input {
        (glyphs.text_input.as_str(), Style::default().fg(theme::accent()))
    } else if sample.over_interactive {
        (glyphs.ring_active.as_str(), Style::default().fg(theme::accent()).bold())
    } else {
        (glyphs.ring.as_str(), Style::default().fg(theme::text_secondary()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_base::pointer::{ClickAction, HitMap, PointerSource, TargetKind};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::io;

    struct NullSource;

    impl PointerSource for NullSource {
        fn subscribe(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn unsubscribe(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn draw(state: &State) -> ratatui::buffer::Buffer {
        let mut terminal = Terminal::new(TestBackend::new(20, 5)).unwrap();
        terminal.draw(|frame| render_cursor(frame, state)).unwrap();
        terminal.backend().buffer().clone()
    }

    #[test]
    fn nothing_drawn_before_first_move() {
        let state = State::for_tests();
        let buf = draw(&state);
        assert!(buf.content().iter().all(|c| c.symbol() == " "));
    }

    #[test]
    fn ring_and_trail_follow_committed_positions() {
        let mut state = State::for_tests();
        state.pointer.start(&mut NullSource).unwrap();
        let hits = HitMap::new();
        for x in [1, 2, 3] {
            state.pointer.on_move(x, 1, &hits);
            state.pointer.commit_frame();
        }
        let buf = draw(&state);
        let glyphs = &active_theme().cursor;
        assert_eq!(buf[(3, 1)].symbol(), glyphs.ring);
        assert_eq!(buf[(2, 1)].symbol(), glyphs.trail);
        assert_eq!(buf[(1, 1)].symbol(), glyphs.trail);
    }

    #[test]
    fn ring_changes_over_targets() {
        let mut state = State::for_tests();
        state.pointer.start(&mut NullSource).unwrap();
        let mut hits = HitMap::new();
        hits.register(Rect::new(0, 0, 10, 1), TargetKind::TextInput, ClickAction::FocusInput);
        hits.register(Rect::new(0, 2, 10, 1), TargetKind::Button, ClickAction::SubmitSearch);
        let glyphs = &active_theme().cursor;

        state.pointer.on_move(4, 0, &hits);
        state.pointer.commit_frame();
        assert_eq!(draw(&state)[(4, 0)].symbol(), glyphs.text_input);

        state.pointer.on_move(4, 2, &hits);
        state.pointer.commit_frame();
        assert_eq!(draw(&state)[(4, 2)].symbol(), glyphs.ring_active);
    }

    #[test]
    fn off_screen_positions_are_skipped() {
        let mut state = State::for_tests();
        state.pointer.start(&mut NullSource).unwrap();
        state.pointer.on_move(200, 200, &HitMap::new());
        state.pointer.commit_frame();
        let buf = draw(&state);
        assert!(buf.content().iter().all(|c| c.symbol() == " "));
    }
}
