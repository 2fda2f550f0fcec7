mod cursor;
mod helpers;
mod highlight;
mod input;
mod markdown;
mod results;

use ratatui::{prelude::*, widgets::Block};

use dg_base::config::constants::SEARCH_ROW_HEIGHT;
use dg_base::config::theme;

use crate::state::State;

/// Draw one frame. Interactive regions are registered into `state.hits`
/// as they are painted, so the hit map always matches the screen.
pub fn render(frame: &mut Frame, state: &mut State) {
    let area = frame.area();
    state.hits.clear();

    // Fill base background
    frame.render_widget(Block::default().style(Style::default().bg(theme::bg_base())), area);

    let banner_height = if state.search.error_message().is_some() { 1 } else { 0 };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                         // Header
            Constraint::Length(SEARCH_ROW_HEIGHT),         // Search row
            Constraint::Length(input::PROMPT_GRID_HEIGHT), // Example prompts
            Constraint::Length(banner_height),             // Error banner
            Constraint::Min(1),                            // Results
            Constraint::Length(1),                         // Status bar
        ])
        .split(area);

    input::render_header(frame, state, layout[0]);
    input::render_search_row(frame, state, layout[1]);
    input::render_prompt_grid(frame, state, layout[2]);
    input::render_error_banner(frame, state, layout[3]);
    results::render_results(frame, state, layout[4]);
    input::render_status_bar(frame, state, layout[5]);

    cursor::render_cursor(frame, state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_base::pointer::{ClickAction, TargetKind};
    use dg_base::search::SearchError;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::time::Instant;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn frame_registers_controls() {
        let mut state = State::for_tests();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, &mut state)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("DocsGPT"));
        assert!(text.contains("Try asking about:"));
        assert!(text.contains("Search"));

        // Query input on the search row
        let (kind, action) = state.hits.hit_test(5, 2).unwrap();
        assert_eq!(kind, TargetKind::TextInput);
        assert_eq!(action, &ClickAction::FocusInput);

        let prompts = (0..4).filter(|i| {
            (0..100).any(|x| (0..30).any(|y| state.hits.hit_test(x, y).map(|(_, a)| a) == Some(&ClickAction::PickPrompt(*i))))
        });
        assert_eq!(prompts.count(), 4);
    }

    #[test]
    fn busy_search_hides_the_button_target() {
        let mut state = State::for_tests();
        state.search.submit("q", Instant::now()).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, &mut state)).unwrap();

        let submit_regions = (0..100).filter(|&x| state.hits.hit_test(x, 2).map(|(_, a)| a) == Some(&ClickAction::SubmitSearch));
        assert_eq!(submit_regions.count(), 0);
        assert!(screen_text(&terminal).contains("SEARCHING"));
    }

    #[test]
    fn failure_shows_the_banner() {
        let mut state = State::for_tests();
        let ticket = state.search.submit("q", Instant::now()).unwrap();
        let err = SearchError::Api { status: 500, message: Some("rate limited".into()) };
        state.search.resolve(ticket.seq, Err(err), Instant::now());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, &mut state)).unwrap();
        assert!(screen_text(&terminal).contains("rate limited"));
    }
}
