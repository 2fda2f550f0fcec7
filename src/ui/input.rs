use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use dg_base::config::constants::{ACTIVE_PROMPT_COUNT, SEARCH_BUTTON_WIDTH};
use dg_base::config::{self, chars, theme};
use dg_base::pointer::{ClickAction, TargetKind};

use super::helpers::{spinner, truncate_string};
use crate::state::{HealthStatus, State};

const PLACEHOLDER: &str = "What would you like to learn about?";

/// Rows taken by the example prompt grid: title plus two rows of chips.
pub const PROMPT_GRID_HEIGHT: u16 = 3;

pub fn render_header(frame: &mut Frame, state: &State, area: Rect) {
    let base_style = Style::default().bg(theme::bg_base()).fg(theme::text_muted());

    let mut spans = vec![
        Span::styled(" ", base_style),
        Span::styled(format!("{} ", config::icon("book")), Style::default().fg(theme::accent()).bg(theme::bg_base())),
        Span::styled("DocsGPT", Style::default().fg(theme::accent()).bg(theme::bg_base()).bold()),
        Span::styled("  ", base_style),
    ];

    let (label, style) = match &state.health {
        HealthStatus::Checking => ("CHECKING".to_string(), Style::default().fg(theme::text()).bg(theme::bg_elevated())),
        HealthStatus::Healthy(status) => (
            format!("{} {}", chars::CHECK, status.to_uppercase()),
            Style::default().fg(theme::bg_base()).bg(theme::success()).bold(),
        ),
        HealthStatus::Unreachable(_) => (
            format!("{} OFFLINE", chars::CROSS),
            Style::default().fg(theme::bg_base()).bg(theme::error()).bold(),
        ),
    };
    spans.push(Span::styled(format!(" {} ", label), style));
    spans.push(Span::styled(" ", base_style));

    // Service address on the right
    let left_width: usize = spans.iter().map(|s| s.content.width()).sum();
    let room = (area.width as usize).saturating_sub(left_width + 1);
    let url = truncate_string(&state.api_base_url, room);
    let padding = room.saturating_sub(url.width());
    spans.push(Span::styled(" ".repeat(padding), base_style));
    spans.push(Span::styled(url, base_style));
    spans.push(Span::styled(" ", base_style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn render_search_row(frame: &mut Frame, state: &mut State, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SEARCH_BUTTON_WIDTH)])
        .split(Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), area.height));

    render_query_input(frame, state, layout[0]);
    render_search_button(frame, state, layout[1]);
}

fn render_query_input(frame: &mut Frame, state: &mut State, area: Rect) {
    let typing = state.typing.is_typing();
    let border = if typing { theme::border_focus() } else { theme::border() };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme::bg_surface()))
        .title(Span::styled(" Search Documentation ", Style::default().fg(theme::text_muted())));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    state.hits.register(area, TargetKind::TextInput, ClickAction::FocusInput);

    let prefix = format!("{} ", config::icon("search"));
    let prefix_width = prefix.width();
    let mut spans = vec![Span::styled(prefix, Style::default().fg(theme::accent_dim()))];

    if state.input.is_empty() {
        spans.push(Span::styled(PLACEHOLDER, Style::default().fg(theme::text_muted()).italic()));
    } else {
        spans.push(Span::styled(state.input.clone(), Style::default().fg(theme::text())));
    }

    // Keep the cursor in view on long queries
    let before_cursor = state.input[..state.input_cursor].width();
    let room = (inner.width as usize).saturating_sub(prefix_width + 1);
    let shift = before_cursor.saturating_sub(room);

    let paragraph = Paragraph::new(Line::from(spans)).scroll((0, shift as u16));
    frame.render_widget(paragraph, inner);

    let cursor_x = inner.x + (prefix_width + before_cursor - shift) as u16;
    if cursor_x < inner.right() {
        frame.set_cursor_position(Position::new(cursor_x, inner.y));
    }
}

fn render_search_button(frame: &mut Frame, state: &mut State, area: Rect) {
    let busy = state.search.is_busy();
    let (label, style) = if busy {
        (
            spinner(state.spinner_frame).to_string(),
            Style::default().fg(theme::text_muted()).bg(theme::bg_elevated()),
        )
    } else {
        ("Search".to_string(), Style::default().fg(theme::bg_base()).bg(theme::accent()).bold())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if busy { theme::border() } else { theme::accent() }))
        .style(style);

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(Span::styled(label, style)).alignment(Alignment::Center), inner);

    // Disabled while a search is in flight
    if !busy {
        state.hits.register(area, TargetKind::Button, ClickAction::SubmitSearch);
    }
}

/// "Try asking about:" with the active example prompts in a 2x2 grid.
pub fn render_prompt_grid(frame: &mut Frame, state: &mut State, area: Rect) {
    if area.height == 0 {
        return;
    }
    let area = Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), area.height);

    let title = Line::from(vec![
        Span::styled(format!("{} ", config::icon("sparkles")), Style::default().fg(theme::accent())),
        Span::styled("Try asking about:", Style::default().fg(theme::text_secondary())),
    ]);
    frame.render_widget(Paragraph::new(title), Rect::new(area.x, area.y, area.width, 1));

    let half = area.width / 2;
    for (i, entry) in state.prompts.active_set().iter().take(ACTIVE_PROMPT_COUNT).enumerate() {
        let row = 1 + (i / 2) as u16;
        if row >= area.height {
            break;
        }
        let x = area.x + (i % 2) as u16 * half;
        let cell = Rect::new(x, area.y + row, half.saturating_sub(1), 1);

        let key = format!(" Alt+{} ", i + 1);
        let icon = format!(" {} ", config::icon(&entry.icon));
        let used = key.width() + icon.width();
        let text = truncate_string(&entry.text, (cell.width as usize).saturating_sub(used + 1));
        let line = Line::from(vec![
            Span::styled(key, Style::default().fg(theme::text_muted()).bg(theme::bg_elevated())),
            Span::styled(icon, Style::default().fg(theme::accent())),
            Span::styled(text, Style::default().fg(theme::text())),
        ]);
        frame.render_widget(Paragraph::new(line), cell);
        state.hits.register(cell, TargetKind::Clickable, ClickAction::PickPrompt(i));
    }
}

pub fn render_error_banner(frame: &mut Frame, state: &State, area: Rect) {
    let Some(message) = state.search.error_message() else {
        return;
    };
    let style = Style::default().fg(theme::bg_base()).bg(theme::error());
    let text = truncate_string(message, (area.width as usize).saturating_sub(10));
    let line = Line::from(vec![
        Span::styled(format!(" {} Error ", chars::CROSS), style.bold()),
        Span::styled(format!(" {} ", text), style),
    ]);
    frame.render_widget(Paragraph::new(line).style(style), area);
}

pub fn render_status_bar(frame: &mut Frame, state: &State, area: Rect) {
    let base_style = Style::default().bg(theme::bg_base()).fg(theme::text_muted());

    let mut spans = vec![Span::styled(" ", base_style)];

    if state.search.is_busy() {
        spans.push(Span::styled(
            format!(" {} SEARCHING ", spinner(state.spinner_frame)),
            Style::default().fg(theme::bg_base()).bg(theme::success()).bold(),
        ));
    } else {
        spans.push(Span::styled(" READY ", Style::default().fg(theme::bg_base()).bg(theme::text_muted()).bold()));
    }
    spans.push(Span::styled(" ", base_style));

    if !state.code_blocks.is_empty() {
        spans.push(Span::styled(
            format!(" {} code ", state.code_blocks.len()),
            Style::default().fg(theme::text()).bg(theme::bg_elevated()),
        ));
        spans.push(Span::styled(" ", base_style));
    }

    if let Some(notice) = state.notice() {
        spans.push(Span::styled(format!(" {} ", notice), Style::default().fg(theme::bg_base()).bg(theme::accent_dim())));
        spans.push(Span::styled(" ", base_style));
    }

    // Right side key hints
    let hints = "Enter search  Tab code  Ctrl+Y copy  Esc quit ";
    let left_width: usize = spans.iter().map(|s| s.content.width()).sum();
    let padding = (area.width as usize).saturating_sub(left_width + hints.len());
    if padding > 0 {
        spans.push(Span::styled(" ".repeat(padding), base_style));
        spans.push(Span::styled(hints, base_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
