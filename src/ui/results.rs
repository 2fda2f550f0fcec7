use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::UnicodeWidthStr;

use dg_base::code_block::Section;
use dg_base::config::{self, chars, theme};
use dg_base::markdown::{sanitize_link, sanitize_text};
use dg_base::pointer::{ClickAction, TargetKind};
use dg_base::search::DisplayedAnswer;

use super::helpers::{format_elapsed, spinner, truncate_string};
use super::markdown::{CodeContext, DocLines, paint_markdown};
use crate::state::State;

pub fn render_results(frame: &mut Frame, state: &mut State, area: Rect) {
    let base_style = Style::default().bg(theme::bg_surface());

    // Add margin around the panel
    let inner_area = Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), area.height);

    let title = if state.search.displayed().is_some() { " Answer " } else { " DocsGPT " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::border()))
        .style(base_style)
        .title(Span::styled(title, Style::default().fg(theme::accent()).bold()))
        .title_alignment(Alignment::Left);

    let content_area = block.inner(inner_area);
    frame.render_widget(block, inner_area);

    // One column of margin on the left, two on the right for the scrollbar
    let doc_area = Rect::new(
        content_area.x + 1,
        content_area.y,
        content_area.width.saturating_sub(3),
        content_area.height,
    );
    let doc = build_document(state, doc_area.width as usize);

    let content_height = doc.lines.len();
    let viewport_height = doc_area.height as usize;
    let max_scroll = content_height.saturating_sub(viewport_height) as u16;
    state.max_scroll = max_scroll;
    state.scroll_offset = state.scroll_offset.min(max_scroll);
    let scroll = state.scroll_offset;

    register_anchors(state, &doc, doc_area, scroll);

    let paragraph = Paragraph::new(doc.lines).style(base_style).scroll((scroll, 0));
    frame.render_widget(paragraph, doc_area);

    if content_height > viewport_height {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .style(Style::default().fg(theme::bg_elevated()))
            .thumb_style(Style::default().fg(theme::accent_dim()));

        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize).position(scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            inner_area.inner(Margin { horizontal: 0, vertical: 1 }),
            &mut scrollbar_state,
        );
    }
}

/// Map the anchors that are inside the viewport to screen cells.
fn register_anchors(state: &mut State, doc: &DocLines, area: Rect, scroll: u16) {
    let first = scroll as usize;
    let last = first + area.height as usize;
    for anchor in doc.anchors.iter().filter(|a| a.line >= first && a.line < last) {
        let x = area.x.saturating_add(anchor.x);
        let right = area.right();
        if x >= right {
            continue;
        }
        let width = anchor.width.min(right - x);
        let y = area.y + (anchor.line - first) as u16;
        state.hits.register(Rect::new(x, y, width, 1), anchor.kind, anchor.action.clone());
    }
}

/// Lay out the whole scrollable document at `width` columns.
pub fn build_document(state: &State, width: usize) -> DocLines {
    let mut out = DocLines::default();
    let code = CodeContext { registry: &state.code_blocks, focused: state.focused_code };

    match state.search.displayed() {
        Some(answer) => paint_answer(&answer, width, &code, &mut out),
        None if state.search.is_busy() => {
            out.blank();
            out.push(Line::from(Span::styled(
                format!("{} Searching documentation...", spinner(state.spinner_frame)),
                Style::default().fg(theme::text_muted()).italic(),
            )));
        }
        None => paint_welcome(&mut out),
    }

    // Padding at end for scroll
    out.blank();
    out
}

fn paint_welcome(out: &mut DocLines) {
    out.blank();
    out.push(Line::from(Span::styled("Intelligent Documentation Search", Style::default().fg(theme::accent()).bold())));
    out.push(Line::from(Span::styled(
        "Get comprehensive answers from technical documentation across the web",
        Style::default().fg(theme::text_muted()),
    )));
    out.blank();
    out.push(Line::from(Span::styled(
        "Type a question above, or pick an example prompt with Alt+1..4.",
        Style::default().fg(theme::text_muted()).italic(),
    )));
}

fn rule(width: usize) -> Line<'static> {
    Line::from(Span::styled(chars::HORIZONTAL.repeat(width), Style::default().fg(theme::border())))
}

fn paint_answer(answer: &DisplayedAnswer<'_>, width: usize, code: &CodeContext<'_>, out: &mut DocLines) {
    for (i, result) in answer.results.iter().enumerate() {
        if i > 0 {
            out.blank();
            out.push(rule(width));
            out.blank();
        }
        if let Some(title) = &result.title {
            let title = truncate_string(&sanitize_text(title), width);
            out.push(Line::from(Span::styled(title, Style::default().fg(theme::accent()).bold())));
            out.blank();
        }
        paint_markdown(&result.explanation, Section::Result(i), width, code, out);
        paint_sources(&result.sources, width, out);
    }

    if !answer.response.trim().is_empty() {
        if !answer.results.is_empty() {
            out.blank();
            out.push(rule(width));
            out.blank();
        }
        out.push(Line::from(vec![
            Span::styled(format!("{} ", config::icon("sparkles")), Style::default().fg(theme::accent())),
            Span::styled("Response", Style::default().fg(theme::accent()).bold()),
        ]));
        out.blank();
        paint_markdown(answer.response, Section::Response, width, code, out);
    } else if answer.results.is_empty() {
        out.push(Line::from(Span::styled(
            "The service returned an empty answer.",
            Style::default().fg(theme::text_muted()).italic(),
        )));
    }

    out.blank();
    out.push(Line::from(Span::styled(
        format!("{} Generated in {}", config::icon("clock"), format_elapsed(answer.meta.elapsed)),
        Style::default().fg(theme::text_muted()),
    )));
}

fn paint_sources(sources: &[String], width: usize, out: &mut DocLines) {
    let links: Vec<String> = sources.iter().filter_map(|s| sanitize_link(s)).collect();
    if links.is_empty() {
        return;
    }

    out.blank();
    out.push(Line::from(Span::styled("Sources", Style::default().fg(theme::text_secondary()).bold())));

    let arrow = format!("{} ", config::icon("source"));
    let arrow_width = arrow.width();
    for link in links {
        let shown = truncate_string(&link, width.saturating_sub(arrow_width));
        out.anchor_next(arrow_width, shown.width(), TargetKind::Link, ClickAction::CopyLink(link));
        out.push(Line::from(vec![
            Span::styled(arrow.clone(), Style::default().fg(theme::accent_dim())),
            Span::styled(shown, Style::default().fg(theme::link()).underlined()),
        ]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_base::code_block::CodeKey;
    use dg_base::search::{SearchAnswer, SearchResult};
    use std::time::{Duration, Instant};

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn answered(answer: SearchAnswer) -> State {
        let mut state = State::for_tests();
        let t0 = Instant::now();
        let ticket = state.search.submit("q", t0).unwrap();
        state.search.resolve(ticket.seq, Ok(answer), t0 + Duration::from_millis(800));
        state.sync_code_blocks();
        state
    }

    #[test]
    fn welcome_when_nothing_asked() {
        let doc = build_document(&State::for_tests(), 60);
        assert!(doc.lines.iter().any(|l| text_of(l).contains("Intelligent Documentation Search")));
        assert!(doc.anchors.is_empty());
    }

    #[test]
    fn sources_become_link_anchors() {
        let state = answered(SearchAnswer {
            results: vec![SearchResult {
                title: None,
                explanation: "See docs.".into(),
                sources: vec!["https://docs.rs".into(), "javascript:alert(1)".into()],
            }],
            response: String::new(),
        });
        let doc = build_document(&state, 60);
        let links: Vec<_> = doc.anchors.iter().filter(|a| a.kind == TargetKind::Link).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].action, ClickAction::CopyLink("https://docs.rs".into()));
        assert!(text_of(&doc.lines[links[0].line]).ends_with("https://docs.rs"));
    }

    #[test]
    fn response_card_shows_generation_time() {
        let state = answered(SearchAnswer { results: Vec::new(), response: "Use OAuth2.".into() });
        let lines: Vec<String> = build_document(&state, 60).lines.iter().map(text_of).collect();
        assert!(lines.iter().any(|l| l == "Use OAuth2."));
        assert!(lines.iter().any(|l| l.ends_with("Generated in 0.8s")));
    }

    #[test]
    fn code_in_results_and_response_is_keyed_by_section() {
        let state = answered(SearchAnswer {
            results: vec![SearchResult {
                title: Some("No Results".into()),
                explanation: "```py\nx = 1\n```".into(),
                sources: Vec::new(),
            }],
            response: "```js\nconst x=1;\n```".into(),
        });
        let doc = build_document(&state, 50);
        let keys: Vec<_> = doc
            .anchors
            .iter()
            .filter_map(|a| match a.action {
                ClickAction::CopyCode(key) => Some(key),
                _ => None,
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                CodeKey { section: Section::Result(0), ordinal: 0 },
                CodeKey { section: Section::Response, ordinal: 0 },
            ]
        );
        assert_eq!(state.code_blocks.len(), 2);
    }

    #[test]
    fn only_visible_anchors_are_registered() {
        let mut state = answered(SearchAnswer { results: Vec::new(), response: "```sh\nls\n```".into() });
        let doc = build_document(&state, 40);
        let line = doc.anchors[0].line as u16;
        let area = Rect::new(2, 10, 40, 5);

        register_anchors(&mut state, &doc, area, 0);
        assert_eq!(state.hits.len(), 1);
        let key = CodeKey { section: Section::Response, ordinal: 0 };
        let (_, action) = state.hits.hit_test(41, 10 + line).unwrap();
        assert_eq!(action, &ClickAction::CopyCode(key));

        state.hits.clear();
        register_anchors(&mut state, &doc, area, line + 1);
        assert!(state.hits.is_empty());
    }
}
