//! Paints rendered markdown blocks into pre-wrapped terminal lines.

use ratatui::prelude::*;
use unicode_width::UnicodeWidthStr;

use dg_base::code_block::{CodeBlockRegistry, CodeKey, Section};
use dg_base::config::{self, chars, theme};
use dg_base::markdown::{self, Align, CodeNode, DisplayBlock, InlineSpan, ListMarker, Table, TextKind, TextNode};
use dg_base::pointer::{ClickAction, TargetKind};

use super::helpers::{spans_width, wrap_spans};
use super::highlight::highlight_code;

pub const COPY_LABEL: &str = "Copy code";
pub const COPIED_LABEL: &str = "Copied!";

/// A clickable cell range inside the document, in document coordinates.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub line: usize,
    pub x: u16,
    pub width: u16,
    pub kind: TargetKind,
    pub action: ClickAction,
}

/// Lines of a scrollable document plus the clickable ranges on them.
#[derive(Debug, Default)]
pub struct DocLines {
    pub lines: Vec<Line<'static>>,
    pub anchors: Vec<Anchor>,
}

impl DocLines {
    pub fn push(&mut self, line: Line<'static>) {
        self.lines.push(line);
    }

    pub fn blank(&mut self) {
        self.lines.push(Line::default());
    }

    /// Anchor on the next line to be pushed.
    pub fn anchor_next(&mut self, x: usize, width: usize, kind: TargetKind, action: ClickAction) {
        self.anchors.push(Anchor { line: self.lines.len(), x: x as u16, width: width as u16, kind, action });
    }
}

/// Code-block context the painter needs from the screen state.
pub struct CodeContext<'a> {
    pub registry: &'a CodeBlockRegistry,
    pub focused: Option<CodeKey>,
}

/// Paint one markdown document of `section` at `width` columns.
pub fn paint_markdown(source: &str, section: Section, width: usize, code: &CodeContext<'_>, out: &mut DocLines) {
    let blocks = markdown::render(source);
    let mut ordinal = 0;
    let mut prev_was_item = false;

    for (i, block) in blocks.iter().enumerate() {
        let is_item = matches!(block, DisplayBlock::Text(TextNode { kind: TextKind::ListItem { .. }, .. }));
        if i > 0 && !(is_item && prev_was_item) {
            out.blank();
        }
        prev_was_item = is_item;

        match block {
            DisplayBlock::Text(node) => paint_text(node, width, out),
            DisplayBlock::Code(node) => {
                let key = CodeKey { section, ordinal };
                ordinal += 1;
                paint_code(node, key, code, width, out);
            }
        }
    }
}

fn base_style() -> Style {
    Style::default().fg(theme::text())
}

/// Convert parsed inline spans into styled terminal spans.
pub fn inline_spans(spans: &[InlineSpan], base: Style) -> Vec<Span<'static>> {
    spans
        .iter()
        .map(|s| {
            let mut style = base;
            if s.style.strong {
                style = style.bold();
            }
            if s.style.emphasis {
                style = style.italic();
            }
            if s.style.code {
                style = style.fg(theme::warning()).bg(theme::bg_code());
            }
            if s.link.is_some() {
                style = style.fg(theme::link()).underlined();
            }
            Span::styled(s.text.clone(), style)
        })
        .collect()
}

fn paint_text(node: &TextNode, width: usize, out: &mut DocLines) {
    match &node.kind {
        TextKind::Paragraph => paint_wrapped(&inline_spans(&node.spans, base_style()), width, &[], out),
        TextKind::Heading(level) => {
            let style = match level {
                1 => Style::default().fg(theme::accent()).bold(),
                2 => Style::default().fg(theme::accent()),
                3 => Style::default().fg(theme::accent()).italic(),
                _ => Style::default().fg(theme::text_secondary()).italic(),
            };
            paint_wrapped(&inline_spans(&node.spans, style), width, &[], out);
        }
        TextKind::ListItem { depth, marker } => {
            let bullet = match marker {
                ListMarker::Bullet => format!("{} ", chars::BULLET),
                ListMarker::Ordered(n) => format!("{}. ", n),
            };
            let prefix = vec![
                Span::raw("  ".repeat(*depth)),
                Span::styled(bullet, Style::default().fg(theme::accent_dim())),
            ];
            paint_wrapped(&inline_spans(&node.spans, base_style()), width, &prefix, out);
        }
        TextKind::Quote => {
            let prefix = vec![Span::styled(format!("{} ", chars::QUOTE_BAR), Style::default().fg(theme::accent_dim()))];
            let style = Style::default().fg(theme::text_secondary()).italic();
            paint_wrapped(&inline_spans(&node.spans, style), width, &prefix, out);
        }
        TextKind::Rule => {
            out.push(Line::from(Span::styled(chars::HORIZONTAL.repeat(width), Style::default().fg(theme::border()))));
        }
        TextKind::Preformatted => {
            let text = markdown::plain_text(&node.spans);
            let style = Style::default().fg(theme::text_secondary()).bg(theme::bg_code());
            for line in text.split('\n') {
                out.push(Line::from(vec![Span::styled("  ", style), Span::styled(line.replace('\t', "    "), style)]));
            }
        }
        TextKind::Table(table) => {
            for spans in paint_table(table) {
                out.push(Line::from(spans));
            }
        }
    }
}

/// Wrap `spans` so that the first line starts with `prefix` and the
/// continuation lines are indented to match it.
fn paint_wrapped(spans: &[Span<'static>], width: usize, prefix: &[Span<'static>], out: &mut DocLines) {
    let indent = spans_width(prefix);
    for (i, mut line) in wrap_spans(spans, width.saturating_sub(indent)).into_iter().enumerate() {
        let mut full = if i == 0 { prefix.to_vec() } else { vec![Span::raw(" ".repeat(indent))] };
        full.append(&mut line);
        out.push(Line::from(full));
    }
}

fn paint_code(node: &CodeNode, key: CodeKey, code: &CodeContext<'_>, width: usize, out: &mut DocLines) {
    let focused = code.focused == Some(key);
    let copied = code.registry.get(&key).is_some_and(|u| u.is_copied());

    // Header: language on the left, copy button on the right
    let label = if copied { format!("{} {}", chars::CHECK, COPIED_LABEL) } else { COPY_LABEL.to_string() };
    let button = format!(" {} ", label);
    let button_width = button.width();
    let lang = format!(" {} ", node.language);
    let fill = width.saturating_sub(lang.width() + button_width);

    let border = if focused { theme::border_focus() } else { theme::border() };
    let button_style = if copied {
        Style::default().fg(theme::bg_base()).bg(theme::success()).bold()
    } else if focused {
        Style::default().fg(theme::bg_base()).bg(theme::accent()).bold()
    } else {
        Style::default().fg(theme::text()).bg(theme::bg_elevated())
    };

    out.anchor_next(lang.width() + fill, button_width, TargetKind::Button, ClickAction::CopyCode(key));
    out.push(Line::from(vec![
        Span::styled(lang, Style::default().fg(theme::text_muted()).bg(theme::bg_code())),
        Span::styled(chars::HORIZONTAL.repeat(fill), Style::default().fg(border).bg(theme::bg_code())),
        Span::styled(button, button_style),
    ]));

    let display = markdown::sanitize_text(&node.source);
    let highlighted = highlight_code(&node.language, &display, &config::active_theme().syntax_theme);
    let bg = Style::default().bg(theme::bg_code());
    for pieces in highlighted.iter() {
        let mut spans = vec![Span::styled("│ ", Style::default().fg(border).bg(theme::bg_code()))];
        spans.extend(pieces.iter().map(|(color, text)| Span::styled(text.clone(), bg.fg(*color))));
        let used = spans_width(&spans);
        if used < width {
            spans.push(Span::styled(" ".repeat(width - used), bg));
        }
        out.push(Line::from(spans));
    }
}

/// Render a table with aligned columns.
pub fn paint_table(table: &Table) -> Vec<Vec<Span<'static>>> {
    let cols = table.header.len();
    let mut col_widths = vec![0usize; cols];
    for row in std::iter::once(&table.header).chain(table.rows.iter()) {
        for (col, cell) in row.iter().enumerate().take(cols) {
            col_widths[col] = col_widths[col].max(markdown::plain_text(cell).width());
        }
    }

    let sep_style = Style::default().fg(theme::border());
    let mut result: Vec<Vec<Span<'static>>> = Vec::new();

    let row_spans = |row: &[Vec<InlineSpan>], header: bool| -> Vec<Span<'static>> {
        let mut spans: Vec<Span<'static>> = Vec::new();
        for (col, width) in col_widths.iter().enumerate() {
            if col > 0 {
                spans.push(Span::styled(" │ ", sep_style));
            }
            let cell = row.get(col).map(|c| c.as_slice()).unwrap_or(&[]);
            let cell_width = markdown::plain_text(cell).width();
            let padding = width.saturating_sub(cell_width);
            let (left, right) = match table.align.get(col).copied().unwrap_or(Align::Left) {
                Align::Left => (0, padding),
                Align::Right => (padding, 0),
                Align::Center => (padding / 2, padding - padding / 2),
            };
            if left > 0 {
                spans.push(Span::raw(" ".repeat(left)));
            }
            if header {
                let style = Style::default().fg(theme::accent()).bold();
                spans.push(Span::styled(markdown::plain_text(cell), style));
            } else {
                spans.extend(inline_spans(cell, base_style()));
            }
            if right > 0 {
                spans.push(Span::raw(" ".repeat(right)));
            }
        }
        spans
    };

    result.push(row_spans(table.header.as_slice(), true));
    let mut sep: Vec<Span<'static>> = Vec::new();
    for (col, width) in col_widths.iter().enumerate() {
        if col > 0 {
            sep.push(Span::styled("─┼─", sep_style));
        }
        sep.push(Span::styled(chars::HORIZONTAL.repeat(*width), sep_style));
    }
    result.push(sep);
    for row in &table.rows {
        result.push(row_spans(row.as_slice(), false));
    }
    result
}
