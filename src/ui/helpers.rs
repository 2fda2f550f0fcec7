use std::time::Duration;

use ratatui::prelude::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use dg_base::config::chars::SPINNER;

pub fn spinner(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = c.width().unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('…');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}

/// "0.8s", "12.3s", "2m 05s"
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let whole = elapsed.as_secs();
        format!("{}m {:02}s", whole / 60, whole % 60)
    }
}

/// Word-wrap styled spans to `max_width` columns, keeping each piece's style.
/// Words wider than a full line are split at character boundaries.
pub fn wrap_spans(spans: &[Span<'static>], max_width: usize) -> Vec<Vec<Span<'static>>> {
    let max_width = max_width.max(1);
    let mut lines: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    let mut width = 0;

    for span in spans {
        for piece in span.content.split_inclusive(' ') {
            let mut word = piece;
            if width == 0 {
                word = word.trim_start_matches(' ');
                if word.is_empty() {
                    continue;
                }
            }
            let visible = word.trim_end_matches(' ').width();
            if width > 0 && width + visible > max_width {
                lines.push(Vec::new());
                width = 0;
                word = word.trim_start_matches(' ');
            }
            // Hard-break words longer than a whole line
            while word.trim_end_matches(' ').width() > max_width.saturating_sub(width) {
                let (head, tail) = split_at_width(word, max_width.saturating_sub(width));
                if let Some(line) = lines.last_mut() {
                    line.push(Span::styled(head.to_string(), span.style));
                }
                lines.push(Vec::new());
                width = 0;
                word = tail;
            }
            if !word.is_empty() {
                width += word.width();
                if let Some(line) = lines.last_mut() {
                    line.push(Span::styled(word.to_string(), span.style));
                }
            }
        }
    }

    lines
}

/// Split so the head fits in `width` columns. The head always holds at
/// least one character.
fn split_at_width(s: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let cw = c.width().unwrap_or(0);
        if used + cw > width && idx > 0 {
            return s.split_at(idx);
        }
        used += cw;
    }
    (s, "")
}

/// Display width of a run of spans.
pub fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| s.content.width()).sum()
}
