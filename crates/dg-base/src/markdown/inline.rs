//! Inline markdown: emphasis, strong, code spans, links, autolinks.
//!
//! The output is a flat run of spans, each carrying its own style and link
//! target, which is what the terminal painter consumes.

use std::collections::HashMap;

/// Style flags of an inline span.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    /// Inline code span
    pub code: bool,
}

/// A run of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub text: String,
    pub style: SpanStyle,
    /// Sanitized link target, unresolved
    pub link: Option<String>,
}

impl InlineSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), style: SpanStyle::default(), link: None }
    }
}

/// Parse one logical line (or joined paragraph) of inline markdown.
pub fn parse_inline(text: &str) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    parse_into(text, SpanStyle::default(), None, &mut out);
    merge_adjacent(out)
}

/// Concatenate the visible text of a span run.
pub fn plain_text(spans: &[InlineSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

/// Drop control characters (ESC included) so nothing reaches the terminal
/// as an escape sequence. Tabs and newlines survive.
pub fn sanitize_text(text: &str) -> String {
    text.chars().filter(|&c| !c.is_control() || c == '\t' || c == '\n').collect()
}

/// Sanitize a link target. Script-capable schemes are rejected outright.
pub fn sanitize_link(target: &str) -> Option<String> {
    let cleaned: String = target.chars().filter(|c| !c.is_control() && !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    let lower = cleaned.to_ascii_lowercase();
    if ["javascript:", "vbscript:", "data:"].iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }
    Some(cleaned)
}

fn push_text(out: &mut Vec<InlineSpan>, text: &str, style: SpanStyle, link: Option<&String>) {
    let text = sanitize_text(text).replace(['\n', '\t'], " ");
    if text.is_empty() {
        return;
    }
    out.push(InlineSpan { text, style, link: link.cloned() });
}

fn merge_adjacent(spans: Vec<InlineSpan>) -> Vec<InlineSpan> {
    let mut merged: Vec<InlineSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.style == span.style && last.link == span.link => last.text.push_str(&span.text),
            _ => merged.push(span),
        }
    }
    merged
}

fn parse_into(text: &str, style: SpanStyle, link: Option<&String>, out: &mut Vec<InlineSpan>) {
    let bytes = text.as_bytes();
    let closers = Closers::scan(text);
    let mut current = String::new();
    let mut i = 0;

    while i < text.len() {
        let c = bytes[i];
        match c {
            b'\\' if i + 1 < text.len() && bytes[i + 1].is_ascii_punctuation() => {
                current.push(bytes[i + 1] as char);
                i += 2;
            }
            b'`' => {
                let run = run_length(bytes, i, b'`');
                if let Some(close) = closers.backtick_run(run, i + run) {
                    push_text(out, &std::mem::take(&mut current), style, link);
                    let code = strip_code_padding(&text[i + run..close]);
                    push_text(out, code, SpanStyle { code: true, ..style }, link);
                    i = close + run;
                } else {
                    current.push_str(&text[i..i + run]);
                    i += run;
                }
            }
            b'*' | b'_' => {
                let run = run_length(bytes, i, c);
                match parse_emphasis(text, &closers, i, c, run) {
                    Some((inner, width, end)) => {
                        push_text(out, &std::mem::take(&mut current), style, link);
                        let nested = SpanStyle {
                            strong: style.strong || width >= 2,
                            emphasis: style.emphasis || width == 1 || width == 3,
                            ..style
                        };
                        parse_into(inner, nested, link, out);
                        i = end;
                    }
                    None => {
                        current.push_str(&text[i..i + run]);
                        i += run;
                    }
                }
            }
            b'[' => match parse_link(text, &closers, i) {
                Some((label, target, end)) => {
                    push_text(out, &std::mem::take(&mut current), style, link);
                    let target = sanitize_link(target);
                    parse_into(label, style, target.as_ref().or(link), out);
                    i = end;
                }
                None => {
                    current.push('[');
                    i += 1;
                }
            },
            b'<' => match parse_autolink(text, &closers, i) {
                Some((url, end)) => {
                    push_text(out, &std::mem::take(&mut current), style, link);
                    let target = sanitize_link(url);
                    push_text(out, url, style, target.as_ref().or(link));
                    i = end;
                }
                None => {
                    current.push('<');
                    i += 1;
                }
            },
            _ => {
                let ch = text[i..].chars().next().unwrap_or_default();
                current.push(ch);
                i += ch.len_utf8().max(1);
            }
        }
    }

    push_text(out, &current, style, link);
}

/// Closing delimiter positions of one text, collected in a single pass so
/// an opener that never closes costs a lookup instead of a rescan.
#[derive(Default)]
struct Closers {
    /// Valid emphasis closers, indexed by delimiter (`*`, `_`) then width - 1
    emphasis: [[Vec<usize>; 3]; 2],
    /// Start of every backtick run, keyed by run length
    backticks: HashMap<usize, Vec<usize>>,
    /// `[` position to its matching `]`
    brackets: HashMap<usize, usize>,
    /// `(` position to its matching `)`
    parens: HashMap<usize, usize>,
    angles: Vec<usize>,
}

impl Closers {
    fn scan(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut closers = Closers::default();
        let mut open_brackets = Vec::new();
        let mut open_parens = Vec::new();
        let mut escaped = false;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            match b {
                b'`' => {
                    let run = run_length(bytes, i, b'`');
                    closers.backticks.entry(run).or_default().push(i);
                    i += run;
                    escaped = false;
                    continue;
                }
                b'*' | b'_' => {
                    let slot = if b == b'*' { 0 } else { 1 };
                    for width in 1..=3 {
                        if is_emphasis_closer(text, i, b, width) {
                            closers.emphasis[slot][width - 1].push(i);
                        }
                    }
                }
                b'(' => open_parens.push(i),
                b')' => {
                    if let Some(open) = open_parens.pop() {
                        closers.parens.insert(open, i);
                    }
                }
                b'>' => closers.angles.push(i),
                _ => {}
            }

            // Link labels honour backslash escapes; the other delimiters do not
            if escaped {
                escaped = false;
            } else {
                match b {
                    b'\\' => escaped = true,
                    b'[' => open_brackets.push(i),
                    b']' => {
                        if let Some(open) = open_brackets.pop() {
                            closers.brackets.insert(open, i);
                        }
                    }
                    _ => {}
                }
            }
            i += 1;
        }
        closers
    }

    fn emphasis_after(&self, ch: u8, width: usize, pos: usize) -> Option<usize> {
        let slot = if ch == b'*' { 0 } else { 1 };
        first_after(&self.emphasis[slot][width - 1], pos)
    }

    /// First backtick run of exactly `run` ticks starting at or after `from`.
    fn backtick_run(&self, run: usize, from: usize) -> Option<usize> {
        let starts = self.backticks.get(&run)?;
        starts.get(starts.partition_point(|&p| p < from)).copied()
    }
}

fn first_after(positions: &[usize], pos: usize) -> Option<usize> {
    positions.get(positions.partition_point(|&p| p <= pos)).copied()
}

fn run_length(bytes: &[u8], start: usize, ch: u8) -> usize {
    bytes[start..].iter().take_while(|&&b| b == ch).count()
}

fn strip_code_padding(code: &str) -> &str {
    if code.len() >= 2 && code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty() {
        &code[1..code.len() - 1]
    } else {
        code
    }
}

/// Whether a `width`-wide run of `ch` at `pos` can close emphasis. Depends
/// only on the surrounding bytes, never on where the opener was.
fn is_emphasis_closer(text: &str, pos: usize, ch: u8, width: usize) -> bool {
    let bytes = text.as_bytes();
    let after = pos + width;
    if after > bytes.len() || bytes[pos..after].iter().any(|&b| b != ch) {
        return false;
    }
    let prev_is_space = text[..pos].chars().next_back().is_none_or(|c| c.is_whitespace());
    let longer_run = after < bytes.len() && bytes[after] == ch && width < 3;
    let word_after = ch == b'_' && after < bytes.len() && is_word_byte(bytes[after]);
    !prev_is_space && !longer_run && !word_after
}

/// Try to match `*x*`, `**x**`, `***x***` (or underscores) at `start`.
/// Returns (inner text, delimiter width used, index after closing delimiter).
fn parse_emphasis<'a>(
    text: &'a str,
    closers: &Closers,
    start: usize,
    ch: u8,
    run: usize,
) -> Option<(&'a str, usize, usize)> {
    let bytes = text.as_bytes();

    // Underscores inside words (snake_case) are literal
    if ch == b'_' && start > 0 && is_word_byte(bytes[start - 1]) {
        return None;
    }

    for width in [run.min(3), 2, 1] {
        if width == 0 || width > run {
            continue;
        }
        let open_end = start + width;
        // Opening delimiter must be followed by non-space
        match text[open_end..].chars().next() {
            Some(c) if !c.is_whitespace() => {}
            _ => continue,
        }
        if let Some(close) = closers.emphasis_after(ch, width, open_end) {
            return Some((&text[open_end..close], width, close + width));
        }
    }
    None
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b >= 0x80
}

/// Match `[label](target "title")` at `start`.
fn parse_link<'a>(text: &'a str, closers: &Closers, start: usize) -> Option<(&'a str, &'a str, usize)> {
    let label_end = *closers.brackets.get(&start)?;
    if text.as_bytes().get(label_end + 1) != Some(&b'(') {
        return None;
    }
    let j = *closers.parens.get(&(label_end + 1))?;

    let inner = text[label_end + 2..j].trim();
    let target = inner.split_whitespace().next().unwrap_or("");
    let target = target.strip_prefix('<').and_then(|t| t.strip_suffix('>')).unwrap_or(target);
    Some((&text[start + 1..label_end], target, j + 1))
}

/// Match `<https://…>` / `<mailto:…>` at `start`.
fn parse_autolink<'a>(text: &'a str, closers: &Closers, start: usize) -> Option<(&'a str, usize)> {
    let end = first_after(&closers.angles, start)?;
    let url = &text[start + 1..end];
    let is_url = ["http://", "https://", "mailto:"]
        .iter()
        .any(|s| url.len() >= s.len() && url.as_bytes()[..s.len()].eq_ignore_ascii_case(s.as_bytes()));
    if !is_url || url.chars().any(|c| c.is_whitespace() || c == '<') {
        return None;
    }
    Some((url, end + 1))
}
