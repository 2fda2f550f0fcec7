//! Markdown to display blocks.
//!
//! `render` is total: any input string produces a block list, never an
//! error. Fenced code tagged with a language becomes a [`CodeNode`] (the
//! unit that gets a copy button); everything else becomes a [`TextNode`]
//! for the painter. Nothing is cached; callers re-run it on every render
//! pass.

pub mod inline;

pub use inline::{InlineSpan, SpanStyle, parse_inline, plain_text, sanitize_link, sanitize_text};

/// One rendered unit of a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayBlock {
    Text(TextNode),
    Code(CodeNode),
}

/// Fenced code with a language tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeNode {
    pub language: String,
    /// Verbatim body, one trailing newline removed
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub kind: TextKind,
    pub spans: Vec<InlineSpan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextKind {
    Paragraph,
    Heading(u8),
    ListItem { depth: usize, marker: ListMarker },
    Quote,
    Rule,
    /// Untagged fenced code: shown monospaced, no copy unit
    Preformatted,
    Table(Table),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Bullet,
    Ordered(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub align: Vec<Align>,
    pub header: Vec<Vec<InlineSpan>>,
    pub rows: Vec<Vec<Vec<InlineSpan>>>,
}

impl TextNode {
    fn new(kind: TextKind, spans: Vec<InlineSpan>) -> Self {
        Self { kind, spans }
    }
}

/// Parse a markdown string into display blocks.
pub fn render(source: &str) -> Vec<DisplayBlock> {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let raw = lines[i];
        let line = trim_newline(raw);

        if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            i += 1;
            continue;
        }

        if let Some(fence) = parse_fence_open(line)
            && let Some(close) = find_fence_close(&lines, i + 1, &fence)
        {
            flush_paragraph(&mut paragraph, &mut blocks);
            let mut body: String = lines[i + 1..close].concat();
            let keep = body.strip_suffix("\r\n").or_else(|| body.strip_suffix('\n')).map_or(body.len(), str::len);
            body.truncate(keep);
            match language_tag(fence.info) {
                Some(language) => blocks.push(DisplayBlock::Code(CodeNode { language, source: body })),
                None => blocks.push(DisplayBlock::Text(TextNode::new(
                    TextKind::Preformatted,
                    vec![InlineSpan {
                        text: sanitize_text(&body),
                        style: SpanStyle { code: true, ..SpanStyle::default() },
                        link: None,
                    }],
                ))),
            }
            i = close + 1;
            continue;
        }

        if let Some((level, text)) = parse_atx_heading(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(text_block(TextKind::Heading(level), text));
            i += 1;
            continue;
        }

        if !paragraph.is_empty()
            && let Some(level) = parse_setext_underline(line)
        {
            let text = paragraph.join(" ");
            paragraph.clear();
            blocks.push(text_block(TextKind::Heading(level), &text));
            i += 1;
            continue;
        }

        if is_thematic_break(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(DisplayBlock::Text(TextNode::new(TextKind::Rule, Vec::new())));
            i += 1;
            continue;
        }

        if let Some(table_end) = table_extent(&lines, i) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(DisplayBlock::Text(TextNode::new(
                TextKind::Table(parse_table(&lines[i..table_end])),
                Vec::new(),
            )));
            i = table_end;
            continue;
        }

        if quote_content(line).is_some() {
            flush_paragraph(&mut paragraph, &mut blocks);
            let mut parts = Vec::new();
            while i < lines.len() {
                match quote_content(trim_newline(lines[i])) {
                    Some(content) if !content.trim().is_empty() => parts.push(content.trim()),
                    _ => break,
                }
                i += 1;
            }
            if parts.is_empty() {
                // A bare ">" line
                i += 1;
            } else {
                blocks.push(text_block(TextKind::Quote, &parts.join(" ")));
            }
            continue;
        }

        if let Some(item) = parse_list_item(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let mut parts = vec![item.content];
            i += 1;
            // Continuation lines until a blank line or a new block starts
            while i < lines.len() {
                let next = trim_newline(lines[i]);
                if next.trim().is_empty() || starts_block(next) {
                    break;
                }
                parts.push(next.trim());
                i += 1;
            }
            blocks.push(text_block(
                TextKind::ListItem { depth: item.depth, marker: item.marker },
                &parts.join(" "),
            ));
            continue;
        }

        paragraph.push(line.trim());
        i += 1;
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

/// Code nodes of a rendered document, in order.
pub fn code_nodes(blocks: &[DisplayBlock]) -> impl Iterator<Item = &CodeNode> {
    blocks.iter().filter_map(|b| match b {
        DisplayBlock::Code(node) => Some(node),
        DisplayBlock::Text(_) => None,
    })
}

fn trim_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn text_block(kind: TextKind, text: &str) -> DisplayBlock {
    DisplayBlock::Text(TextNode::new(kind, parse_inline(text)))
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<DisplayBlock>) {
    if paragraph.is_empty() {
        return;
    }
    let text = paragraph.join(" ");
    paragraph.clear();
    blocks.push(text_block(TextKind::Paragraph, &text));
}

/// Leading spaces, tabs counted as four.
fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn starts_block(line: &str) -> bool {
    parse_fence_open(line).is_some()
        || parse_atx_heading(line).is_some()
        || is_thematic_break(line)
        || quote_content(line).is_some()
        || parse_list_item(line).is_some()
}

// ─── Fences ───

struct Fence<'a> {
    ch: u8,
    len: usize,
    info: &'a str,
}

fn parse_fence_open(line: &str) -> Option<Fence<'_>> {
    if indent_width(line) > 3 {
        return None;
    }
    let trimmed = line.trim_start();
    let ch = *trimmed.as_bytes().first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let len = trimmed.bytes().take_while(|&b| b == ch).count();
    if len < 3 {
        return None;
    }
    let info = trimmed[len..].trim();
    // Backtick fences cannot carry backticks in their info string
    if ch == b'`' && info.contains('`') {
        return None;
    }
    Some(Fence { ch, len, info })
}

fn find_fence_close(lines: &[&str], from: usize, fence: &Fence) -> Option<usize> {
    (from..lines.len()).find(|&j| {
        let line = trim_newline(lines[j]);
        if indent_width(line) > 3 {
            return false;
        }
        let trimmed = line.trim_start();
        let len = trimmed.bytes().take_while(|&b| b == fence.ch).count();
        len >= fence.len && trimmed[len..].trim().is_empty()
    })
}

/// First word of the info string, e.g. "rust" from "rust,ignore" or
/// "python title=x.py".
fn language_tag(info: &str) -> Option<String> {
    let word = info.split_whitespace().next()?;
    let tag: String =
        word.chars().take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '+' | '#' | '-' | '.')).collect();
    if tag.is_empty() { None } else { Some(tag) }
}

// ─── Headings & breaks ───

fn parse_atx_heading(line: &str) -> Option<(u8, &str)> {
    if indent_width(line) > 3 {
        return None;
    }
    let trimmed = line.trim_start();
    let level = trimmed.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let mut content = rest.trim();
    // Optional closing sequence: "## Title ##"
    let without_hashes = content.trim_end_matches('#');
    if without_hashes.is_empty() || without_hashes.ends_with([' ', '\t']) {
        content = without_hashes.trim_end();
    }
    Some((level as u8, content))
}

fn parse_setext_underline(line: &str) -> Option<u8> {
    if indent_width(line) > 3 {
        return None;
    }
    let trimmed = line.trim();
    if trimmed.len() >= 3 && trimmed.bytes().all(|b| b == b'=') {
        Some(1)
    } else if trimmed.len() >= 3 && trimmed.bytes().all(|b| b == b'-') {
        Some(2)
    } else {
        None
    }
}

fn is_thematic_break(line: &str) -> bool {
    if indent_width(line) > 3 {
        return false;
    }
    let compact: Vec<u8> = line.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    compact.len() >= 3 && matches!(compact[0], b'-' | b'*' | b'_') && compact.iter().all(|&b| b == compact[0])
}

// ─── Quotes & lists ───

fn quote_content(line: &str) -> Option<&str> {
    if indent_width(line) > 3 {
        return None;
    }
    let rest = line.trim_start().strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

struct ListItem<'a> {
    depth: usize,
    marker: ListMarker,
    content: &'a str,
}

fn parse_list_item(line: &str) -> Option<ListItem<'_>> {
    let indent = indent_width(line);
    let trimmed = line.trim_start();
    let depth = indent / 2;

    let first = *trimmed.as_bytes().first()?;
    if matches!(first, b'-' | b'*' | b'+') {
        let rest = &trimmed[1..];
        if rest.is_empty() || rest.starts_with([' ', '\t']) {
            return Some(ListItem { depth, marker: ListMarker::Bullet, content: rest.trim() });
        }
        return None;
    }

    let digits = trimmed.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let delim = *trimmed.as_bytes().get(digits)?;
    if delim != b'.' && delim != b')' {
        return None;
    }
    let rest = &trimmed[digits + 1..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let number = trimmed[..digits].parse().ok()?;
    Some(ListItem { depth, marker: ListMarker::Ordered(number), content: rest.trim() })
}

// ─── Tables ───

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.len() > 1
}

fn split_cells(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

fn parse_separator(line: &str) -> Option<Vec<Align>> {
    if !is_table_row(line) {
        return None;
    }
    split_cells(line)
        .into_iter()
        .map(|cell| {
            let dashes = cell.trim_matches(':');
            if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') {
                return None;
            }
            Some(match (cell.starts_with(':'), cell.ends_with(':')) {
                (true, true) => Align::Center,
                (false, true) => Align::Right,
                _ => Align::Left,
            })
        })
        .collect()
}

/// Index one past the last row of a table starting at `start`, if any.
fn table_extent(lines: &[&str], start: usize) -> Option<usize> {
    let header = trim_newline(lines[start]);
    let sep = trim_newline(lines.get(start + 1)?);
    if !is_table_row(header) || parse_separator(sep).is_none() {
        return None;
    }
    let mut end = start + 2;
    while end < lines.len() && is_table_row(trim_newline(lines[end])) {
        end += 1;
    }
    Some(end)
}

fn parse_table(lines: &[&str]) -> Table {
    let header: Vec<Vec<InlineSpan>> = split_cells(trim_newline(lines[0])).into_iter().map(parse_inline).collect();
    let mut align = parse_separator(trim_newline(lines[1])).unwrap_or_default();
    align.resize(header.len(), Align::Left);
    let rows = lines[2..]
        .iter()
        .map(|line| {
            let mut cells: Vec<Vec<InlineSpan>> =
                split_cells(trim_newline(line)).into_iter().map(parse_inline).collect();
            cells.resize(header.len(), Vec::new());
            cells
        })
        .collect();
    Table { align, header, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_kinds(blocks: &[DisplayBlock]) -> Vec<TextKind> {
        blocks
            .iter()
            .map(|b| match b {
                DisplayBlock::Text(t) => t.kind.clone(),
                DisplayBlock::Code(_) => panic!("unexpected code block"),
            })
            .collect()
    }

    fn only_code(blocks: &[DisplayBlock]) -> &CodeNode {
        assert_eq!(blocks.len(), 1, "{:?}", blocks);
        match &blocks[0] {
            DisplayBlock::Code(c) => c,
            other => panic!("expected code, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(render("").is_empty());
        assert!(render("\n\n  \n").is_empty());
    }

    #[test]
    fn plain_text_is_one_text_node() {
        let blocks = render("plain text");
        assert_eq!(
            blocks,
            vec![DisplayBlock::Text(TextNode::new(TextKind::Paragraph, vec![InlineSpan::plain("plain text")]))]
        );
    }

    #[test]
    fn tagged_fence_becomes_code_node() {
        let blocks = render("```js\nconst x=1;\n```");
        let code = only_code(&blocks);
        assert_eq!(code.language, "js");
        assert_eq!(code.source, "const x=1;");
    }

    #[test]
    fn only_one_trailing_newline_is_stripped() {
        let blocks = render("```py\n  x = 1\n\n\n```\n");
        assert_eq!(only_code(&blocks).source, "  x = 1\n\n");
    }

    #[test]
    fn crlf_fence_drops_the_whole_final_line_break() {
        let blocks = render("```js\r\nconst x=1;\r\n```\r\n");
        assert_eq!(only_code(&blocks).source, "const x=1;");

        let blocks = render("```sh\r\nls\r\n\r\npwd\r\n```");
        assert_eq!(only_code(&blocks).source, "ls\r\n\r\npwd");
    }

    #[test]
    fn code_source_is_verbatim() {
        let src = "fn main() {\r\n\tprintln!(\"**hi**\");  \n}";
        let md = format!("```rust\n{}\n```", src);
        assert_eq!(only_code(&render(&md)).source, src);
    }

    #[test]
    fn extraction_round_trips() {
        let first = render("Intro\n\n```python title=app.py\nimport os\nprint(os.getcwd())\n```\n\nOutro");
        let code = code_nodes(&first).next().unwrap().clone();
        assert_eq!(code.language, "python");

        let again = render(&format!("```{}\n{}\n```", code.language, code.source));
        assert_eq!(only_code(&again), &code);
        assert_eq!(render("Intro\n\n```python title=app.py\nimport os\nprint(os.getcwd())\n```\n\nOutro"), first);
    }

    #[test]
    fn untagged_fence_is_preformatted_text() {
        let blocks = render("```\nls -la\n```");
        assert_eq!(text_kinds(&blocks), vec![TextKind::Preformatted]);
        match &blocks[0] {
            DisplayBlock::Text(t) => assert_eq!(t.spans[0].text, "ls -la"),
            DisplayBlock::Code(_) => unreachable!(),
        }
    }

    #[test]
    fn tilde_fence_and_longer_close() {
        let blocks = render("~~~~bash\necho ~~~\n~~~~~\n");
        let code = only_code(&blocks);
        assert_eq!(code.language, "bash");
        assert_eq!(code.source, "echo ~~~");
    }

    #[test]
    fn shorter_fence_does_not_close() {
        let blocks = render("````md\n```\ninner\n```\n````");
        assert_eq!(only_code(&blocks).source, "```\ninner\n```");
    }

    #[test]
    fn unterminated_fence_degrades_to_text() {
        let blocks = render("```rust\nfn main() {}\n\nstill text");
        assert_eq!(text_kinds(&blocks), vec![TextKind::Paragraph, TextKind::Paragraph]);
        match &blocks[0] {
            DisplayBlock::Text(t) => assert_eq!(plain_text(&t.spans), "```rust fn main() {}"),
            DisplayBlock::Code(_) => unreachable!(),
        }
    }

    #[test]
    fn inline_code_is_not_promoted() {
        let blocks = render("Call `cargo build` first.");
        assert_eq!(text_kinds(&blocks), vec![TextKind::Paragraph]);
    }

    #[test]
    fn mixed_document() {
        let md = "# Setup\n\nInstall it:\n\n```sh\npip install x\n```\n\n- one\n- two\n  1. nested\n\n> note\n\n---\n";
        let blocks = render(md);
        assert_eq!(blocks.len(), 8);
        assert!(matches!(&blocks[0], DisplayBlock::Text(t) if t.kind == TextKind::Heading(1)));
        assert!(matches!(&blocks[2], DisplayBlock::Code(c) if c.language == "sh"));
        assert!(matches!(
            &blocks[5],
            DisplayBlock::Text(TextNode { kind: TextKind::ListItem { depth: 1, marker: ListMarker::Ordered(1) }, .. })
        ));
        assert!(matches!(&blocks[6], DisplayBlock::Text(t) if t.kind == TextKind::Quote));
        assert!(matches!(&blocks[7], DisplayBlock::Text(t) if t.kind == TextKind::Rule));
    }

    #[test]
    fn paragraph_lines_are_joined() {
        let blocks = render("first line\nsecond line\n\nnext");
        match &blocks[0] {
            DisplayBlock::Text(t) => assert_eq!(plain_text(&t.spans), "first line second line"),
            DisplayBlock::Code(_) => unreachable!(),
        }
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn setext_heading() {
        let blocks = render("Title\n=====\nbody");
        assert_eq!(text_kinds(&blocks), vec![TextKind::Heading(1), TextKind::Paragraph]);
    }

    #[test]
    fn atx_heading_closing_hashes() {
        let blocks = render("## Usage ##");
        match &blocks[0] {
            DisplayBlock::Text(t) => {
                assert_eq!(t.kind, TextKind::Heading(2));
                assert_eq!(plain_text(&t.spans), "Usage");
            }
            DisplayBlock::Code(_) => unreachable!(),
        }
    }

    #[test]
    fn hashtag_is_not_heading() {
        assert_eq!(text_kinds(&render("#rust is fun")), vec![TextKind::Paragraph]);
    }

    #[test]
    fn list_item_continuation() {
        let blocks = render("- first\n  wrapped\n- second");
        assert_eq!(blocks.len(), 2);
        match &blocks[0] {
            DisplayBlock::Text(t) => assert_eq!(plain_text(&t.spans), "first wrapped"),
            DisplayBlock::Code(_) => unreachable!(),
        }
    }

    #[test]
    fn table_is_parsed() {
        let blocks = render("| Name | Size |\n|:-----|-----:|\n| a | 1 |\n| b |\n");
        match &blocks[0] {
            DisplayBlock::Text(TextNode { kind: TextKind::Table(table), .. }) => {
                assert_eq!(table.align, vec![Align::Left, Align::Right]);
                assert_eq!(table.rows.len(), 2);
                assert!(table.rows[1][1].is_empty());
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn pipe_line_without_separator_is_paragraph() {
        assert_eq!(text_kinds(&render("| not a table |")), vec![TextKind::Paragraph]);
    }

    #[test]
    fn escape_sequences_never_reach_text() {
        let blocks = render("```\n\x1b[31mred\x1b[0m\n```\nhi \x1b[2J");
        for block in &blocks {
            if let DisplayBlock::Text(t) = block {
                assert!(!plain_text(&t.spans).contains('\x1b'));
            }
        }
    }

    #[test]
    fn render_is_deterministic() {
        let md = "Text with [link](https://a.b) and `code`.\n\n```go\nfunc main() {}\n```";
        assert_eq!(render(md), render(md));
    }
}
