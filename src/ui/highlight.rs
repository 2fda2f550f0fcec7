use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use ratatui::style::Color;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);
type HighlightResult = Vec<Vec<(Color, String)>>;
static HIGHLIGHT_CACHE: LazyLock<Mutex<HashMap<(String, String, String), Arc<HighlightResult>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Fallback when the configured theme is not bundled with syntect
const FALLBACK_THEME: &str = "base16-ocean.dark";

/// Common fence tags that are not syntect tokens
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("py", "Python"),
    ("python3", "Python"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "JavaScript"),
    ("typescript", "JavaScript"),
    ("sh", "Bourne Again Shell (bash)"),
    ("shell", "Bourne Again Shell (bash)"),
    ("zsh", "Bourne Again Shell (bash)"),
    ("console", "Bourne Again Shell (bash)"),
    ("yml", "YAML"),
    ("rs", "Rust"),
    ("golang", "Go"),
];

fn to_ratatui_color(color: syntect::highlighting::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn find_syntax(language: &str) -> &'static SyntaxReference {
    let lower = language.to_ascii_lowercase();
    SYNTAX_SET
        .find_syntax_by_token(&lower)
        .or_else(|| {
            LANGUAGE_ALIASES
                .iter()
                .find(|(tag, _)| *tag == lower)
                .and_then(|(_, name)| SYNTAX_SET.find_syntax_by_name(name))
        })
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

/// Highlight a code block by its fence language tag.
/// Returns one entry per source line, each a run of (color, text) pieces.
pub fn highlight_code(language: &str, source: &str, theme_name: &str) -> Arc<HighlightResult> {
    let cache_key = (language.to_string(), theme_name.to_string(), source.to_string());
    {
        let cache = HIGHLIGHT_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(&cache_key) {
            return Arc::clone(cached);
        }
    }

    let result = Arc::new(do_highlight(language, source, theme_name));

    {
        let mut cache = HIGHLIGHT_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        // Limit cache size
        if cache.len() > 50 {
            cache.clear();
        }
        cache.insert(cache_key, Arc::clone(&result));
    }

    result
}

fn do_highlight(language: &str, source: &str, theme_name: &str) -> HighlightResult {
    let syntax = find_syntax(language);
    let theme = THEME_SET.themes.get(theme_name).unwrap_or_else(|| &THEME_SET.themes[FALLBACK_THEME]);

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut result = Vec::new();

    for line in LinesWithEndings::from(source) {
        let ranges: Vec<(Style, &str)> = highlighter.highlight_line(line, &SYNTAX_SET).unwrap_or_default();

        let spans: Vec<(Color, String)> = ranges
            .into_iter()
            .map(|(style, text)| {
                let color = to_ratatui_color(style.foreground);
                let text = text.trim_end_matches(['\n', '\r']).replace('\t', "    ");
                (color, text)
            })
            .collect();

        result.push(spans);
    }

    // A source ending in a newline has a final empty line
    if source.is_empty() || source.ends_with('\n') {
        result.push(Vec::new());
    }

    result
}
