//! YAML configuration loader for the prompt catalog and themes.
use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;

pub mod constants;

// ============================================================================
// Prompt Catalog
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PromptsConfig {
    pub prompts: Vec<PromptCatalogEntry>,
}

/// One example prompt the user can pick instead of typing.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PromptCatalogEntry {
    pub text: String,
    /// Icon tag, resolved to a glyph through the active theme
    pub icon: String,
    pub category: String,
}

// ============================================================================
// Theme Configuration
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ThemesConfig {
    pub themes: HashMap<String, Theme>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Theme {
    pub name: String,
    pub description: String,
    /// Name of a syntect default theme used for code blocks
    pub syntax_theme: String,
    pub icons: Icons,
    pub cursor: CursorGlyphs,
    pub colors: ThemeColors,
}

/// Icon glyphs keyed by tag (e.g., "lock", "cloud").
#[derive(Debug, Deserialize, Clone)]
#[serde(transparent)]
pub struct Icons(pub HashMap<String, String>);

impl Icons {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CursorGlyphs {
    pub ring: String,
    pub ring_active: String,
    pub text_input: String,
    pub trail: String,
}

/// RGB color as [r, g, b] array
pub type RgbColor = [u8; 3];

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeColors {
    pub accent: RgbColor,
    pub accent_dim: RgbColor,
    pub success: RgbColor,
    pub warning: RgbColor,
    pub error: RgbColor,
    pub link: RgbColor,
    pub text: RgbColor,
    pub text_secondary: RgbColor,
    pub text_muted: RgbColor,
    pub bg_base: RgbColor,
    pub bg_surface: RgbColor,
    pub bg_elevated: RgbColor,
    pub bg_code: RgbColor,
    pub border: RgbColor,
    pub border_focus: RgbColor,
}

/// Default theme ID
pub const DEFAULT_THEME: &str = "midnight";

/// Available theme IDs in display order
pub const THEME_ORDER: &[&str] = &["midnight", "paper"];

// ============================================================================
// Loading Functions
// ============================================================================

fn parse_yaml<T: for<'de> Deserialize<'de>>(name: &str, content: &str) -> T {
    serde_yaml::from_str(content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

// ============================================================================
// Global Configuration (embedded at compile time)
// ============================================================================

pub static PROMPTS: LazyLock<PromptsConfig> =
    LazyLock::new(|| parse_yaml("prompts.yaml", include_str!("../../../../yamls/prompts.yaml")));
pub static THEMES: LazyLock<ThemesConfig> =
    LazyLock::new(|| parse_yaml("themes.yaml", include_str!("../../../../yamls/themes.yaml")));

/// The fixed example prompt catalog.
pub fn prompt_catalog() -> &'static [PromptCatalogEntry] {
    &PROMPTS.prompts
}

/// Get a theme by ID, falling back to default if not found
pub fn get_theme(theme_id: &str) -> &'static Theme {
    THEMES.themes.get(theme_id).or_else(|| THEMES.themes.get(DEFAULT_THEME)).expect("Default theme must exist")
}

// ============================================================================
// Active Theme
// ============================================================================

use std::sync::atomic::{AtomicPtr, Ordering};

/// Points into the static THEMES LazyLock, so the reference is always valid.
static CACHED_THEME: AtomicPtr<Theme> = AtomicPtr::new(std::ptr::null_mut());

/// Set the active theme ID (unknown IDs fall back to the default theme)
pub fn set_active_theme(theme_id: &str) {
    let theme: &'static Theme = get_theme(theme_id);
    CACHED_THEME.store(theme as *const Theme as *mut Theme, Ordering::Release);
}

pub fn active_theme() -> &'static Theme {
    let ptr = CACHED_THEME.load(Ordering::Acquire);
    if !ptr.is_null() {
        // SAFETY: ptr was set from a &'static Theme stored in the THEMES LazyLock,
        // which is never mutated or freed after initialization.
        unsafe { &*ptr }
    } else {
        let theme = get_theme(DEFAULT_THEME);
        CACHED_THEME.store(theme as *const Theme as *mut Theme, Ordering::Release);
        theme
    }
}

/// Glyph for an icon tag, or a neutral bullet when the theme lacks it.
pub fn icon(tag: &str) -> &'static str {
    active_theme().icons.get(tag).unwrap_or("•")
}

// =============================================================================
// THEME COLORS
// =============================================================================

pub mod theme {
    use crate::config::active_theme;
    use ratatui::style::Color;

    fn rgb(c: [u8; 3]) -> Color {
        Color::Rgb(c[0], c[1], c[2])
    }

    pub fn accent() -> Color {
        rgb(active_theme().colors.accent)
    }
    pub fn accent_dim() -> Color {
        rgb(active_theme().colors.accent_dim)
    }
    pub fn success() -> Color {
        rgb(active_theme().colors.success)
    }
    pub fn warning() -> Color {
        rgb(active_theme().colors.warning)
    }
    pub fn error() -> Color {
        rgb(active_theme().colors.error)
    }
    pub fn link() -> Color {
        rgb(active_theme().colors.link)
    }
    pub fn text() -> Color {
        rgb(active_theme().colors.text)
    }
    pub fn text_secondary() -> Color {
        rgb(active_theme().colors.text_secondary)
    }
    pub fn text_muted() -> Color {
        rgb(active_theme().colors.text_muted)
    }
    pub fn bg_base() -> Color {
        rgb(active_theme().colors.bg_base)
    }
    pub fn bg_surface() -> Color {
        rgb(active_theme().colors.bg_surface)
    }
    pub fn bg_elevated() -> Color {
        rgb(active_theme().colors.bg_elevated)
    }
    pub fn bg_code() -> Color {
        rgb(active_theme().colors.bg_code)
    }
    pub fn border() -> Color {
        rgb(active_theme().colors.border)
    }
    pub fn border_focus() -> Color {
        rgb(active_theme().colors.border_focus)
    }
}

// =============================================================================
// UI CHARACTERS
// =============================================================================

pub mod chars {
    pub const HORIZONTAL: &str = "─";
    pub const BULLET: &str = "•";
    pub const QUOTE_BAR: &str = "▎";
    pub const CHECK: &str = "✓";
    pub const CROSS: &str = "✗";
    pub const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
}
