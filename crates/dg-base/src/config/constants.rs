// =============================================================================
// ANSWERING SERVICE
// =============================================================================

/// Default base URL of the answering service
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Search endpoint path, relative to the base URL
pub const SEARCH_PATH: &str = "/api/search";

/// Health endpoint path, relative to the base URL
pub const HEALTH_PATH: &str = "/api/health";

/// Banner text when the service gives no usable reason
pub const SEARCH_FALLBACK_ERROR: &str = "An error occurred during search";

// =============================================================================
// TIMING
// =============================================================================

/// How long a code block shows "Copied!" after a copy
pub const COPY_REVERT_MS: u64 = 2_000;

/// Example prompt rotation period
pub const PROMPT_ROTATION_MS: u64 = 10_000;

/// Quiet time after the last keystroke before the input stops "typing"
pub const TYPING_DEBOUNCE_MS: u64 = 500;

// =============================================================================
// PROMPTS & POINTER
// =============================================================================

/// Number of example prompts visible at once
pub const ACTIVE_PROMPT_COUNT: usize = 4;

/// Committed pointer positions kept for the cursor trail
pub const TRAIL_LEN: usize = 5;

// =============================================================================
// EVENT LOOP
// =============================================================================

/// Poll interval for events in milliseconds while something is animating
pub const EVENT_POLL_MS: u64 = 8;

/// Poll interval when idle
pub const IDLE_POLL_MS: u64 = 50;

/// Minimum time between renders (ms) - caps at ~28fps
pub const RENDER_THROTTLE_MS: u64 = 36;

/// Spinner frame advance interval
pub const SPINNER_FRAME_MS: u64 = 80;

// =============================================================================
// UI LAYOUT
// =============================================================================

/// Rows scrolled per arrow key / wheel notch
pub const SCROLL_LINES: u16 = 3;

/// Rows scrolled per PageUp/PageDown
pub const SCROLL_PAGE_LINES: u16 = 15;

/// Height of the search row (bordered input)
pub const SEARCH_ROW_HEIGHT: u16 = 3;

/// Width of the Search button
pub const SEARCH_BUTTON_WIDTH: u16 = 12;

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Directory for settings and logs
pub const STORE_DIR: &str = "./.docsgpt";

/// Optional user settings file inside STORE_DIR
pub const SETTINGS_FILE: &str = "config.yaml";

/// Log subdirectory
pub const LOGS_DIR: &str = "logs";

/// Log file name inside LOGS_DIR
pub const LOG_FILE: &str = "docsgpt.log";

/// Panic log subdirectory
pub const ERRORS_DIR: &str = "errors";
