//! Runtime settings: defaults, then `.docsgpt/config.yaml`, then the
//! environment (including `.env`), then command-line flags.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use dg_base::config::DEFAULT_THEME;
use dg_base::config::constants::{DEFAULT_API_BASE_URL, SETTINGS_FILE, STORE_DIR};

/// Environment variable overriding the answering service base URL
pub const API_URL_ENV: &str = "DOCSGPT_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    /// Transport timeout for search calls. None waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: None,
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    /// Bad command-line usage
    Args(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Read { path, message } => write!(f, "Cannot read {}: {}", path.display(), message),
            SettingsError::Parse { path, message } => write!(f, "Cannot parse {}: {}", path.display(), message),
            SettingsError::Args(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

pub const USAGE: &str = "Usage: docsgpt [--api-url <url>] [--theme <name>]";

impl Settings {
    /// Resolve settings for this process. A broken settings file is logged
    /// and ignored; bad flags are returned to the caller.
    pub fn load() -> Result<Self, SettingsError> {
        let _ = dotenvy::dotenv();
        let path = Path::new(STORE_DIR).join(SETTINGS_FILE);
        let mut settings = Self::from_file(&path).unwrap_or_else(|e| {
            crate::log::log_error(&e.to_string());
            Self::default()
        });
        settings.apply_env(std::env::var(API_URL_ENV).ok());
        settings.apply_args(std::env::args().skip(1))?;
        Ok(settings)
    }

    /// A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(SettingsError::Read { path: path.to_path_buf(), message: e.to_string() }),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Settings = serde_yaml::from_str(&content)
            .map_err(|e| SettingsError::Parse { path: path.to_path_buf(), message: e.to_string() })?;
        settings.api_base_url = normalize_base_url(&settings.api_base_url);
        Ok(settings)
    }

    pub fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = normalize_base_url(&url);
        }
    }

    /// Accepts `--api-url <url>`, `--api-url=<url>` and the same forms of `--theme`.
    pub fn apply_args(&mut self, args: impl IntoIterator<Item = String>) -> Result<(), SettingsError> {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg, None),
            };
            let mut value = || {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| SettingsError::Args(format!("{} needs a value\n{}", flag, USAGE)))
            };
            match flag.as_str() {
                "--api-url" => self.api_base_url = normalize_base_url(&value()?),
                "--theme" => self.theme = value()?,
                _ => return Err(SettingsError::Args(format!("Unknown argument: {}\n{}", flag, USAGE))),
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_file(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_base_url, "http://localhost:8000");
        assert!(settings.request_timeout().is_none());
    }

    #[test]
    fn file_overrides_defaults_partially() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "api_base_url: https://docs.example.com/\nrequest_timeout_secs: 30\n").unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.api_base_url, "https://docs.example.com");
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.theme, DEFAULT_THEME);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "request_timeout_secs: [not a number]\n").unwrap();
        assert!(matches!(Settings::from_file(&path), Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn env_then_args_take_precedence() {
        let mut settings = Settings::default();
        settings.apply_env(Some("http://env:9000/".into()));
        assert_eq!(settings.api_base_url, "http://env:9000");
        settings.apply_args(args(&["--api-url", "http://cli:7000"])).unwrap();
        assert_eq!(settings.api_base_url, "http://cli:7000");
    }

    #[test]
    fn blank_env_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(Some("  ".into()));
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn inline_flag_values() {
        let mut settings = Settings::default();
        settings.apply_args(args(&["--theme=paper", "--api-url=http://x"])).unwrap();
        assert_eq!(settings.theme, "paper");
        assert_eq!(settings.api_base_url, "http://x");
    }

    #[test]
    fn bad_args_are_reported() {
        let mut settings = Settings::default();
        assert!(matches!(settings.apply_args(args(&["--api-url"])), Err(SettingsError::Args(_))));
        assert!(matches!(settings.apply_args(args(&["--verbose"])), Err(SettingsError::Args(_))));
    }
}
