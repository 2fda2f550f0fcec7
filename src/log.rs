//! Append-only file log under the store directory.
//!
//! The terminal is owned by the UI, so nothing is ever printed. Failures that
//! do not show up on screen (clipboard, stale responses, health checks) end
//! up here instead.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use dg_base::config::constants::{ERRORS_DIR, LOG_FILE, LOGS_DIR, STORE_DIR};

pub fn log_dir() -> PathBuf {
    PathBuf::from(STORE_DIR).join(LOGS_DIR)
}

pub fn panic_log_path() -> PathBuf {
    PathBuf::from(STORE_DIR).join(ERRORS_DIR).join("panic.log")
}

pub fn log_error(message: &str) {
    let _ = append_entry(&log_dir(), "ERROR", message);
}

pub fn log_event(message: &str) {
    let _ = append_entry(&log_dir(), "INFO", message);
}

/// Append one timestamped entry to `dir/docsgpt.log`, creating the directory
/// on demand. Multi-line messages are indented under the header line.
pub fn append_entry(dir: &Path, level: &str, message: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut file = OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE))?;
    file.write_all(format_entry(level, message).as_bytes())
}

fn format_entry(level: &str, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let mut lines = message.lines();
    let first = lines.next().unwrap_or("");
    let mut entry = format!("[{}] {:<5} {}\n", timestamp, level, first);
    for line in lines {
        entry.push_str("    ");
        entry.push_str(line);
        entry.push('\n');
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        append_entry(&logs, "INFO", "started").unwrap();
        append_entry(&logs, "ERROR", "search failed\nAPI error 500").unwrap();

        let content = fs::read_to_string(logs.join(LOG_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("INFO  started"));
        assert!(lines[1].contains("ERROR search failed"));
        assert_eq!(lines[2], "    API error 500");
    }

    #[test]
    fn empty_message_still_writes_a_header() {
        let entry = format_entry("INFO", "");
        assert!(entry.starts_with('['));
        assert!(entry.ends_with("INFO  \n"));
    }
}
