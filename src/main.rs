mod api;
mod app;
mod clipboard;
mod log;
mod settings;
mod state;
mod ui;

use std::io;
use std::sync::Arc;

use crossterm::{
    ExecutableCommand,
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use dg_base::config;
use dg_base::prompts::PromptRotation;

use api::HttpAnswerService;
use app::{App, MouseCapture};
use clipboard::TerminalClipboard;
use settings::{Settings, SettingsError, USAGE};
use state::State;

fn main() -> io::Result<()> {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(SettingsError::Args(msg)) => {
            eprintln!("{}\n{}", msg, USAGE);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    config::set_active_theme(&settings.theme);

    let service = match HttpAnswerService::new(&settings.api_base_url, settings.request_timeout()) {
        Ok(service) => service,
        Err(e) => {
            log::log_error(&format!("building HTTP client: {}", e));
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Panic hook: restore terminal state and log the panic to disk.
    // Without this, a panic leaves the terminal in raw mode + alternate screen
    // and the error is lost.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = io::stdout().execute(DisableMouseCapture);
        let _ = io::stdout().execute(DisableBracketedPaste);
        let _ = io::stdout().execute(LeaveAlternateScreen);

        let log_path = log::panic_log_path();
        if let Some(dir) = log_path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("[{}] {}\n\n{}\n\n---\n", ts, info, backtrace);
        let _ = std::fs::OpenOptions::new().create(true).append(true).open(&log_path).and_then(|mut f| {
            use std::io::Write;
            f.write_all(msg.as_bytes())
        });

        default_hook(info);
    }));

    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    io::stdout().execute(EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let state = State::new(settings.api_base_url.clone(), PromptRotation::new());
    let mut app = App::new(state, Arc::new(service), Box::new(TerminalClipboard::default()));
    let result = app.run(&mut terminal, &mut MouseCapture);

    // Cleanup
    disable_raw_mode()?;
    io::stdout().execute(DisableBracketedPaste)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}
