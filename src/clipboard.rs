use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use base64::Engine;

use dg_base::code_block::{Clipboard, ClipboardError};

/// System clipboard for a terminal program.
///
/// Native tools run on a worker thread; text they could not take comes back
/// over a channel and goes out as an OSC 52 escape on the next `poll`.
/// Terminals never acknowledge OSC 52, so it counts as written once it
/// reaches the terminal.
pub struct TerminalClipboard {
    native: fn(&str) -> bool,
    out: Box<dyn Write>,
    fallback_tx: Sender<String>,
    fallback_rx: Receiver<String>,
}

impl Default for TerminalClipboard {
    fn default() -> Self {
        Self::with_parts(try_native_clipboard, Box::new(io::stdout()))
    }
}

impl TerminalClipboard {
    fn with_parts(native: fn(&str) -> bool, out: Box<dyn Write>) -> Self {
        let (fallback_tx, fallback_rx) = mpsc::channel();
        Self { native, out, fallback_tx, fallback_rx }
    }

    fn write_osc52(&mut self, text: &str) -> Result<(), ClipboardError> {
        let seq = osc52_sequence(text, std::env::var("TMUX").is_ok());
        self.out
            .write_all(seq.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

impl Clipboard for TerminalClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let native = self.native;
        let tx = self.fallback_tx.clone();
        let text = text.to_string();
        thread::spawn(move || {
            if !native(&text) {
                let _ = tx.send(text);
            }
        });
        Ok(())
    }

    fn poll(&mut self) -> Result<(), ClipboardError> {
        let mut result = Ok(());
        while let Ok(text) = self.fallback_rx.try_recv() {
            if let Err(e) = self.write_osc52(&text) {
                result = Err(e);
            }
        }
        result
    }
}

/// OSC 52 set-clipboard sequence, wrapped for tmux passthrough when needed.
pub fn osc52_sequence(text: &str, in_tmux: bool) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    if in_tmux { format!("\x1bPtmux;\x1b\x1b]52;c;{}\x07\x1b\\", encoded) } else { format!("\x1b]52;c;{}\x07", encoded) }
}

fn try_native_clipboard(text: &str) -> bool {
    let try_command = |cmd: &str, args: &[&str]| -> bool {
        let Ok(mut child) =
            Command::new(cmd).args(args).stdin(Stdio::piped()).stdout(Stdio::null()).stderr(Stdio::null()).spawn()
        else {
            return false;
        };
        let written = child.stdin.take().is_some_and(|mut stdin| stdin.write_all(text.as_bytes()).is_ok());
        // stdin is dropped above, so the tool sees EOF before we wait
        matches!(child.wait(), Ok(status) if status.success()) && written
    };

    if std::env::var("WAYLAND_DISPLAY").is_ok() && try_command("wl-copy", &[]) {
        return true;
    }
    if std::env::var("DISPLAY").is_ok()
        && (try_command("xclip", &["-selection", "clipboard"]) || try_command("xsel", &["--clipboard", "--input"]))
    {
        return true;
    }
    cfg!(target_os = "macos") && try_command("pbcopy", &[])
}
