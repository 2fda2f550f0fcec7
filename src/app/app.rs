use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crossterm::event;
use ratatui::prelude::*;

use dg_base::code_block::{Clipboard, CodeKey};
use dg_base::config::chars::SPINNER;
use dg_base::config::constants::{EVENT_POLL_MS, IDLE_POLL_MS, RENDER_THROTTLE_MS, SPINNER_FRAME_MS};
use dg_base::pointer::PointerSource;

use crate::api::{self, AnswerService, HealthReport, SearchCompletion};
use crate::app::actions::{ActionResult, apply_action};
use crate::app::events::handle_event;
use crate::log::{log_error, log_event};
use crate::state::State;
use crate::ui;

pub struct App {
    pub state: State,
    service: Arc<dyn AnswerService>,
    clipboard: Box<dyn Clipboard>,
    search_tx: Sender<SearchCompletion>,
    search_rx: Receiver<SearchCompletion>,
    health_rx: Option<Receiver<HealthReport>>,
    /// Last render time for throttling
    last_render: Option<Instant>,
    /// Last spinner animation update time
    last_spinner: Instant,
}

impl App {
    pub fn new(state: State, service: Arc<dyn AnswerService>, clipboard: Box<dyn Clipboard>) -> Self {
        let (search_tx, search_rx) = mpsc::channel();
        Self {
            state,
            service,
            clipboard,
            search_tx,
            search_rx,
            health_rx: None,
            last_render: None,
            last_spinner: Instant::now(),
        }
    }

    /// Start the background units, run until the user quits, then stop them
    /// again. The pointer source is released even when the loop fails.
    pub fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        pointer_source: &mut dyn PointerSource,
    ) -> io::Result<()> {
        self.mount(pointer_source)?;
        let result = self.event_loop(terminal);
        self.unmount(pointer_source);
        result
    }

    fn mount(&mut self, pointer_source: &mut dyn PointerSource) -> io::Result<()> {
        self.state.prompts.start(Instant::now());
        self.state.pointer.start(pointer_source)?;

        let (tx, rx) = mpsc::channel();
        api::spawn_health_check(Arc::clone(&self.service), tx);
        self.health_rx = Some(rx);
        log_event(&format!("started against {}", self.state.api_base_url));
        Ok(())
    }

    fn unmount(&mut self, pointer_source: &mut dyn PointerSource) {
        self.state.cancel_timers();
        if let Err(e) = self.state.pointer.stop(pointer_source) {
            log_error(&format!("releasing mouse capture: {}", e));
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        loop {
            let now = Instant::now();

            // === INPUT FIRST ===
            if event::poll(Duration::ZERO)? {
                let evt = event::read()?;
                let Some(action) = handle_event(&evt, &mut self.state) else {
                    break;
                };
                let result = apply_action(&mut self.state, action, now);
                self.handle_result(result, now);

                if self.state.dirty {
                    self.render(terminal, now)?;
                }
            }

            self.process_background(now);

            // Render if dirty and enough time has passed (capped at ~28fps)
            let throttled =
                self.last_render.is_some_and(|t| now.duration_since(t) < Duration::from_millis(RENDER_THROTTLE_MS));
            if self.state.dirty && !throttled {
                self.render(terminal, now)?;
            }

            // Adaptive poll: short while something animates, longer when idle
            let poll_ms = if self.state.search.is_busy() || self.state.dirty { EVENT_POLL_MS } else { IDLE_POLL_MS };
            let _ = event::poll(Duration::from_millis(poll_ms))?;
        }
        Ok(())
    }

    // === BACKGROUND PROCESSING ===
    fn process_background(&mut self, now: Instant) {
        self.process_search_completions();
        self.process_health_report();
        self.process_clipboard();
        if self.state.poll_timers(now) {
            self.state.dirty = true;
        }
        // Queued pointer moves are committed by the next render
        if self.state.pointer.has_pending() {
            self.state.dirty = true;
        }
        self.update_spinner_animation(now);
    }

    fn render(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, now: Instant) -> io::Result<()> {
        terminal.draw(|frame| self.draw_frame(frame))?;
        self.state.dirty = false;
        self.last_render = Some(now);
        Ok(())
    }

    /// One frame: the pointer advances at most one position per frame.
    fn draw_frame(&mut self, frame: &mut Frame) {
        self.state.pointer.commit_frame();
        ui::render(frame, &mut self.state);
    }

    fn handle_result(&mut self, result: ActionResult, now: Instant) {
        match result {
            ActionResult::Nothing => {}
            ActionResult::Search(ticket) => {
                log_event(&format!("search #{}: {}", ticket.seq, ticket.query));
                api::dispatch(ticket, Arc::clone(&self.service), self.search_tx.clone());
            }
            ActionResult::CopyCode(key) => self.copy_code(key, now),
            ActionResult::CopyText(text) => match self.clipboard.write_text(&text) {
                Ok(()) => self.state.set_notice(format!("Copied {}", text), now),
                Err(e) => log_error(&format!("copy link failed: {}", e)),
            },
        }
    }

    /// Clipboard failures are only logged; the button simply stays as it was.
    fn copy_code(&mut self, key: CodeKey, now: Instant) {
        match self.state.code_blocks.copy(&key, self.clipboard.as_mut(), now) {
            Some(Ok(())) => {
                if let Some(unit) = self.state.code_blocks.get(&key) {
                    log_event(&format!("copied {} block {:?}", unit.language(), key.section));
                }
                self.state.dirty = true;
            }
            Some(Err(e)) => log_error(&format!("copy code failed: {}", e)),
            None => {}
        }
    }

    fn process_search_completions(&mut self) {
        while let Ok(done) = self.search_rx.try_recv() {
            let seq = done.seq;
            let failure = done.outcome.as_ref().err().map(|e| e.to_string());
            if !self.state.search.resolve(seq, done.outcome, Instant::now()) {
                log_event(&format!("search #{} superseded, response dropped", seq));
                continue;
            }
            if let Some(reason) = failure {
                log_error(&format!("search #{} failed\n{}", seq, reason));
            }
            self.state.scroll_offset = 0;
            self.state.sync_code_blocks();
            self.state.dirty = true;
        }
    }

    fn process_clipboard(&mut self) {
        if let Err(e) = self.clipboard.poll() {
            log_error(&format!("clipboard fallback failed: {}", e));
        }
    }

    fn process_health_report(&mut self) {
        let Some(rx) = &self.health_rx else {
            return;
        };
        if let Ok(report) = rx.try_recv() {
            if let HealthReport::Unreachable(reason) = &report {
                log_error(&format!("health check failed: {}", reason));
            }
            self.state.health = report.into();
            self.health_rx = None;
            self.state.dirty = true;
        }
    }

    fn update_spinner_animation(&mut self, now: Instant) {
        if !self.state.search.is_busy() {
            return;
        }
        if now.duration_since(self.last_spinner) >= Duration::from_millis(SPINNER_FRAME_MS) {
            self.last_spinner = now;
            self.state.spinner_frame = (self.state.spinner_frame + 1) % SPINNER.len();
            self.state.dirty = true;
        }
    }
}
