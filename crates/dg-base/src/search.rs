//! Query lifecycle: one search at a time, last submission wins.
//!
//! The controller never performs I/O. `submit` hands back a [`SearchTicket`]
//! that the shell turns into exactly one call to the answering service; the
//! outcome comes back through `resolve`, tagged with the ticket's sequence
//! number. Outcomes for anything but the latest ticket are dropped.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::constants::SEARCH_FALLBACK_ERROR;

/// One answer entry from the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchResult {
    /// Only sent for the service's "No Results" placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub explanation: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Success payload of `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct SearchAnswer {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    /// Top-level narrative answer; empty when the service omits it
    #[serde(default)]
    pub response: String,
}

/// Typed error for answering service calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Transport failure (DNS, connection refused, reset)
    Network(String),
    /// Non-success HTTP status, with the body's message when it had one
    Api { status: u16, message: Option<String> },
    /// 2xx body that is not a valid answer
    Parse(String),
}

impl SearchError {
    /// Text for the error banner: the service's own reason when present.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Api { message: Some(msg), .. } if !msg.trim().is_empty() => msg.clone(),
            _ => SEARCH_FALLBACK_ERROR.to_string(),
        }
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Network(msg) => write!(f, "Network error: {}", msg),
            SearchError::Api { status, message: Some(msg) } => write!(f, "API error {}: {}", status, msg),
            SearchError::Api { status, message: None } => write!(f, "API error {}", status),
            SearchError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for SearchError {}

/// The live state of the current search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchRequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded { results: Vec<SearchResult>, response: String },
    Failed { message: String },
}

/// Handed out by `submit`; the shell issues one request per ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

/// Bookkeeping about the answer currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerMeta {
    pub query: String,
    /// Submit-to-resolve time of the request that produced the answer
    pub elapsed: Duration,
    /// Bumped every time a new answer replaces the displayed one
    pub generation: u64,
}

/// Borrowed view of whatever answer is on screen.
#[derive(Debug, Clone, Copy)]
pub struct DisplayedAnswer<'a> {
    pub results: &'a [SearchResult],
    pub response: &'a str,
    pub meta: &'a AnswerMeta,
}

#[derive(Debug, Default)]
pub struct SearchController {
    state: SearchRequestState,
    latest_seq: u64,
    latest_query: String,
    issued_at: Option<Instant>,
    /// Last successful answer once `state` has moved past `Succeeded`
    previous: Option<SearchAnswer>,
    meta: Option<AnswerMeta>,
    generation: u64,
}

impl SearchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SearchRequestState {
        &self.state
    }

    /// The submit control is disabled while the latest request is pending.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, SearchRequestState::InFlight)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SearchRequestState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Start a search. Blank queries are ignored: no transition, no ticket.
    pub fn submit(&mut self, query: &str, now: Instant) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let prev = std::mem::replace(&mut self.state, SearchRequestState::InFlight);
        if let SearchRequestState::Succeeded { results, response } = prev {
            self.previous = Some(SearchAnswer { results, response });
        }

        self.latest_seq += 1;
        self.latest_query = query.to_string();
        self.issued_at = Some(now);
        Some(SearchTicket { seq: self.latest_seq, query: self.latest_query.clone() })
    }

    /// Apply the outcome of request `seq`. Returns false (and changes
    /// nothing) when a newer submission has superseded it.
    pub fn resolve(&mut self, seq: u64, outcome: Result<SearchAnswer, SearchError>, now: Instant) -> bool {
        if seq != self.latest_seq || !self.is_busy() {
            return false;
        }

        match outcome {
            Ok(answer) => {
                self.generation += 1;
                let elapsed = self.issued_at.map(|t| now.saturating_duration_since(t)).unwrap_or_default();
                self.meta =
                    Some(AnswerMeta { query: self.latest_query.clone(), elapsed, generation: self.generation });
                self.previous = None;
                self.state = SearchRequestState::Succeeded { results: answer.results, response: answer.response };
            }
            Err(err) => {
                self.state = SearchRequestState::Failed { message: err.user_message() };
            }
        }
        self.issued_at = None;
        true
    }

    /// The answer on screen. A failed or pending search keeps showing the
    /// last successful one.
    pub fn displayed(&self) -> Option<DisplayedAnswer<'_>> {
        let meta = self.meta.as_ref()?;
        match &self.state {
            SearchRequestState::Succeeded { results, response } => {
                Some(DisplayedAnswer { results, response, meta })
            }
            _ => self
                .previous
                .as_ref()
                .map(|a| DisplayedAnswer { results: &a.results, response: &a.response, meta }),
        }
    }
}
