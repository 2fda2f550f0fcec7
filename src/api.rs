//! HTTP client for the answering service and the worker threads that call it.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use dg_base::config::constants::{HEALTH_PATH, SEARCH_PATH};
use dg_base::search::{SearchAnswer, SearchError, SearchTicket};

/// Longest error body kept in a message
const MAX_ERROR_BODY: usize = 300;

/// Remote service answering documentation queries.
pub trait AnswerService: Send + Sync {
    fn search(&self, query: &str) -> Result<SearchAnswer, SearchError>;

    /// Reported status string, e.g. "healthy".
    fn health(&self) -> Result<String, SearchError>;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

pub struct HttpAnswerService {
    client: Client,
    base_url: String,
}

impl HttpAnswerService {
    /// `timeout` of None disables the transport timeout entirely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(timeout).build().map_err(network)?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl AnswerService for HttpAnswerService {
    fn search(&self, query: &str) -> Result<SearchAnswer, SearchError> {
        let resp = self
            .client
            .post(self.url(SEARCH_PATH))
            .header("Accept", "application/json")
            .json(&SearchRequest { query })
            .send()
            .map_err(network)?;

        let status = resp.status();
        let body = resp.text().map_err(network)?;
        if !status.is_success() {
            return Err(SearchError::Api { status: status.as_u16(), message: error_message(&body) });
        }
        parse_answer(&body)
    }

    fn health(&self) -> Result<String, SearchError> {
        let resp = self.client.get(self.url(HEALTH_PATH)).timeout(Duration::from_secs(5)).send().map_err(network)?;
        let status = resp.status();
        let body = resp.text().map_err(network)?;
        if !status.is_success() {
            return Err(SearchError::Api { status: status.as_u16(), message: error_message(&body) });
        }
        serde_json::from_str::<HealthResponse>(&body)
            .map(|h| h.status)
            .map_err(|e| SearchError::Parse(format!("health response: {}", e)))
    }
}

fn network(e: reqwest::Error) -> SearchError {
    SearchError::Network(e.to_string())
}

pub fn parse_answer(body: &str) -> Result<SearchAnswer, SearchError> {
    serde_json::from_str(body).map_err(|e| SearchError::Parse(format!("{} in: {}", e, truncate(body))))
}

/// Reason carried by an error body: `message` first, then a FastAPI-style
/// `detail` (a string, or a validation list whose first `msg` is used).
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
        return Some(msg.to_string());
    }
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            items.first().and_then(|i| i.get("msg")).and_then(|m| m.as_str()).map(|m| m.to_string())
        }
        _ => None,
    }
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// Worker threads
// ============================================================================

/// Outcome of one submission, tagged with its sequence number.
#[derive(Debug)]
pub struct SearchCompletion {
    pub seq: u64,
    pub outcome: Result<SearchAnswer, SearchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthReport {
    Healthy(String),
    Unreachable(String),
}

/// Run one search off the UI thread. The receiver decides whether the
/// completion is still wanted.
pub fn dispatch(ticket: SearchTicket, service: Arc<dyn AnswerService>, tx: Sender<SearchCompletion>) {
    thread::spawn(move || {
        let outcome = service.search(&ticket.query);
        let _ = tx.send(SearchCompletion { seq: ticket.seq, outcome });
    });
}

pub fn spawn_health_check(service: Arc<dyn AnswerService>, tx: Sender<HealthReport>) {
    thread::spawn(move || {
        let report = match service.health() {
            Ok(status) => HealthReport::Healthy(status),
            Err(e) => HealthReport::Unreachable(e.to_string()),
        };
        let _ = tx.send(report);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::time::Instant;

    use dg_base::search::{SearchController, SearchRequestState};

    /// Serve exactly one canned HTTP response and hand back the request body.
    fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = stream;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8(request_body).unwrap()
        });
        (format!("http://{}", addr), handle)
    }

    struct FakeService {
        delay: Duration,
        answer: Result<SearchAnswer, SearchError>,
    }

    impl AnswerService for FakeService {
        fn search(&self, _query: &str) -> Result<SearchAnswer, SearchError> {
            thread::sleep(self.delay);
            self.answer.clone()
        }
        fn health(&self) -> Result<String, SearchError> {
            Err(SearchError::Network("connection refused".into()))
        }
    }

    /// Loopback service that ignores any proxy configured in the environment.
    fn local_service(base: &str) -> HttpAnswerService {
        let client = Client::builder().no_proxy().timeout(Duration::from_secs(5)).build().unwrap();
        HttpAnswerService::with_client(client, base)
    }

    fn answer(response: &str) -> SearchAnswer {
        SearchAnswer { results: Vec::new(), response: response.to_string() }
    }

    #[test]
    fn message_field_wins() {
        assert_eq!(error_message(r#"{"message": "rate limited", "detail": "x"}"#).as_deref(), Some("rate limited"));
    }

    #[test]
    fn detail_string_and_list() {
        assert_eq!(error_message(r#"{"detail": "Not Found"}"#).as_deref(), Some("Not Found"));
        let list = r#"{"detail": [{"loc": ["body", "query"], "msg": "field required"}]}"#;
        assert_eq!(error_message(list).as_deref(), Some("field required"));
    }

    #[test]
    fn unusable_bodies_have_no_message() {
        assert_eq!(error_message("<html>502 Bad Gateway</html>"), None);
        assert_eq!(error_message(r#"{"error": "x"}"#), None);
        assert_eq!(error_message(""), None);
    }

    #[test]
    fn parse_error_is_truncated() {
        let body = "x".repeat(1000);
        match parse_answer(&body) {
            Err(SearchError::Parse(msg)) => assert!(msg.len() < 400),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn http_success_round_trip() {
        let (base, server) = one_shot_server("200 OK", r#"{"results": [], "response": "Use OAuth2."}"#);
        let service = local_service(&format!("{}/", base));
        assert_eq!(service.url("/api/search"), format!("{}/api/search", base));

        let got = service.search("How to implement authentication?").unwrap();
        assert!(got.results.is_empty());
        assert_eq!(got.response, "Use OAuth2.");

        let sent: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(sent, serde_json::json!({"query": "How to implement authentication?"}));
    }

    #[test]
    fn http_error_status_carries_message() {
        let (base, server) = one_shot_server("500 Internal Server Error", r#"{"message": "rate limited"}"#);
        let service = local_service(&base);
        let err = service.search("x").unwrap_err();
        assert_eq!(err, SearchError::Api { status: 500, message: Some("rate limited".into()) });
        assert_eq!(err.user_message(), "rate limited");
        server.join().unwrap();
    }

    #[test]
    fn http_health() {
        let (base, server) = one_shot_server("200 OK", r#"{"status": "healthy"}"#);
        let service = local_service(&base);
        assert_eq!(service.health().unwrap(), "healthy");
        server.join().unwrap();
    }

    #[test]
    fn unreachable_service_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let service = local_service(&format!("http://{}", addr));
        assert!(matches!(service.search("x"), Err(SearchError::Network(_))));
    }

    #[test]
    fn dispatch_delivers_tagged_completion() {
        let (tx, rx) = mpsc::channel();
        let service: Arc<dyn AnswerService> =
            Arc::new(FakeService { delay: Duration::ZERO, answer: Ok(answer("Use OAuth2.")) });
        dispatch(SearchTicket { seq: 7, query: "q".into() }, service, tx);
        let done = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(done.seq, 7);
        assert_eq!(done.outcome.unwrap().response, "Use OAuth2.");
    }

    #[test]
    fn later_submission_wins_over_slow_earlier_one() {
        let (tx, rx) = mpsc::channel();
        let slow: Arc<dyn AnswerService> =
            Arc::new(FakeService { delay: Duration::from_millis(200), answer: Ok(answer("from A")) });
        let fast: Arc<dyn AnswerService> =
            Arc::new(FakeService { delay: Duration::ZERO, answer: Ok(answer("from B")) });

        let mut ctl = SearchController::new();
        let t0 = Instant::now();
        let a = ctl.submit("first", t0).unwrap();
        dispatch(a, slow, tx.clone());
        let b = ctl.submit("second", t0).unwrap();
        dispatch(b, fast, tx);

        for _ in 0..2 {
            let done = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            ctl.resolve(done.seq, done.outcome, Instant::now());
        }
        match ctl.state() {
            SearchRequestState::Succeeded { response, .. } => assert_eq!(response, "from B"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn health_check_reports_unreachable() {
        let (tx, rx) = mpsc::channel();
        let service: Arc<dyn AnswerService> =
            Arc::new(FakeService { delay: Duration::ZERO, answer: Ok(answer("")) });
        spawn_health_check(service, tx);
        let report = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(report, HealthReport::Unreachable("Network error: connection refused".into()));
    }
}
