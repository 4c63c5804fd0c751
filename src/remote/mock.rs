//! Scripted in-memory [`Transport`] for tests and offline demos.
//!
//! Responses are registered per method and path (optionally narrowed by
//! query parameters) and consumed in registration order. Every request is
//! recorded so tests can assert on what was sent.
//!
//! ```rust,ignore
//! let mock = Arc::new(MockTransport::new());
//! mock.on(Method::Get, "/contacts")
//!     .with_query("page", "2")
//!     .respond(200, json!({ "data": [], "pagination": { "total": 0 } }));
//! let release = mock.on(Method::Get, "/contacts").respond_gated(200, body);
//! // ... the request blocks until:
//! release.send(()).ok();
//! ```

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use super::{ApiError, ApiRequest, Method, RawResponse, Transport};

enum Reply {
    Respond { status: u16, body: Value },
    Network(String),
}

struct Expectation {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    reply: Reply,
    repeat: bool,
    delay: Option<Duration>,
    gate: Option<oneshot::Receiver<()>>,
}

impl Expectation {
    fn matches(&self, request: &ApiRequest) -> bool {
        self.method == request.method
            && self.path == request.path
            && self
                .query
                .iter()
                .all(|(k, v)| request.query_param(k) == Some(v.as_str()))
    }
}

/// A transport that replays registered responses.
#[derive(Default)]
pub struct MockTransport {
    expectations: Mutex<Vec<Expectation>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start registering a response for `method path`.
    pub fn on(&self, method: Method, path: impl Into<String>) -> ResponseBuilder<'_> {
        ResponseBuilder {
            mock: self,
            method,
            path: path.into(),
            query: Vec::new(),
            repeat: false,
            delay: None,
        }
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests received for one method and path.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    /// Registered responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.expectations.lock().len()
    }

    fn push(&self, expectation: Expectation) {
        self.expectations.lock().push(expectation);
    }

    /// Pick the reply for `request`, consuming one-shot expectations.
    fn take_reply(
        &self,
        request: &ApiRequest,
    ) -> Option<(Reply, Option<Duration>, Option<oneshot::Receiver<()>>)> {
        let mut expectations = self.expectations.lock();
        let index = expectations.iter().position(|e| e.matches(request))?;

        if expectations[index].repeat {
            let e = &expectations[index];
            let reply = match &e.reply {
                Reply::Respond { status, body } => Reply::Respond {
                    status: *status,
                    body: body.clone(),
                },
                Reply::Network(message) => Reply::Network(message.clone()),
            };
            return Some((reply, e.delay, None));
        }

        let e = expectations.remove(index);
        Some((e.reply, e.delay, e.gate))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        self.requests.lock().push(request.clone());

        let Some((reply, delay, gate)) = self.take_reply(&request) else {
            tracing::debug!(method = %request.method, path = %request.path, "no mock response");
            return Ok(json_response(
                404,
                &json!({ "message": format!("no mock route for {} {}", request.method, request.path) }),
            ));
        };

        if let Some(gate) = gate {
            gate.await
                .map_err(|_| ApiError::network("mock gate dropped before release"))?;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Respond { status, body } => Ok(json_response(status, &body)),
            Reply::Network(message) => Err(ApiError::network(message)),
        }
    }
}

fn json_response(status: u16, body: &Value) -> RawResponse {
    RawResponse {
        status,
        reason: None,
        body: serde_json::to_vec(body).unwrap_or_default(),
    }
}

/// Builder returned by [`MockTransport::on`].
pub struct ResponseBuilder<'a> {
    mock: &'a MockTransport,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    repeat: bool,
    delay: Option<Duration>,
}

impl ResponseBuilder<'_> {
    /// Only match requests carrying this query parameter value.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Serve this response for every matching request instead of once.
    pub fn repeat(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Wait before answering.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, status: u16, body: Value) {
        self.register(Reply::Respond { status, body }, None);
    }

    /// Answer only once the returned sender fires.
    ///
    /// Gated responses are always one-shot.
    pub fn respond_gated(mut self, status: u16, body: Value) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.repeat = false;
        self.register(Reply::Respond { status, body }, Some(rx));
        tx
    }

    /// Fail as if the connection dropped.
    pub fn fail_network(self, message: &str) {
        self.register(Reply::Network(message.to_string()), None);
    }

    fn register(self, reply: Reply, gate: Option<oneshot::Receiver<()>>) {
        self.mock.push(Expectation {
            method: self.method,
            path: self.path,
            query: self.query,
            reply,
            repeat: self.repeat,
            delay: self.delay,
            gate,
        });
    }
}
