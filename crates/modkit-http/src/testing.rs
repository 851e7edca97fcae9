//! Canned-response transport for tests.
//!
//! Available to downstream crates through the `test-util` feature.
//! Responses are routed by URL substring, first match wins; unmatched
//! requests answer 404. Every executed request is recorded so tests can
//! assert on verbs, URLs, and headers.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::headers::HeaderMap;
use crate::transport::{Body, Request, Response, Sink, Transport, TransportResult};

/// One prepared response.
#[derive(Clone, Debug)]
pub struct CannedResponse {
    /// Status code to answer with.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl CannedResponse {
    /// A JSON response with the given status.
    #[must_use]
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    /// A raw byte response (e.g. an archive download).
    #[must_use]
    pub fn bytes(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    /// A bodyless response with the given status.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Attach a response header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Transport that answers from canned responses.
#[derive(Default)]
pub struct FakeTransport {
    routes: Vec<(String, CannedResponse)>,
    recorded: Mutex<Vec<Request>>,
}

impl FakeTransport {
    /// An empty fake; every request answers 404 until routes are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route requests whose URL contains `url_contains` to `response`.
    #[must_use]
    pub fn with_response(mut self, url_contains: &str, response: CannedResponse) -> Self {
        self.routes.push((url_contains.to_string(), response));
        self
    }

    /// All requests executed so far, in order.
    pub fn recorded(&self) -> Vec<Request> {
        self.recorded.lock().unwrap().clone()
    }

    fn find(&self, url: &str) -> CannedResponse {
        self.routes
            .iter()
            .find(|(pattern, _)| url.contains(pattern))
            .map_or_else(|| CannedResponse::status(404), |(_, r)| r.clone())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: Request, sink: Sink) -> TransportResult<Response> {
        let canned = self.find(&request.url);
        self.recorded.lock().unwrap().push(request);

        let body = match sink {
            Sink::Memory => Body::Memory(canned.body),
            Sink::File(mut file) => {
                file.write_all(&canned.body)?;
                file.flush()?;
                let written = canned.body.len() as u64;
                Body::File(file, written)
            }
        };

        Ok(Response {
            status: canned.status,
            headers: HeaderMap::from_pairs(canned.headers),
            body,
        })
    }
}
