//! HTTP request engine.
//!
//! The [`Transport`] trait hides the concrete HTTP stack so the client
//! can be exercised against canned responses (see [`crate::testing`]).
//! The production implementation is [`HttpTransport`], built on reqwest.
//!
//! A response body lands either in memory or, for downloads, is
//! streamed chunk by chunk into a caller-provided open file. The
//! transport never seeks and never closes that file; it hands the
//! handle back inside the response so the caller can keep using it.

use std::fs::File;
use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::headers::HeaderMap;

/// Result type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// HTTP request verb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    /// GET; carries no body.
    Get,
    /// POST; carries the request body verbatim.
    Post,
    /// PUT; carries the request body verbatim.
    Put,
    /// DELETE; carries no body.
    Delete,
}

impl Verb {
    /// Wire name of the verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// One outbound request.
#[derive(Clone, Debug)]
pub struct Request {
    /// Request verb.
    pub verb: Verb,
    /// Absolute request URL.
    pub url: String,
    /// Headers to send, in order.
    pub headers: Vec<(String, String)>,
    /// Body bytes; sent bit-exact for POST/PUT, ignored for GET/DELETE.
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// A GET request for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Verb::Get, url)
    }

    /// A request with the given verb.
    pub fn new(verb: Verb, url: impl Into<String>) -> Self {
        Self {
            verb,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a request header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Attach a request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Where the response body should land.
#[derive(Debug)]
pub enum Sink {
    /// Accumulate the body in memory.
    Memory,
    /// Stream each chunk into this open file, positioned for writing.
    File(File),
}

/// A completed response body.
#[derive(Debug)]
pub enum Body {
    /// In-memory body bytes.
    Memory(Vec<u8>),
    /// The file the body was streamed into, plus the byte count written.
    /// The handle is the same one supplied in [`Sink::File`].
    File(File, u64),
}

impl Body {
    /// Body bytes for in-memory responses; empty for streamed ones.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Memory(bytes) => bytes,
            Self::File(..) => &[],
        }
    }

    /// Number of body bytes received.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Memory(bytes) => bytes.len() as u64,
            Self::File(_, written) => *written,
        }
    }

    /// Whether no body bytes were received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A completed HTTP exchange.
#[derive(Debug)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Parsed response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Body,
}

/// Errors produced by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be completed on the network.
    #[error("network error: {0}")]
    Network(String),

    /// The request URL did not parse.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// Writing a streamed body chunk to the sink file failed.
    #[error("response sink error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Issues HTTP requests and delivers completed responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request, landing the body in `sink`.
    async fn execute(&self, request: Request, sink: Sink) -> TransportResult<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn execute(&self, request: Request, sink: Sink) -> TransportResult<Response> {
        (**self).execute(request, sink).await
    }
}

/// Production transport backed by reqwest.
///
/// Redirects are followed transparently (reqwest's default policy).
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the transport with the given user agent and request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request, sink: Sink) -> TransportResult<Response> {
        let url =
            Url::parse(&request.url).map_err(|err| TransportError::InvalidUrl(err.to_string()))?;

        let method = match request.verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if matches!(request.verb, Verb::Post | Verb::Put) {
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = HeaderMap::from_pairs(response.headers().iter().map(|(key, value)| {
            (
                key.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        }));
        debug!(verb = request.verb.as_str(), url = %request.url, status, "request completed");

        let body = match sink {
            Sink::Memory => Body::Memory(response.bytes().await?.to_vec()),
            Sink::File(mut file) => {
                let mut written: u64 = 0;
                let mut stream = response.bytes_stream();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    file.write_all(&chunk)?;
                    written += chunk.len() as u64;
                }
                file.flush()?;
                Body::File(file, written)
            }
        };

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_wire_names() {
        assert_eq!(Verb::Get.as_str(), "GET");
        assert_eq!(Verb::Post.as_str(), "POST");
        assert_eq!(Verb::Put.as_str(), "PUT");
        assert_eq!(Verb::Delete.as_str(), "DELETE");
    }

    #[test]
    fn request_builder() {
        let request = Request::get("https://api.example/v1/games")
            .with_header("Accept", "application/json")
            .with_header("Authorization", "Bearer tok");

        assert_eq!(request.verb, Verb::Get);
        assert_eq!(request.headers.len(), 2);
        assert!(request.body.is_none());

        let request = Request::new(Verb::Post, "https://api.example/v1/oauth/emailrequest")
            .with_body(&b"api_key=k&email=a%40b.cc"[..]);
        assert_eq!(request.body.as_deref(), Some(&b"api_key=k&email=a%40b.cc"[..]));
    }

    #[test]
    fn body_accessors() {
        let body = Body::Memory(b"abc".to_vec());
        assert_eq!(body.bytes(), b"abc");
        assert_eq!(body.len(), 3);
        assert!(!body.is_empty());

        let body = Body::Memory(Vec::new());
        assert!(body.is_empty());
    }

    #[test]
    fn streamed_body_reports_written_bytes() {
        let file = tempfile::tempfile().unwrap();
        let body = Body::File(file, 42);
        assert_eq!(body.len(), 42);
        assert!(body.bytes().is_empty());
    }

    #[test]
    fn transport_construction() {
        let transport = HttpTransport::new("modkit-test/0", Duration::from_secs(5));
        assert!(transport.is_ok());
    }
}
