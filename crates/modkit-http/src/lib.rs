//! HTTP transport layer for modkit.
//!
//! Provides the request engine ([`transport`]), the case-insensitive
//! response header map ([`headers`]), percent-encoding ([`encode`]),
//! and fault injection ([`fault`]). The [`testing`] module (behind the
//! `test-util` feature) offers a canned-response transport for
//! downstream test suites.

pub mod encode;
pub mod fault;
pub mod headers;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use encode::percent_encode;
pub use fault::{FaultConfig, FaultTransport};
pub use headers::HeaderMap;
pub use transport::{
    Body, HttpTransport, Request, Response, Sink, Transport, TransportError, TransportResult, Verb,
};
