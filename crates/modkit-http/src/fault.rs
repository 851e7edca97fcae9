//! Fault injection for resilience testing.
//!
//! [`FaultTransport`] wraps any [`Transport`] and, per configuration,
//! short-circuits requests with a synthetic 500 and/or delays
//! completions. Host programs use it to exercise their error paths
//! against realistic latency without a misbehaving server.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::headers::HeaderMap;
use crate::transport::{Body, Request, Response, Sink, Transport, TransportResult};

/// Fault-injection parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaultConfig {
    /// Percentage of requests to fail with a synthetic 500, in `0..=100`.
    pub error_rate: u8,
    /// Lower bound of the injected delay, in milliseconds.
    pub min_delay_ms: u64,
    /// Upper bound of the injected delay, in milliseconds. Must be
    /// `>= min_delay_ms`; `0` disables delays entirely.
    pub max_delay_ms: u64,
}

impl FaultConfig {
    /// Build a configuration.
    ///
    /// # Panics
    ///
    /// Panics when `error_rate > 100` or `max_delay_ms < min_delay_ms`
    /// with a non-zero maximum.
    #[must_use]
    pub fn new(error_rate: u8, min_delay_ms: u64, max_delay_ms: u64) -> Self {
        assert!(error_rate <= 100, "error rate is a percentage");
        assert!(
            max_delay_ms == 0 || max_delay_ms >= min_delay_ms,
            "delay range is inverted"
        );
        Self {
            error_rate,
            min_delay_ms,
            max_delay_ms,
        }
    }

    /// Whether this configuration changes any behavior.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.error_rate == 0 && self.max_delay_ms == 0
    }

    // Draws happen before any await so the RNG handle never crosses a
    // suspension point.
    fn draw_error(&self) -> bool {
        self.error_rate > 0 && rand::thread_rng().gen_range(0..100) < u32::from(self.error_rate)
    }

    fn draw_delay(&self) -> Option<Duration> {
        if self.max_delay_ms == 0 {
            return None;
        }
        let ms = rand::thread_rng().gen_range(self.min_delay_ms..=self.max_delay_ms);
        Some(Duration::from_millis(ms))
    }
}

/// Transport decorator that injects faults per [`FaultConfig`].
pub struct FaultTransport<T> {
    inner: T,
    config: FaultConfig,
}

impl<T> FaultTransport<T> {
    /// Wrap `inner` with the given fault configuration.
    pub const fn new(inner: T, config: FaultConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl<T: Transport> Transport for FaultTransport<T> {
    async fn execute(&self, request: Request, sink: Sink) -> TransportResult<Response> {
        if self.config.draw_error() {
            let delay = self.config.draw_delay();
            debug!(url = %request.url, "injecting synthetic 500");
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            // Mirrors a transport-level failure: empty body, no headers.
            let body = match sink {
                Sink::Memory => Body::Memory(Vec::new()),
                Sink::File(file) => Body::File(file, 0),
            };
            return Ok(Response {
                status: 500,
                headers: HeaderMap::new(),
                body,
            });
        }

        let delay = self.config.draw_delay();
        let response = self.inner.execute(request, sink).await?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(response)
    }
}
