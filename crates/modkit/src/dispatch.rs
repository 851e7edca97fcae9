//! Request dispatch and generic error recovery.
//!
//! Every façade call builds a [`Call`] and hands it to [`Shared`], the
//! state all worker tasks operate on. Completion runs generic recovery
//! first (rate-limit bookkeeping on 429, credential invalidation on
//! 401), then checks the endpoint's expected status, then parses the
//! body. Continuations receive the typed outcome exactly once.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use modkit_core::{Error, Layout};
use modkit_http::{Request, Sink, Transport};

use crate::auth::TokenStore;
use crate::routes::Routes;

/// One dispatched request plus its per-call context.
pub(crate) struct Call {
    pub request: Request,
    /// Status code that counts as success for this endpoint.
    pub expect: u16,
    /// Whether the request was authenticated with the bearer token.
    pub bearer: bool,
}

impl Call {
    pub fn expecting(request: Request, expect: u16) -> Self {
        Self {
            request,
            expect,
            bearer: false,
        }
    }

    pub fn with_bearer(mut self) -> Self {
        self.bearer = true;
        self
    }
}

/// Client state shared between the façade and worker tasks.
pub(crate) struct Shared {
    pub transport: Box<dyn Transport>,
    pub routes: Routes,
    pub layout: Layout,
    pub tokens: TokenStore,
    pub unzip: bool,
    pub default_game_id: u64,
    rate_limited_until: Mutex<Option<Instant>>,
    api_key_invalid: AtomicBool,
    /// In-flight installs, keyed by `(game_id, mod_id)`. Membership
    /// defines `is_downloading`.
    pub installs: Mutex<BTreeSet<(u64, u64)>>,
}

impl Shared {
    pub fn new(
        transport: Box<dyn Transport>,
        routes: Routes,
        layout: Layout,
        tokens: TokenStore,
        unzip: bool,
        default_game_id: u64,
    ) -> Self {
        Self {
            transport,
            routes,
            layout,
            tokens,
            unzip,
            default_game_id,
            rate_limited_until: Mutex::new(None),
            api_key_invalid: AtomicBool::new(false),
            installs: Mutex::new(BTreeSet::new()),
        }
    }

    /// Resolve a per-call game id of 0 to the configured default.
    pub fn resolve_game_id(&self, game_id: u64) -> u64 {
        if game_id == 0 {
            self.default_game_id
        } else {
            game_id
        }
    }

    /// Execute a call and apply generic recovery to the outcome.
    pub async fn perform(&self, call: Call) -> Result<modkit_http::Response, Error> {
        let bearer = call.bearer;
        let expect = call.expect;
        let response = self
            .transport
            .execute(call.request, Sink::Memory)
            .await
            .map_err(|err| Error::transport(err.to_string()))?;
        self.settle(response, expect, bearer)
    }

    /// Execute a call and parse the response body as a JSON document.
    pub async fn fetch_document(&self, call: Call) -> Result<Value, Error> {
        let response = self.perform(call).await?;
        Ok(serde_json::from_slice(response.body.bytes())?)
    }

    /// Generic error recovery, run before any endpoint-specific handling.
    fn settle(
        &self,
        response: modkit_http::Response,
        expect: u16,
        bearer: bool,
    ) -> Result<modkit_http::Response, Error> {
        match response.status {
            429 => {
                let retry_after_secs = response
                    .headers
                    .get("X-RateLimit-RetryAfter")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(0);
                warn!(retry_after_secs, "rate limited by the service");
                self.suspend_for(retry_after_secs);
                Err(Error::RateLimited { retry_after_secs })
            }
            401 => {
                if bearer {
                    debug!("bearer token rejected; clearing stored token");
                    self.tokens.clear();
                } else {
                    self.api_key_invalid.store(true, Ordering::SeqCst);
                }
                Err(Error::AuthExpired)
            }
            status if status == expect => Ok(response),
            status => Err(Error::protocol(status)),
        }
    }

    /// Extend the rate-limit window to `secs` from now.
    pub fn suspend_for(&self, secs: u64) {
        let until = Instant::now() + Duration::from_secs(secs);
        *self.rate_limited_until.lock().unwrap() = Some(until);
    }

    /// Seconds remaining in the rate-limit window, or a negative value
    /// when not limited.
    pub fn ratelimit_remaining_secs(&self) -> i64 {
        let until = *self.rate_limited_until.lock().unwrap();
        match until {
            Some(until) => {
                let now = Instant::now();
                if until <= now {
                    return -1;
                }
                let remaining = until - now;
                let mut secs = i64::try_from(remaining.as_secs()).unwrap_or(i64::MAX);
                if remaining.subsec_nanos() > 0 {
                    secs = secs.saturating_add(1);
                }
                secs
            }
            None => -1,
        }
    }

    /// Whether the service has rejected the configured api key.
    pub fn api_key_invalid(&self) -> bool {
        self.api_key_invalid.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use modkit_http::testing::{CannedResponse, FakeTransport};

    fn shared_with(transport: FakeTransport, dir: &std::path::Path) -> Shared {
        let layout = Layout::new(dir.to_str().unwrap());
        let tokens = TokenStore::new(layout.token_path());
        Shared::new(
            Box::new(transport),
            Routes::new(Environment::Live, "K".to_string()),
            layout,
            tokens,
            false,
            0,
        )
    }

    fn games_call() -> Call {
        Call::expecting(Request::get("https://api.mod.io/v1/games?api_key=K&"), 200)
    }

    #[tokio::test]
    async fn success_parses_document() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new().with_response(
            "/games",
            CannedResponse::json(200, r#"{"data":[],"result_total":0}"#),
        );
        let shared = shared_with(transport, dir.path());

        let document = shared.fetch_document(games_call()).await.unwrap();
        assert!(document.get("data").is_some());
    }

    #[tokio::test]
    async fn unexpected_status_is_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport =
            FakeTransport::new().with_response("/games", CannedResponse::status(500));
        let shared = shared_with(transport, dir.path());

        let err = shared.fetch_document(games_call()).await.unwrap_err();
        assert!(matches!(err, Error::Protocol { status: 500 }));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new()
            .with_response("/games", CannedResponse::json(200, "{not json"));
        let shared = shared_with(transport, dir.path());

        let err = shared.fetch_document(games_call()).await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn rate_limit_opens_window() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new().with_response(
            "/games",
            CannedResponse::status(429).with_header("X-RateLimit-RetryAfter", "30"),
        );
        let shared = shared_with(transport, dir.path());

        assert_eq!(shared.ratelimit_remaining_secs(), -1);

        let err = shared.fetch_document(games_call()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RateLimited {
                retry_after_secs: 30
            }
        ));

        let remaining = shared.ratelimit_remaining_secs();
        assert!(remaining > 0 && remaining <= 30, "remaining = {remaining}");
    }

    #[tokio::test]
    async fn expired_window_reads_negative() {
        let dir = tempfile::tempdir().unwrap();
        let shared = shared_with(FakeTransport::new(), dir.path());

        shared.suspend_for(0);
        // Give the zero-length window a moment to lapse.
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(shared.ratelimit_remaining_secs(), -1);
    }

    #[tokio::test]
    async fn unauthorized_bearer_call_clears_token() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new().with_response("/me", CannedResponse::status(401));
        let shared = shared_with(transport, dir.path());
        shared.tokens.save("TOK").unwrap();
        let token_path = shared.layout.token_path();
        assert!(token_path.is_file());

        let call =
            Call::expecting(Request::get("https://api.mod.io/v1/me"), 200).with_bearer();
        let err = shared.fetch_document(call).await.unwrap_err();

        assert!(matches!(err, Error::AuthExpired));
        assert!(!shared.tokens.is_authenticated());
        assert!(!token_path.exists());
        assert!(!shared.api_key_invalid());
    }

    #[tokio::test]
    async fn unauthorized_api_key_call_sets_flag() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new().with_response("/games", CannedResponse::status(401));
        let shared = shared_with(transport, dir.path());

        let err = shared.fetch_document(games_call()).await.unwrap_err();
        assert!(matches!(err, Error::AuthExpired));
        assert!(shared.api_key_invalid());
        assert!(!shared.tokens.is_authenticated());
    }

    #[tokio::test]
    async fn missing_retry_header_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let transport =
            FakeTransport::new().with_response("/games", CannedResponse::status(429));
        let shared = shared_with(transport, dir.path());

        let err = shared.fetch_document(games_call()).await.unwrap_err();
        assert!(matches!(err, Error::RateLimited { retry_after_secs: 0 }));
    }

    #[test]
    fn resolve_game_id_prefers_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().to_str().unwrap());
        let tokens = TokenStore::new(layout.token_path());
        let shared = Shared::new(
            Box::new(FakeTransport::new()),
            Routes::new(Environment::Live, "K".to_string()),
            layout,
            tokens,
            false,
            309,
        );

        assert_eq!(shared.resolve_game_id(0), 309);
        assert_eq!(shared.resolve_game_id(7), 7);
    }
}
