//! The client handle and public façade.
//!
//! [`Modio::init`] brings up the whole stack: root directory, token
//! store, transport, and a dedicated multi-thread runtime. Every
//! endpoint call validates its preconditions, builds the request, and
//! spawns one worker task; the caller never blocks. Results arrive
//! through the continuation passed to the call, which runs on a worker
//! thread and is invoked exactly once.
//!
//! Continuations receive borrowed record views. Anything a caller wants
//! to keep beyond the callback must be copied out:
//!
//! ```no_run
//! # let client = modkit::Modio::init(modkit::ClientConfig::new(
//! #     "0123456789abcdef0123456789abcdef")).unwrap();
//! client.get_games(None, |outcome| {
//!     if let Ok((games, _)) = outcome {
//!         for game in &games {
//!             println!("{} {}", game.id, game.name);
//!         }
//!     }
//! });
//! ```

use std::sync::Arc;

use tokio::runtime::Runtime;

use modkit_core::{
    decode_page, Dependency, Error, Event, Game, InitError, Layout, Mod, Modfile, Pagination,
    Rating, User,
};
use modkit_http::{
    percent_encode, FaultTransport, HttpTransport, Request, Transport, Verb,
};

use crate::auth::TokenStore;
use crate::config::{api_key_is_valid, ClientConfig};
use crate::dispatch::{Call, Shared};
use crate::routes::Routes;

const ACCEPT_JSON: (&str, &str) = ("Accept", "application/json");
const FORM_URLENCODED: (&str, &str) = ("Content-Type", "application/x-www-form-urlencoded");

fn api_key_get(url: String) -> Request {
    Request::get(url).with_header(ACCEPT_JSON.0, ACCEPT_JSON.1)
}

/// Outcome delivered to list continuations: the decoded records plus
/// pagination, or the error the dispatcher settled on.
pub type PageResult<T> = Result<(Vec<T>, Pagination), Error>;

/// Outcome of a subscribe/unsubscribe call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionChange {
    /// The mod whose subscription changed.
    pub mod_id: u64,
    /// `+1` on subscribe, `-1` on unsubscribe.
    pub delta: i8,
}

/// Handle to one client instance.
///
/// Created by [`Modio::init`], destroyed by [`Modio::deinit`] (or drop).
/// All endpoint calls return immediately after dispatch; dropping the
/// handle while calls are still in flight abandons their worker tasks,
/// so quiesce traffic first.
pub struct Modio {
    pub(crate) runtime: Runtime,
    pub(crate) shared: Arc<Shared>,
}

impl Modio {
    /// Bring up a client with the production HTTP transport.
    pub fn init(config: ClientConfig) -> Result<Self, InitError> {
        let transport = HttpTransport::new(&config.user_agent, config.timeout)
            .map_err(|err| InitError::transport(err.to_string()))?;
        if config.faults.is_noop() {
            Self::with_transport(config, Box::new(transport))
        } else {
            let faults = config.faults;
            Self::with_transport(config, Box::new(FaultTransport::new(transport, faults)))
        }
    }

    /// Bring up a client over a custom [`Transport`].
    ///
    /// This is the seam for instrumentation and tests; `init` uses it
    /// with the reqwest transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Box<dyn Transport>,
    ) -> Result<Self, InitError> {
        if !api_key_is_valid(&config.api_key) {
            return Err(InitError::BadApiKey);
        }

        let layout = Layout::new(&config.root);
        std::fs::create_dir_all(layout.root())
            .map_err(|err| InitError::bad_root_path(err.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("modkit-worker")
            .build()
            .map_err(|err| InitError::transport(err.to_string()))?;

        let tokens = TokenStore::new(layout.token_path());
        let routes = Routes::new(config.environment, config.api_key.clone());
        let shared = Arc::new(Shared::new(
            transport,
            routes,
            layout,
            tokens,
            config.unzip,
            config.default_game_id,
        ));

        Ok(Self { runtime, shared })
    }

    /// Tear the client down.
    ///
    /// Equivalent to dropping the handle. In-flight continuations that
    /// have not fired yet never will; callers are responsible for
    /// quiescing traffic first. Must not be called from within an async
    /// context (the owned runtime is shut down here).
    pub fn deinit(self) {
        drop(self);
    }

    // ========================================================================
    // Local observers
    // ========================================================================

    /// Whether a bearer token is held.
    pub fn is_authenticated(&self) -> bool {
        self.shared.tokens.is_authenticated()
    }

    /// Drop the bearer token and delete its file.
    pub fn deauthenticate(&self) {
        self.shared.tokens.clear();
    }

    /// Seconds remaining in the current rate-limit window, or a negative
    /// value when not limited.
    pub fn is_ratelimited(&self) -> i64 {
        self.shared.ratelimit_remaining_secs()
    }

    /// Whether the service has rejected the configured api key with 401.
    pub fn is_api_key_invalid(&self) -> bool {
        self.shared.api_key_invalid()
    }

    // ========================================================================
    // Read endpoints
    // ========================================================================

    /// Retrieve the games available on the configured environment.
    pub fn get_games<F>(&self, filter: Option<&str>, callback: F)
    where
        F: for<'doc> FnOnce(PageResult<Game<'doc>>) + Send + 'static,
    {
        let call = Call::expecting(api_key_get(self.shared.routes.games(filter)), 200);
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
    }

    /// Retrieve mods for a game. `game_id` 0 means the configured
    /// default game.
    pub fn get_mods<F>(&self, filter: Option<&str>, game_id: u64, callback: F)
    where
        F: for<'doc> FnOnce(PageResult<Mod<'doc>>) + Send + 'static,
    {
        let game_id = self.shared.resolve_game_id(game_id);
        assert!(game_id > 0, "game id required");

        let call = Call::expecting(
            api_key_get(self.shared.routes.mods(game_id, filter)),
            200,
        );
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
    }

    /// Retrieve a single mod; delivered as a one-element list.
    pub fn get_mod<F>(&self, game_id: u64, mod_id: u64, callback: F)
    where
        F: for<'doc> FnOnce(PageResult<Mod<'doc>>) + Send + 'static,
    {
        let game_id = self.shared.resolve_game_id(game_id);
        assert!(game_id > 0, "game id required");
        assert!(mod_id > 0, "mod id required");

        let call = Call::expecting(
            api_key_get(self.shared.routes.mod_by_id(game_id, mod_id)),
            200,
        );
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
    }

    /// Retrieve modfiles of a mod. A `modfile_id` of 0 lists all files;
    /// a non-zero id fetches that file. Both deliver a list.
    pub fn get_modfiles<F>(
        &self,
        filter: Option<&str>,
        game_id: u64,
        mod_id: u64,
        modfile_id: u64,
        callback: F,
    ) where
        F: for<'doc> FnOnce(PageResult<Modfile<'doc>>) + Send + 'static,
    {
        let game_id = self.shared.resolve_game_id(game_id);
        assert!(game_id > 0, "game id required");
        assert!(mod_id > 0, "mod id required");

        let call = Call::expecting(
            api_key_get(
                self.shared
                    .routes
                    .modfiles(game_id, mod_id, modfile_id, filter),
            ),
            200,
        );
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
    }

    /// Retrieve the dependencies of a mod.
    pub fn get_dependencies<F>(&self, game_id: u64, mod_id: u64, callback: F)
    where
        F: for<'doc> FnOnce(PageResult<Dependency<'doc>>) + Send + 'static,
    {
        let game_id = self.shared.resolve_game_id(game_id);
        assert!(game_id > 0, "game id required");
        assert!(mod_id > 0, "mod id required");

        let call = Call::expecting(
            api_key_get(self.shared.routes.dependencies(game_id, mod_id)),
            200,
        );
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
    }

    /// Retrieve the event stream of one mod (`mod_id` > 0) or of all
    /// mods of a game (`mod_id` 0). `newer_than` > 0 restricts to events
    /// after that Unix timestamp.
    pub fn get_mod_events<F>(
        &self,
        filter: Option<&str>,
        game_id: u64,
        mod_id: u64,
        newer_than: u64,
        callback: F,
    ) where
        F: for<'doc> FnOnce(PageResult<Event<'doc>>) + Send + 'static,
    {
        let game_id = self.shared.resolve_game_id(game_id);
        assert!(game_id > 0, "game id required");

        let call = Call::expecting(
            api_key_get(
                self.shared
                    .routes
                    .mod_events(game_id, mod_id, newer_than, filter),
            ),
            200,
        );
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Request a security code by email. The service mails a 5-character
    /// code for [`Modio::email_exchange`].
    pub fn email_request<F>(&self, email: &str, callback: F)
    where
        F: FnOnce(Result<(), Error>) + Send + 'static,
    {
        let body = format!(
            "api_key={}&email={}",
            self.shared.routes.api_key(),
            percent_encode(email.as_bytes())
        );
        let request = Request::new(Verb::Post, self.shared.routes.email_request())
            .with_header(ACCEPT_JSON.0, ACCEPT_JSON.1)
            .with_header(FORM_URLENCODED.0, FORM_URLENCODED.1)
            .with_body(body.into_bytes());

        let call = Call::expecting(request, 200);
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            callback(shared.perform(call).await.map(|_| ()));
        });
    }

    /// Exchange the emailed security code for a bearer token. On success
    /// the token is persisted and the continuation receives it.
    pub fn email_exchange<F>(&self, security_code: &str, callback: F)
    where
        F: FnOnce(Result<String, Error>) + Send + 'static,
    {
        let body = format!(
            "api_key={}&security_code={}",
            self.shared.routes.api_key(),
            percent_encode(security_code.as_bytes())
        );
        let request = Request::new(Verb::Post, self.shared.routes.email_exchange())
            .with_header(ACCEPT_JSON.0, ACCEPT_JSON.1)
            .with_header(FORM_URLENCODED.0, FORM_URLENCODED.1)
            .with_body(body.into_bytes());

        let call = Call::expecting(request, 200);
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            let outcome: Result<String, Error> = async {
                let document = shared.fetch_document(call).await?;
                let token = document
                    .get("access_token")
                    .and_then(serde_json::Value::as_str)
                    .ok_or_else(|| Error::decode("response carries no access_token"))?;
                shared.tokens.save(token)?;
                Ok(token.to_string())
            }
            .await;
            callback(outcome);
        });
    }

    // ========================================================================
    // Authenticated endpoints
    //
    // These return false synchronously when no token is held.
    // ========================================================================

    /// Retrieve the authenticated user as a one-element list.
    pub fn get_me<F>(&self, callback: F) -> bool
    where
        F: for<'doc> FnOnce(PageResult<User<'doc>>) + Send + 'static,
    {
        let Some(call) = self.bearer_get(self.shared.routes.me()) else {
            return false;
        };
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
        true
    }

    /// Retrieve the authenticated user's event stream.
    pub fn get_me_events<F>(&self, filter: Option<&str>, callback: F) -> bool
    where
        F: for<'doc> FnOnce(PageResult<Event<'doc>>) + Send + 'static,
    {
        let Some(call) = self.bearer_get(self.shared.routes.me_events(filter)) else {
            return false;
        };
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
        true
    }

    /// Retrieve the authenticated user's ratings.
    pub fn get_ratings<F>(&self, filter: Option<&str>, callback: F) -> bool
    where
        F: for<'doc> FnOnce(PageResult<Rating<'doc>>) + Send + 'static,
    {
        let Some(call) = self.bearer_get(self.shared.routes.me_ratings(filter)) else {
            return false;
        };
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
        true
    }

    /// Retrieve the mods the authenticated user subscribes to.
    pub fn get_subscriptions<F>(&self, filter: Option<&str>, callback: F) -> bool
    where
        F: for<'doc> FnOnce(PageResult<Mod<'doc>>) + Send + 'static,
    {
        let Some(call) = self.bearer_get(self.shared.routes.me_subscribed(filter)) else {
            return false;
        };
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            match shared.fetch_document(call).await {
                Ok(document) => callback(Ok(decode_page(&document))),
                Err(err) => callback(Err(err)),
            }
        });
        true
    }

    /// Rate a mod up (`1`) or down (`-1`).
    pub fn rate<F>(&self, game_id: u64, mod_id: u64, rating: i64, callback: F) -> bool
    where
        F: FnOnce(Result<(), Error>) + Send + 'static,
    {
        let game_id = self.shared.resolve_game_id(game_id);
        assert!(game_id > 0, "game id required");
        assert!(mod_id > 0, "mod id required");
        assert!(rating == 1 || rating == -1, "rating must be 1 or -1");

        let Some(bearer) = self.shared.tokens.bearer() else {
            return false;
        };
        let body: &[u8] = if rating == 1 {
            b"rating=1"
        } else {
            b"rating=-1"
        };
        let request = Request::new(Verb::Post, self.shared.routes.ratings(game_id, mod_id))
            .with_header(ACCEPT_JSON.0, ACCEPT_JSON.1)
            .with_header(FORM_URLENCODED.0, FORM_URLENCODED.1)
            .with_header("Authorization", bearer)
            .with_body(body);

        let call = Call::expecting(request, 201).with_bearer();
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            callback(shared.perform(call).await.map(|_| ()));
        });
        true
    }

    /// Subscribe the authenticated user to a mod.
    pub fn subscribe<F>(&self, game_id: u64, mod_id: u64, callback: F) -> bool
    where
        F: FnOnce(Result<SubscriptionChange, Error>) + Send + 'static,
    {
        self.change_subscription(game_id, mod_id, Verb::Post, 201, 1, callback)
    }

    /// Unsubscribe the authenticated user from a mod.
    pub fn unsubscribe<F>(&self, game_id: u64, mod_id: u64, callback: F) -> bool
    where
        F: FnOnce(Result<SubscriptionChange, Error>) + Send + 'static,
    {
        self.change_subscription(game_id, mod_id, Verb::Delete, 204, -1, callback)
    }

    fn change_subscription<F>(
        &self,
        game_id: u64,
        mod_id: u64,
        verb: Verb,
        expect: u16,
        delta: i8,
        callback: F,
    ) -> bool
    where
        F: FnOnce(Result<SubscriptionChange, Error>) + Send + 'static,
    {
        let game_id = self.shared.resolve_game_id(game_id);
        assert!(game_id > 0, "game id required");
        assert!(mod_id > 0, "mod id required");

        let Some(bearer) = self.shared.tokens.bearer() else {
            return false;
        };
        let request = Request::new(verb, self.shared.routes.subscription(game_id, mod_id))
            .with_header(ACCEPT_JSON.0, ACCEPT_JSON.1)
            .with_header("Authorization", bearer);

        let call = Call::expecting(request, expect).with_bearer();
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            let outcome = shared
                .perform(call)
                .await
                .map(|_| SubscriptionChange { mod_id, delta });
            callback(outcome);
        });
        true
    }

    // ========================================================================
    // Request assembly helpers
    // ========================================================================

    fn bearer_get(&self, url: String) -> Option<Call> {
        let bearer = self.shared.tokens.bearer()?;
        let request = Request::get(url)
            .with_header(ACCEPT_JSON.0, ACCEPT_JSON.1)
            .with_header("Authorization", bearer);
        Some(Call::expecting(request, 200).with_bearer())
    }
}
