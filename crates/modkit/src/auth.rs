//! Persisted bearer-token store.
//!
//! The token lives in a single file under the root directory, stored as
//! raw bytes with no trailing newline. It is loaded once at init,
//! replaced on a successful email exchange, and erased either by an
//! explicit deauthenticate or when the service rejects it with 401.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, warn};

struct TokenState {
    token: String,
    bearer: String,
}

impl TokenState {
    fn new(token: String) -> Self {
        let bearer = format!("Bearer {token}");
        Self { token, bearer }
    }
}

/// Loads, persists, and erases the bearer token.
pub(crate) struct TokenStore {
    path: PathBuf,
    state: Mutex<Option<TokenState>>,
}

impl TokenStore {
    /// Build the store and load the token file if present and non-empty.
    pub fn new(path: PathBuf) -> Self {
        let state = match fs::read_to_string(&path) {
            Ok(contents) if !contents.is_empty() => {
                debug!(path = %path.display(), "loaded persisted token");
                Some(TokenState::new(contents))
            }
            _ => None,
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Whether a token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.state.lock().unwrap().is_some()
    }

    /// The current token, if any.
    pub fn token(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.token.clone())
    }

    /// The `Bearer <token>` header value, if authenticated.
    pub fn bearer(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.bearer.clone())
    }

    /// Persist `token` and refresh the in-memory state.
    pub fn save(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token.as_bytes())?;
        *self.state.lock().unwrap() = Some(TokenState::new(token.to_string()));
        Ok(())
    }

    /// Delete the token file and drop the in-memory token.
    pub fn clear(&self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), %err, "could not remove token file");
            }
        }
        *self.state.lock().unwrap() = None;
    }
}
