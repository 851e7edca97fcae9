//! Error types shared across the modkit crates.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors delivered to continuations or returned by local operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP layer failed before a response was produced.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },

    /// The service answered with a status code the endpoint does not expect.
    #[error("unexpected HTTP status {status}")]
    Protocol {
        /// The HTTP status code received.
        status: u16,
    },

    /// The service is rate limiting this client.
    #[error("rate limited for another {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the service expects to accept requests again.
        retry_after_secs: u64,
    },

    /// The bearer token or api key was rejected by the service.
    #[error("authentication rejected by the service")]
    AuthExpired,

    /// The response body could not be decoded.
    #[error("malformed response document: {message}")]
    Decode {
        /// What was wrong with the document.
        message: String,
    },

    /// Local file I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a transport error from a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a decode error from a message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a protocol error from a status code.
    #[must_use]
    pub const fn protocol(status: u16) -> Self {
        Self::Protocol { status }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }
}

/// Errors surfaced synchronously by client construction.
#[derive(Debug, Error)]
pub enum InitError {
    /// The api key is not exactly 32 alphanumeric characters.
    #[error("api key must be exactly 32 alphanumeric characters")]
    BadApiKey,

    /// The configured root directory cannot be created or written.
    #[error("root path is not usable: {message}")]
    BadRootPath {
        /// Why the path was rejected.
        message: String,
    },

    /// The transport stack could not be brought up.
    #[error("transport initialization failed: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },
}

impl InitError {
    /// Create a bad-root-path error from a message.
    pub fn bad_root_path(message: impl Into<String>) -> Self {
        Self::BadRootPath {
            message: message.into(),
        }
    }

    /// Create a transport-init error from a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}
