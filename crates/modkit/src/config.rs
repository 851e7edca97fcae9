//! Client configuration.

use std::time::Duration;

use modkit_http::FaultConfig;

/// Which service environment to talk to, chosen at init.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    /// The production service.
    #[default]
    Live,
    /// The test service; accounts and data are separate from live.
    Test,
}

impl Environment {
    /// Base endpoint for this environment.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Live => "https://api.mod.io/v1",
            Self::Test => "https://api.test.mod.io/v1",
        }
    }
}

/// Configuration for [`crate::Modio::init`].
///
/// # Example
///
/// ```no_run
/// use modkit::{ClientConfig, Environment, Modio};
///
/// let config = ClientConfig::new("0123456789abcdef0123456789abcdef")
///     .with_environment(Environment::Test)
///     .with_root("/var/lib/mygame/mods")
///     .with_unzip(true);
/// let client = Modio::init(config).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub(crate) environment: Environment,
    pub(crate) api_key: String,
    pub(crate) root: String,
    pub(crate) default_game_id: u64,
    pub(crate) unzip: bool,
    pub(crate) user_agent: String,
    pub(crate) timeout: Duration,
    pub(crate) faults: FaultConfig,
}

impl ClientConfig {
    /// Create a configuration with the given api key and defaults:
    /// live environment, root `_modkit`, no unzip, 30s timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            environment: Environment::Live,
            api_key: api_key.into(),
            root: "_modkit".to_string(),
            default_game_id: 0,
            unzip: false,
            user_agent: concat!("modkit/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            faults: FaultConfig::default(),
        }
    }

    /// Select the live or test environment.
    #[must_use]
    pub const fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the root directory for all persisted state. Trailing path
    /// separators are stripped.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the game id used when endpoint calls pass `0` for the game.
    #[must_use]
    pub const fn with_default_game(mut self, game_id: u64) -> Self {
        self.default_game_id = game_id;
        self
    }

    /// Extract downloaded archives into a directory tree instead of
    /// keeping the `.zip`.
    #[must_use]
    pub const fn with_unzip(mut self, unzip: bool) -> Self {
        self.unzip = unzip;
        self
    }

    /// Set the user agent string for HTTP requests.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable fault injection (simulated latency and server errors).
    #[must_use]
    pub const fn with_fault_injection(mut self, faults: FaultConfig) -> Self {
        self.faults = faults;
        self
    }
}

/// An api key is exactly 32 alphanumeric bytes.
pub(crate) fn api_key_is_valid(key: &str) -> bool {
    key.len() == 32 && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn environment_base_urls() {
        assert_eq!(Environment::Live.base_url(), "https://api.mod.io/v1");
        assert_eq!(Environment::Test.base_url(), "https://api.test.mod.io/v1");
    }

    #[test]
    fn builder_defaults() {
        let config = ClientConfig::new(KEY);
        assert_eq!(config.environment, Environment::Live);
        assert_eq!(config.root, "_modkit");
        assert!(!config.unzip);
        assert_eq!(config.default_game_id, 0);
        assert!(config.user_agent.starts_with("modkit/"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.faults.is_noop());
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::new(KEY)
            .with_environment(Environment::Test)
            .with_root("/srv/mods/")
            .with_default_game(309)
            .with_unzip(true)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.root, "/srv/mods/");
        assert_eq!(config.default_game_id, 309);
        assert!(config.unzip);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn api_key_validation() {
        assert!(api_key_is_valid(KEY));
        assert!(api_key_is_valid("ABCDEFGHIJKLMNOPQRSTUVWXYZ012345"));

        assert!(!api_key_is_valid(""));
        assert!(!api_key_is_valid("short"));
        assert!(!api_key_is_valid("0123456789abcdef0123456789abcde")); // 31
        assert!(!api_key_is_valid("0123456789abcdef0123456789abcdef0")); // 33
        assert!(!api_key_is_valid("0123456789abcdef0123456789abcde!")); // symbol
    }
}
