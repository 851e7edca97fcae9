//! Endpoint URL construction.
//!
//! List endpoints take an optional caller-supplied filter/sort/paging
//! fragment which is appended verbatim after the `api_key` parameter;
//! the service ignores the trailing `&` when no filter is given.
//! Parameters built by the library itself are percent-encoded at the
//! façade boundary before they reach these builders.

use crate::config::Environment;

/// Builds request URLs against the environment's base endpoint.
#[derive(Clone, Debug)]
pub(crate) struct Routes {
    base: &'static str,
    api_key: String,
}

impl Routes {
    pub fn new(environment: Environment, api_key: String) -> Self {
        Self {
            base: environment.base_url(),
            api_key,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn games(&self, filter: Option<&str>) -> String {
        format!(
            "{}/games?api_key={}&{}",
            self.base,
            self.api_key,
            filter.unwrap_or("")
        )
    }

    pub fn mods(&self, game_id: u64, filter: Option<&str>) -> String {
        format!(
            "{}/games/{game_id}/mods?api_key={}&{}",
            self.base,
            self.api_key,
            filter.unwrap_or("")
        )
    }

    pub fn mod_by_id(&self, game_id: u64, mod_id: u64) -> String {
        format!(
            "{}/games/{game_id}/mods/{mod_id}?api_key={}",
            self.base, self.api_key
        )
    }

    /// `modfile_id` 0 selects the list endpoint, non-zero the singleton.
    pub fn modfiles(
        &self,
        game_id: u64,
        mod_id: u64,
        modfile_id: u64,
        filter: Option<&str>,
    ) -> String {
        let filter = filter.unwrap_or("");
        if modfile_id == 0 {
            format!(
                "{}/games/{game_id}/mods/{mod_id}/files?api_key={}&{filter}",
                self.base, self.api_key
            )
        } else {
            format!(
                "{}/games/{game_id}/mods/{mod_id}/files/{modfile_id}?api_key={}&{filter}",
                self.base, self.api_key
            )
        }
    }

    pub fn dependencies(&self, game_id: u64, mod_id: u64) -> String {
        format!(
            "{}/games/{game_id}/mods/{mod_id}/dependencies?api_key={}",
            self.base, self.api_key
        )
    }

    /// `mod_id` 0 selects the all-mods event stream for the game;
    /// `newer_than` > 0 appends a `date_added-gt` cutoff.
    pub fn mod_events(
        &self,
        game_id: u64,
        mod_id: u64,
        newer_than: u64,
        filter: Option<&str>,
    ) -> String {
        let scope = if mod_id == 0 {
            format!("{}/games/{game_id}/mods/events", self.base)
        } else {
            format!("{}/games/{game_id}/mods/{mod_id}/events", self.base)
        };
        let cutoff = if newer_than == 0 {
            String::new()
        } else {
            format!("date_added-gt={newer_than}&")
        };
        format!(
            "{scope}?api_key={}&{cutoff}{}",
            self.api_key,
            filter.unwrap_or("")
        )
    }

    pub fn email_request(&self) -> String {
        format!("{}/oauth/emailrequest", self.base)
    }

    pub fn email_exchange(&self) -> String {
        format!("{}/oauth/emailexchange", self.base)
    }

    pub fn me(&self) -> String {
        format!("{}/me", self.base)
    }

    pub fn me_events(&self, filter: Option<&str>) -> String {
        format!("{}/me/events?{}", self.base, filter.unwrap_or(""))
    }

    pub fn me_ratings(&self, filter: Option<&str>) -> String {
        format!("{}/me/ratings?{}", self.base, filter.unwrap_or(""))
    }

    pub fn me_subscribed(&self, filter: Option<&str>) -> String {
        format!("{}/me/subscribed?{}", self.base, filter.unwrap_or(""))
    }

    pub fn ratings(&self, game_id: u64, mod_id: u64) -> String {
        format!("{}/games/{game_id}/mods/{mod_id}/ratings", self.base)
    }

    pub fn subscription(&self, game_id: u64, mod_id: u64) -> String {
        format!("{}/games/{game_id}/mods/{mod_id}/subscribe", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_routes() -> Routes {
        Routes::new(Environment::Live, "K".to_string())
    }

    #[test]
    fn games_url_without_filter() {
        assert_eq!(
            live_routes().games(None),
            "https://api.mod.io/v1/games?api_key=K&"
        );
    }

    #[test]
    fn games_url_with_filter_passes_through_verbatim() {
        assert_eq!(
            live_routes().games(Some("name-lk=sky*&_limit=10")),
            "https://api.mod.io/v1/games?api_key=K&name-lk=sky*&_limit=10"
        );
    }

    #[test]
    fn test_environment_base() {
        let routes = Routes::new(Environment::Test, "K".to_string());
        assert_eq!(
            routes.games(None),
            "https://api.test.mod.io/v1/games?api_key=K&"
        );
    }

    #[test]
    fn mods_and_mod_urls() {
        assert_eq!(
            live_routes().mods(309, None),
            "https://api.mod.io/v1/games/309/mods?api_key=K&"
        );
        assert_eq!(
            live_routes().mod_by_id(309, 1720),
            "https://api.mod.io/v1/games/309/mods/1720?api_key=K"
        );
    }

    #[test]
    fn modfile_id_zero_selects_list_endpoint() {
        assert_eq!(
            live_routes().modfiles(309, 1720, 0, None),
            "https://api.mod.io/v1/games/309/mods/1720/files?api_key=K&"
        );
        assert_eq!(
            live_routes().modfiles(309, 1720, 1685, None),
            "https://api.mod.io/v1/games/309/mods/1720/files/1685?api_key=K&"
        );
    }

    #[test]
    fn event_urls() {
        assert_eq!(
            live_routes().mod_events(309, 0, 0, None),
            "https://api.mod.io/v1/games/309/mods/events?api_key=K&"
        );
        assert_eq!(
            live_routes().mod_events(309, 1720, 0, None),
            "https://api.mod.io/v1/games/309/mods/1720/events?api_key=K&"
        );
        assert_eq!(
            live_routes().mod_events(309, 0, 1_550_000_000, None),
            "https://api.mod.io/v1/games/309/mods/events?api_key=K&date_added-gt=1550000000&"
        );
    }

    #[test]
    fn me_urls_carry_no_api_key() {
        assert_eq!(live_routes().me(), "https://api.mod.io/v1/me");
        assert_eq!(
            live_routes().me_ratings(Some("game_id=309&mod_id=1720")),
            "https://api.mod.io/v1/me/ratings?game_id=309&mod_id=1720"
        );
        assert_eq!(
            live_routes().me_subscribed(None),
            "https://api.mod.io/v1/me/subscribed?"
        );
    }

    #[test]
    fn write_endpoint_urls() {
        assert_eq!(
            live_routes().ratings(309, 1720),
            "https://api.mod.io/v1/games/309/mods/1720/ratings"
        );
        assert_eq!(
            live_routes().subscription(309, 1720),
            "https://api.mod.io/v1/games/309/mods/1720/subscribe"
        );
        assert_eq!(
            live_routes().email_request(),
            "https://api.mod.io/v1/oauth/emailrequest"
        );
    }

    #[test]
    fn dependencies_url() {
        assert_eq!(
            live_routes().dependencies(309, 1720),
            "https://api.mod.io/v1/games/309/mods/1720/dependencies?api_key=K"
        );
    }
}
