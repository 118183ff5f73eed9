//! Spotify OAuth2 authorization-code flow.
//!
//! [`OAuth2Strategy`] describes the Spotify application (endpoints, client
//! registration, scopes). [`OAuthClient`] performs the token requests.

mod token;

use anyhow::{Context, Result};
use reqwest::Url;

use crate::config::{Credentials, Endpoints};

pub use token::{OAuthClient, TokenResponse};

/// Scopes requested from the user, in the order they are sent.
pub const SCOPES: [&str; 6] = [
    "user-read-recently-played",
    "user-top-read",
    "user-read-currently-playing",
    "user-follow-read",
    "user-read-email",
    "playlist-modify-private",
];

/// Where the user lands after logging out.
pub const LOGOUT_REDIRECT_URI: &str = "/";

const STATE_LEN: usize = 32;

/// OAuth2 strategy parameters for Spotify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Strategy {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_info_endpoint: String,
    pub logout_redirect_uri: String,
    pub credentials: Credentials,
    pub scopes: Vec<String>,
}

impl OAuth2Strategy {
    pub fn spotify(credentials: &Credentials, endpoints: &Endpoints) -> Self {
        Self {
            authorization_endpoint: format!("{}/authorize", endpoints.accounts_url),
            token_endpoint: format!("{}/api/token", endpoints.accounts_url),
            user_info_endpoint: format!("{}/me", endpoints.api_url),
            logout_redirect_uri: LOGOUT_REDIRECT_URI.to_string(),
            credentials: credentials.clone(),
            scopes: SCOPES.iter().map(|scope| scope.to_string()).collect(),
        }
    }

    /// The URL the user visits to grant access; Spotify redirects back with `code` and `state`.
    pub fn authorization_url(&self, state: &str) -> Result<Url> {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.authorization_endpoint,
            &[
                ("response_type", "code"),
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .with_context(|| {
            format!(
                "Invalid authorization endpoint: {}",
                self.authorization_endpoint
            )
        })
    }
}

/// A random alphanumeric value for the `state` parameter.
pub fn generate_state() -> String {
    std::iter::repeat_with(fastrand::alphanumeric)
        .take(STATE_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
        }
    }

    #[test]
    fn test_spotify_strategy_endpoints() {
        let strategy = OAuth2Strategy::spotify(&credentials(), &Endpoints::default());

        assert_eq!(
            strategy.authorization_endpoint,
            "https://accounts.spotify.com/authorize"
        );
        assert_eq!(
            strategy.token_endpoint,
            "https://accounts.spotify.com/api/token"
        );
        assert_eq!(strategy.user_info_endpoint, "https://api.spotify.com/v1/me");
        assert_eq!(strategy.logout_redirect_uri, "/");
        assert_eq!(strategy.credentials, credentials());
    }

    #[test]
    fn test_spotify_strategy_scopes() {
        let strategy = OAuth2Strategy::spotify(&credentials(), &Endpoints::default());
        assert_eq!(
            strategy.scopes,
            vec![
                "user-read-recently-played",
                "user-top-read",
                "user-read-currently-playing",
                "user-follow-read",
                "user-read-email",
                "playlist-modify-private",
            ]
        );
    }

    #[test]
    fn test_authorization_url() {
        let strategy = OAuth2Strategy::spotify(&credentials(), &Endpoints::default());
        let url = strategy.authorization_url("xyz").unwrap();

        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert_eq!(url.path(), "/authorize");

        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("client_id"), Some("client-id"));
        assert_eq!(get("redirect_uri"), Some("http://localhost:3000/callback"));
        assert_eq!(get("state"), Some("xyz"));
        assert_eq!(get("scope"), Some(SCOPES.join(" ").as_str()));
    }

    #[test]
    fn test_authorization_url_custom_accounts_host() {
        let endpoints = Endpoints {
            api_url: "http://127.0.0.1:8080/v1".to_string(),
            accounts_url: "http://127.0.0.1:8080".to_string(),
        };
        let strategy = OAuth2Strategy::spotify(&credentials(), &endpoints);
        let url = strategy.authorization_url("s").unwrap();
        assert!(url.as_str().starts_with("http://127.0.0.1:8080/authorize?"));
        assert_eq!(strategy.user_info_endpoint, "http://127.0.0.1:8080/v1/me");
    }

    #[test]
    fn test_authorization_url_invalid_endpoint() {
        let endpoints = Endpoints {
            api_url: "not a url".to_string(),
            accounts_url: "not a url".to_string(),
        };
        let strategy = OAuth2Strategy::spotify(&credentials(), &endpoints);
        assert!(strategy.authorization_url("s").is_err());
    }

    #[test]
    fn test_generate_state() {
        let state = generate_state();
        assert_eq!(state.len(), STATE_LEN);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(state, generate_state());
    }
}
