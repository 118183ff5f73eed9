//! Process configuration, read once at start-up.

use anyhow::{Result, bail};
use log::debug;
use std::fmt;
use std::time::Duration;

use crate::runtime::Runtime;

pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "SPOTIFY_REDIRECT_URI";
pub const ENV_ACCESS_TOKEN: &str = "SPOTIFY_ACCESS_TOKEN";

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Per-call HTTP timeout when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// OAuth client registration for the Spotify application.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Base URLs of the two Spotify hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Web API root, e.g. `https://api.spotify.com/v1`
    pub api_url: String,
    /// Accounts service root, e.g. `https://accounts.spotify.com`
    pub accounts_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
        }
    }
}

/// Values supplied on the command line, taking precedence over defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub accounts_url: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub timeout: Duration,
    credentials: Option<Credentials>,
    missing: Vec<&'static str>,
    access_token: Option<String>,
}

impl Settings {
    /// Reads the Spotify environment through `runtime` and merges `overrides`.
    ///
    /// Missing client variables are not an error here; they only fail once
    /// something asks for [`Settings::credentials`].
    pub fn load<R: Runtime + ?Sized>(runtime: &R, overrides: Overrides) -> Self {
        let mut missing = Vec::new();
        let mut read = |key: &'static str| {
            let value = read_var(runtime, key);
            if value.is_none() {
                missing.push(key);
            }
            value
        };

        let client_id = read(ENV_CLIENT_ID);
        let client_secret = read(ENV_CLIENT_SECRET);
        let redirect_uri = read(ENV_REDIRECT_URI);

        let credentials = match (client_id, client_secret, redirect_uri) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Some(Credentials {
                client_id,
                client_secret,
                redirect_uri,
            }),
            _ => None,
        };

        let access_token = overrides
            .access_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .or_else(|| read_var(runtime, ENV_ACCESS_TOKEN));

        if let Some(token) = &access_token {
            debug!("Using Spotify access token {}", mask_token(token));
        }

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            api_url: trim_base_url(overrides.api_url.unwrap_or(defaults.api_url)),
            accounts_url: trim_base_url(overrides.accounts_url.unwrap_or(defaults.accounts_url)),
        };

        Self {
            endpoints,
            timeout: overrides.timeout.unwrap_or(DEFAULT_TIMEOUT),
            credentials,
            missing,
            access_token,
        }
    }

    /// The OAuth client registration; fails if any of the three variables is unset.
    pub fn credentials(&self) -> Result<&Credentials> {
        match &self.credentials {
            Some(credentials) => Ok(credentials),
            None => bail!(
                "Spotify client is not configured: set {}",
                self.missing.join(", ")
            ),
        }
    }

    pub fn access_token(&self) -> Result<&str> {
        match &self.access_token {
            Some(token) => Ok(token),
            None => bail!(
                "No access token. Run `telescope authorize`, exchange the code with `telescope token`, then pass --token or set {}.",
                ENV_ACCESS_TOKEN
            ),
        }
    }
}

fn read_var<R: Runtime + ?Sized>(runtime: &R, key: &str) -> Option<String> {
    runtime
        .env_var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Shows the first and last four characters of a token, for logs.
pub(crate) fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
