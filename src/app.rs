//! Service wiring.
//!
//! Services are built in a fixed order: settings, then the shared HTTP client,
//! then the OAuth and Web API clients on top of it.

use anyhow::{Context, Result};
use reqwest::Client;

use crate::auth::{OAuth2Strategy, OAuthClient};
use crate::config::Settings;
use crate::http::{HttpClient, RetryPolicy};
use crate::spotify::SpotifyClient;

const USER_AGENT: &str = concat!("telescope-cli/", env!("CARGO_PKG_VERSION"));

pub struct App {
    pub settings: Settings,
    pub http_client: HttpClient,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        Self::with_policy(settings, RetryPolicy::default())
    }

    pub fn with_policy(settings: Settings, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client: HttpClient::new(client, policy),
            settings,
        })
    }

    /// The OAuth strategy; needs the client variables to be set.
    pub fn strategy(&self) -> Result<OAuth2Strategy> {
        let credentials = self.settings.credentials()?;
        Ok(OAuth2Strategy::spotify(credentials, &self.settings.endpoints))
    }

    pub fn oauth_client(&self) -> Result<OAuthClient> {
        Ok(OAuthClient::new(self.http_client.clone(), self.strategy()?))
    }

    /// The Web API client; needs an access token.
    pub fn spotify_client(&self) -> Result<SpotifyClient> {
        let token = self.settings.access_token()?;
        Ok(SpotifyClient::new(
            self.http_client.clone(),
            &self.settings.endpoints.api_url,
            token,
        ))
    }
}
