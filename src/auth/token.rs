//! Token endpoint requests: authorization-code exchange and refresh.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::http::HttpClient;

use super::OAuth2Strategy;

/// Response body of the token endpoint.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: u64,
    /// Absent on refresh when Spotify keeps the previous refresh token.
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|scope| scope.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Performs token requests on behalf of the configured Spotify application.
pub struct OAuthClient {
    http_client: HttpClient,
    strategy: OAuth2Strategy,
}

impl OAuthClient {
    pub fn new(http_client: HttpClient, strategy: OAuth2Strategy) -> Self {
        Self {
            http_client,
            strategy,
        }
    }

    pub fn strategy(&self) -> &OAuth2Strategy {
        &self.strategy
    }

    /// Exchanges the `code` returned to the redirect URI for tokens.
    #[tracing::instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let code = code.trim();
        if code.is_empty() {
            anyhow::bail!("Authorization code is empty");
        }

        debug!("Exchanging authorization code at {}...", self.strategy.token_endpoint);

        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.strategy.credentials.redirect_uri.as_str()),
        ])
        .await
        .context("Failed to exchange authorization code")
    }

    /// Obtains a new access token from a refresh token.
    #[tracing::instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        debug!("Refreshing access token at {}...", self.strategy.token_endpoint);

        let mut token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.trim()),
            ])
            .await
            .context("Failed to refresh access token")?;

        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.trim().to_string());
        }
        Ok(token)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let credentials = &self.strategy.credentials;
        self.http_client
            .post_form(
                &self.strategy.token_endpoint,
                &credentials.client_id,
                &credentials.client_secret,
                form,
            )
            .await
    }
}
