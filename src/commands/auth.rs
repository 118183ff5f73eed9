use anyhow::Result;
use log::debug;
use std::io::Write;

use crate::auth::{OAuth2Strategy, OAuthClient, TokenResponse, generate_state};
use crate::config::ENV_ACCESS_TOKEN;

/// Print the URL that starts the authorization-code flow
#[tracing::instrument(skip(strategy, out))]
pub fn authorize<W: Write>(
    strategy: &OAuth2Strategy,
    state: Option<String>,
    out: &mut W,
) -> Result<()> {
    let state = state.unwrap_or_else(generate_state);
    let url = strategy.authorization_url(&state)?;
    debug!("Authorization URL: {}", url);

    writeln!(out, "Open this URL in a browser and approve access:")?;
    writeln!(out)?;
    writeln!(out, "  {}", url)?;
    writeln!(out)?;
    writeln!(out, "state: {}", state)?;
    writeln!(
        out,
        "Spotify redirects to {} with `code` and `state`; pass the code to `telescope token`.",
        strategy.credentials.redirect_uri
    )?;
    Ok(())
}

/// Exchange an authorization code for tokens
#[tracing::instrument(skip(oauth, code, out))]
pub async fn token<W: Write>(oauth: &OAuthClient, code: &str, out: &mut W) -> Result<()> {
    let token = oauth.exchange_code(code).await?;
    print_token(&token, out)
}

/// Trade a refresh token for a fresh access token
#[tracing::instrument(skip(oauth, refresh_token, out))]
pub async fn refresh<W: Write>(oauth: &OAuthClient, refresh_token: &str, out: &mut W) -> Result<()> {
    let token = oauth.refresh(refresh_token).await?;
    print_token(&token, out)
}

fn print_token<W: Write>(token: &TokenResponse, out: &mut W) -> Result<()> {
    writeln!(out, "access_token: {}", token.access_token)?;
    if let Some(refresh_token) = &token.refresh_token {
        writeln!(out, "refresh_token: {}", refresh_token)?;
    }
    writeln!(out, "expires_in: {}s", token.expires_in)?;
    let scopes = token.scopes();
    if !scopes.is_empty() {
        writeln!(out, "scope: {}", scopes.join(" "))?;
    }
    writeln!(out)?;
    writeln!(out, "export {}={}", ENV_ACCESS_TOKEN, token.access_token)?;
    Ok(())
}
