use anyhow::{Result, bail};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::spotify::{SpotifyApi, TimeRange};

use super::format_duration;

/// What `top` lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopKind {
    Artists,
    Tracks,
}

impl fmt::Display for TopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopKind::Artists => write!(f, "artists"),
            TopKind::Tracks => write!(f, "tracks"),
        }
    }
}

impl FromStr for TopKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "artists" | "artist" => Ok(TopKind::Artists),
            "tracks" | "track" => Ok(TopKind::Tracks),
            _ => bail!("Unknown item type: {}. Expected artists or tracks.", s),
        }
    }
}

/// Show the profile of the token's owner
#[tracing::instrument(skip(api, out))]
pub async fn me<A: SpotifyApi + ?Sized, W: Write>(api: &A, out: &mut W) -> Result<()> {
    let user = api.current_user().await?;

    writeln!(out, "{} ({})", user.name(), user.id)?;
    if let Some(email) = &user.email {
        writeln!(out, "email: {}", email)?;
    }
    if let Some(country) = &user.country {
        writeln!(out, "country: {}", country)?;
    }
    if let Some(product) = &user.product {
        writeln!(out, "plan: {}", product)?;
    }
    if let Some(url) = user.external_urls.get("spotify") {
        writeln!(out, "profile: {}", url)?;
    }
    Ok(())
}

/// List recently played tracks, newest first
#[tracing::instrument(skip(api, out))]
pub async fn recent<A: SpotifyApi + ?Sized, W: Write>(
    api: &A,
    limit: u32,
    out: &mut W,
) -> Result<()> {
    let history = api.recently_played(limit).await?;
    if history.is_empty() {
        writeln!(out, "No recently played tracks.")?;
        return Ok(());
    }

    for entry in history {
        writeln!(
            out,
            "{}  {} - {}",
            entry.played_at,
            entry.track.name,
            entry.track.artist_names()
        )?;
    }
    Ok(())
}

/// List top artists or tracks for a time range
#[tracing::instrument(skip(api, out))]
pub async fn top<A: SpotifyApi + ?Sized, W: Write>(
    api: &A,
    kind: TopKind,
    range: TimeRange,
    limit: u32,
    out: &mut W,
) -> Result<()> {
    match kind {
        TopKind::Artists => {
            let artists = api.top_artists(range, limit).await?;
            if artists.is_empty() {
                writeln!(out, "No top artists for {}.", range)?;
            }
            for (rank, artist) in artists.iter().enumerate() {
                if artist.genres.is_empty() {
                    writeln!(out, "{:>2}. {}", rank + 1, artist.name)?;
                } else {
                    writeln!(
                        out,
                        "{:>2}. {} [{}]",
                        rank + 1,
                        artist.name,
                        artist.genres.join(", ")
                    )?;
                }
            }
        }
        TopKind::Tracks => {
            let tracks = api.top_tracks(range, limit).await?;
            if tracks.is_empty() {
                writeln!(out, "No top tracks for {}.", range)?;
            }
            for (rank, track) in tracks.iter().enumerate() {
                writeln!(
                    out,
                    "{:>2}. {} - {} ({})",
                    rank + 1,
                    track.name,
                    track.artist_names(),
                    format_duration(track.duration_ms)
                )?;
            }
        }
    }
    Ok(())
}

/// Show what is playing right now
#[tracing::instrument(skip(api, out))]
pub async fn now_playing<A: SpotifyApi + ?Sized, W: Write>(api: &A, out: &mut W) -> Result<()> {
    let playing = match api.currently_playing().await? {
        Some(playing) => playing,
        None => {
            writeln!(out, "Nothing is playing.")?;
            return Ok(());
        }
    };

    let state = if playing.is_playing { "Playing" } else { "Paused" };
    match &playing.item {
        Some(track) => {
            let progress = format_duration(playing.progress_ms.unwrap_or(0));
            writeln!(
                out,
                "{}: {} - {} ({} / {})",
                state,
                track.name,
                track.artist_names(),
                progress,
                format_duration(track.duration_ms)
            )?;
        }
        None => {
            let kind = playing.currently_playing_type.as_deref().unwrap_or("unknown");
            writeln!(out, "{}: {} item", state, kind)?;
        }
    }
    Ok(())
}

/// List followed artists
#[tracing::instrument(skip(api, out))]
pub async fn following<A: SpotifyApi + ?Sized, W: Write>(
    api: &A,
    limit: u32,
    out: &mut W,
) -> Result<()> {
    let artists = api.followed_artists(limit).await?;
    if artists.is_empty() {
        writeln!(out, "Not following any artists.")?;
        return Ok(());
    }
    for artist in artists {
        writeln!(out, "{}", artist.name)?;
    }
    Ok(())
}
