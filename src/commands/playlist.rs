use anyhow::Result;
use log::info;
use std::io::Write;

use crate::spotify::{SpotifyApi, TimeRange, Track};

fn default_name(range: TimeRange) -> String {
    format!("Top tracks ({})", range)
}

/// Save the user's top tracks for `range` into a new private playlist
#[tracing::instrument(skip(api, out))]
pub async fn save_top_tracks<A: SpotifyApi + ?Sized, W: Write>(
    api: &A,
    name: Option<String>,
    range: TimeRange,
    limit: u32,
    out: &mut W,
) -> Result<()> {
    let user = api.current_user().await?;
    let tracks = api.top_tracks(range, limit).await?;

    // Local files carry no id and cannot be added by URI.
    let uris: Vec<String> = tracks
        .iter()
        .filter(|track| track.id.is_some())
        .map(|track| track.uri.clone())
        .collect();
    if uris.is_empty() {
        writeln!(out, "No top tracks for {}; nothing to save.", range)?;
        return Ok(());
    }

    let name = name.unwrap_or_else(|| default_name(range));
    let description = describe(&tracks, uris.len(), range);
    let playlist = api.create_playlist(&user.id, &name, &description).await?;
    info!("Created playlist {} ({})", playlist.name, playlist.id);

    api.add_tracks(&playlist.id, &uris).await?;

    writeln!(out, "Saved {} tracks to \"{}\"", uris.len(), playlist.name)?;
    match playlist.external_urls.get("spotify") {
        Some(url) => writeln!(out, "{}", url)?,
        None => writeln!(out, "{}", playlist.uri)?,
    }
    Ok(())
}

fn describe(tracks: &[Track], saved: usize, range: TimeRange) -> String {
    let headliner = tracks
        .iter()
        .find(|track| track.id.is_some())
        .map(|track| format!(", led by {}", track.name))
        .unwrap_or_default();
    format!("Your top {} tracks for {}{}.", saved, range, headliner)
}
