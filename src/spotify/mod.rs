//! Spotify Web API client.
//!
//! Each operation maps to one of the scopes requested by
//! [`OAuth2Strategy`](crate::auth::OAuth2Strategy).

mod client;
mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use client::SpotifyClient;
pub use types::{
    Album, Artist, CurrentlyPlaying, CursorPaging, Cursors, FollowedArtists, NewPlaylist, Paging,
    PlayHistory, Playlist, SimplifiedArtist, Snapshot, TimeRange, Track, User,
};

/// Largest `limit` Spotify accepts on list endpoints.
pub const MAX_LIMIT: u32 = 50;

/// Largest number of URIs per add-tracks request.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Clamps a requested page size into Spotify's accepted range.
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// The profile of the token's owner.
    async fn current_user(&self) -> Result<User>;

    async fn recently_played(&self, limit: u32) -> Result<Vec<PlayHistory>>;

    async fn top_artists(&self, range: TimeRange, limit: u32) -> Result<Vec<Artist>>;

    async fn top_tracks(&self, range: TimeRange, limit: u32) -> Result<Vec<Track>>;

    /// `None` when nothing is playing.
    async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>>;

    async fn followed_artists(&self, limit: u32) -> Result<Vec<Artist>>;

    /// Creates a private playlist owned by `user_id`.
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist>;

    /// Appends tracks, returning the snapshot after the last batch, or `None` for no URIs.
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<Option<Snapshot>>;
}
