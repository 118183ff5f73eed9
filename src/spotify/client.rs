use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::Url;

use crate::http::HttpClient;

use super::types::{
    Artist, CurrentlyPlaying, FollowedArtists, NewPlaylist, Paging, PlayHistory, Playlist,
    Snapshot, TimeRange, Track, User,
};
use super::{CursorPaging, MAX_TRACKS_PER_REQUEST, SpotifyApi, clamp_limit};

/// [`SpotifyApi`] over HTTP, authorized with one bearer token.
pub struct SpotifyClient {
    http_client: HttpClient,
    api_url: String,
    access_token: String,
}

impl SpotifyClient {
    pub fn new(http_client: HttpClient, api_url: &str, access_token: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Appends `segments` to the API URL, percent-encoding each one.
    fn url_with_segments(&self, segments: &[&str]) -> Result<String> {
        let mut url = Url::parse(&self.api_url)
            .with_context(|| format!("Invalid API URL: {}", self.api_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("API URL cannot take a path: {}", self.api_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    async fn top<T: serde::de::DeserializeOwned>(
        &self,
        kind: &str,
        range: TimeRange,
        limit: u32,
    ) -> Result<Vec<T>> {
        let url = self.url(&format!("/me/top/{}", kind));
        let limit = clamp_limit(limit).to_string();
        debug!("Fetching top {} ({}) from {}...", kind, range, url);

        let page: Paging<T> = self
            .http_client
            .get_json_with_query(
                &url,
                &self.access_token,
                &[("time_range", range.as_str()), ("limit", limit.as_str())],
            )
            .await
            .with_context(|| format!("Failed to fetch top {}", kind))?;
        Ok(page.items)
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    #[tracing::instrument(skip(self))]
    async fn current_user(&self) -> Result<User> {
        self.http_client
            .get_json(&self.url("/me"), &self.access_token)
            .await
            .context("Failed to fetch current user")
    }

    #[tracing::instrument(skip(self))]
    async fn recently_played(&self, limit: u32) -> Result<Vec<PlayHistory>> {
        let limit = clamp_limit(limit).to_string();
        let page: CursorPaging<PlayHistory> = self
            .http_client
            .get_json_with_query(
                &self.url("/me/player/recently-played"),
                &self.access_token,
                &[("limit", limit.as_str())],
            )
            .await
            .context("Failed to fetch recently played tracks")?;
        Ok(page.items)
    }

    #[tracing::instrument(skip(self))]
    async fn top_artists(&self, range: TimeRange, limit: u32) -> Result<Vec<Artist>> {
        self.top("artists", range, limit).await
    }

    #[tracing::instrument(skip(self))]
    async fn top_tracks(&self, range: TimeRange, limit: u32) -> Result<Vec<Track>> {
        self.top("tracks", range, limit).await
    }

    #[tracing::instrument(skip(self))]
    async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>> {
        self.http_client
            .get_optional_json(
                &self.url("/me/player/currently-playing"),
                &self.access_token,
                &[],
            )
            .await
            .context("Failed to fetch currently playing track")
    }

    #[tracing::instrument(skip(self))]
    async fn followed_artists(&self, limit: u32) -> Result<Vec<Artist>> {
        let limit = clamp_limit(limit).to_string();
        let followed: FollowedArtists = self
            .http_client
            .get_json_with_query(
                &self.url("/me/following"),
                &self.access_token,
                &[("type", "artist"), ("limit", limit.as_str())],
            )
            .await
            .context("Failed to fetch followed artists")?;
        Ok(followed.artists.items)
    }

    #[tracing::instrument(skip(self, description))]
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist> {
        let url = self.url_with_segments(&["users", user_id, "playlists"])?;
        let body = NewPlaylist {
            name,
            description,
            public: false,
        };
        self.http_client
            .post_json(&url, &self.access_token, &body)
            .await
            .with_context(|| format!("Failed to create playlist '{}'", name))
    }

    #[tracing::instrument(skip(self, uris))]
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<Option<Snapshot>> {
        let url = self.url_with_segments(&["playlists", playlist_id, "tracks"])?;
        let mut snapshot = None;

        for (batch, chunk) in uris.chunks(MAX_TRACKS_PER_REQUEST).enumerate() {
            debug!(
                "Adding batch {} ({} tracks) to playlist {}...",
                batch + 1,
                chunk.len(),
                playlist_id
            );
            let body = serde_json::json!({ "uris": chunk });
            let added: Snapshot = self
                .http_client
                .post_json(&url, &self.access_token, &body)
                .await
                .with_context(|| format!("Failed to add tracks to playlist {}", playlist_id))?;
            snapshot = Some(added);
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ExponentialBackoff, HttpError, MAX_RETRIES, RetryPolicy, StandardClassifier};
    use mockito::Matcher;
    use reqwest::{Client, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;

    const TRACK_JSON: &str = r#"{
        "id": "t1",
        "name": "Song One",
        "uri": "spotify:track:t1",
        "duration_ms": 200000,
        "artists": [{"id": "a1", "name": "Artist One"}],
        "album": {"id": "al1", "name": "Album One", "release_date": "2020-01-01"}
    }"#;

    fn client_for(server_url: &str) -> SpotifyClient {
        let policy = RetryPolicy::new(
            MAX_RETRIES,
            Arc::new(StandardClassifier),
            Arc::new(ExponentialBackoff::new(Duration::from_millis(1), 0.0)),
        );
        SpotifyClient::new(
            HttpClient::new(Client::new(), policy),
            &format!("{}/v1/", server_url),
            "token-abc",
        )
    }

    #[tokio::test]
    async fn test_current_user() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/me")
            .match_header("authorization", "Bearer token-abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": "wizzler", "display_name": "Wizzler", "email": "w@example.com",
                    "external_urls": {"spotify": "https://open.spotify.com/user/wizzler"}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let user = client.current_user().await.unwrap();

        mock.assert_async().await;
        assert_eq!(client.api_url(), format!("{}/v1", server.url()));
        assert_eq!(user.id, "wizzler");
        assert_eq!(user.name(), "Wizzler");
        assert_eq!(user.email.as_deref(), Some("w@example.com"));
    }

    #[tokio::test]
    async fn test_current_user_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/me")
            .with_status(401)
            .with_body(r#"{"error": {"status": 401, "message": "The access token expired"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client.current_user().await.unwrap_err();

        mock.assert_async().await;
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to fetch current user"));
        assert!(message.contains("The access token expired"));
        assert_eq!(
            err.downcast_ref::<HttpError>().and_then(HttpError::status),
            Some(StatusCode::UNAUTHORIZED)
        );
    }

    #[tokio::test]
    async fn test_recently_played() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/me/player/recently-played")
            .match_query(Matcher::UrlEncoded("limit".into(), "50".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"items": [{{"track": {}, "played_at": "2024-05-01T10:00:00Z"}}],
                    "next": null, "cursors": {{"after": "1714557600000", "before": null}}}}"#,
                TRACK_JSON
            ))
            .create_async()
            .await;

        let client = client_for(&server.url());
        let history = client.recently_played(100).await.unwrap();

        mock.assert_async().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].track.name, "Song One");
        assert_eq!(history[0].played_at, "2024-05-01T10:00:00Z");
    }

    #[tokio::test]
    async fn test_top_artists() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/me/top/artists")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("time_range".into(), "short_term".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items": [{"id": "a1", "name": "Artist One", "genres": ["indie"], "popularity": 70}],
                    "total": 1, "limit": 10, "next": null}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let artists = client.top_artists(TimeRange::ShortTerm, 10).await.unwrap();

        mock.assert_async().await;
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].genres, vec!["indie"]);
    }

    #[tokio::test]
    async fn test_top_tracks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/me/top/tracks")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("time_range".into(), "long_term".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"items": [{}], "total": 1}}"#, TRACK_JSON))
            .create_async()
            .await;

        let client = client_for(&server.url());
        let tracks = client.top_tracks(TimeRange::LongTerm, 0).await.unwrap();

        mock.assert_async().await;
        assert_eq!(tracks[0].uri, "spotify:track:t1");
    }

    #[tokio::test]
    async fn test_currently_playing_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/me/player/currently-playing")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let playing = client.currently_playing().await.unwrap();

        mock.assert_async().await;
        assert!(playing.is_none());
    }

    #[tokio::test]
    async fn test_currently_playing_track() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/me/player/currently-playing")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"is_playing": true, "progress_ms": 1000, "item": {},
                    "currently_playing_type": "track"}}"#,
                TRACK_JSON
            ))
            .create_async()
            .await;

        let client = client_for(&server.url());
        let playing = client.currently_playing().await.unwrap().unwrap();

        mock.assert_async().await;
        assert!(playing.is_playing);
        assert_eq!(playing.item.unwrap().name, "Song One");
    }

    #[tokio::test]
    async fn test_followed_artists() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/me/following")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("type".into(), "artist".into()),
                Matcher::UrlEncoded("limit".into(), "20".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"artists": {"items": [{"id": "a1", "name": "Artist One"}],
                    "next": null, "cursors": {"after": null}}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let artists = client.followed_artists(20).await.unwrap();

        mock.assert_async().await;
        assert_eq!(artists[0].name, "Artist One");
        assert!(artists[0].genres.is_empty());
    }

    #[tokio::test]
    async fn test_create_playlist_is_private() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/users/wizzler/playlists")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "Top tracks",
                "description": "From telescope",
                "public": false
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "p1", "name": "Top tracks", "uri": "spotify:playlist:p1", "public": false}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let playlist = client
            .create_playlist("wizzler", "Top tracks", "From telescope")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(playlist.id, "p1");
        assert_eq!(playlist.public, Some(false));
    }

    #[tokio::test]
    async fn test_create_playlist_server_error_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/users/wizzler/playlists")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result = client.create_playlist("wizzler", "Top", "").await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_add_tracks_in_batches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/playlists/p1/tracks")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"snapshot_id": "snap"}"#)
            .expect(3)
            .create_async()
            .await;

        let uris: Vec<String> = (0..250).map(|i| format!("spotify:track:{}", i)).collect();
        let client = client_for(&server.url());
        let snapshot = client.add_tracks("p1", &uris).await.unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.unwrap().snapshot_id, "snap");
    }

    #[tokio::test]
    async fn test_path_ids_are_percent_encoded() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/v1/users/dj%2Fkitty%20two/playlists")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "p 1", "name": "Top", "uri": "spotify:playlist:p1"}"#)
            .create_async()
            .await;
        let add = server
            .mock("POST", "/v1/playlists/p%201/tracks")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"snapshot_id": "snap"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let playlist = client
            .create_playlist("dj/kitty two", "Top", "")
            .await
            .unwrap();
        client
            .add_tracks(&playlist.id, &["spotify:track:t1".to_string()])
            .await
            .unwrap();

        create.assert_async().await;
        add.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_no_tracks_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/playlists/p1/tracks")
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let snapshot = client.add_tracks("p1", &[]).await.unwrap();

        mock.assert_async().await;
        assert!(snapshot.is_none());
    }
}
