use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub product: Option<String>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

impl User {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Album {
    pub id: Option<String>,
    pub name: String,
    pub release_date: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Track {
    /// Absent for local files.
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    pub artists: Vec<SimplifiedArtist>,
    pub album: Option<Album>,
    pub popularity: Option<u32>,
}

impl Track {
    /// Artist names joined with ", ".
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Offset-based page.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub total: Option<u32>,
    pub limit: Option<u32>,
    pub next: Option<String>,
}

/// Cursor-based page.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CursorPaging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub cursors: Option<Cursors>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Cursors {
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PlayHistory {
    pub track: Track,
    pub played_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CurrentlyPlaying {
    pub is_playing: bool,
    pub progress_ms: Option<u64>,
    /// `None` while an ad or an unavailable item plays.
    pub item: Option<Track>,
    pub currently_playing_type: Option<String>,
}

/// Wrapper around the followed-artists page.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FollowedArtists {
    pub artists: CursorPaging<Artist>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub public: Option<bool>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewPlaylist<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub snapshot_id: String,
}

/// Period over which top items are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Roughly the last four weeks.
    ShortTerm,
    /// Roughly the last six months.
    #[default]
    MediumTerm,
    /// Several years of data.
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "short_term" | "short" => Ok(TimeRange::ShortTerm),
            "medium_term" | "medium" => Ok(TimeRange::MediumTerm),
            "long_term" | "long" => Ok(TimeRange::LongTerm),
            _ => bail!(
                "Unknown time range: {}. Expected short_term, medium_term, or long_term.",
                s
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_parse() {
        assert_eq!(
            "short_term".parse::<TimeRange>().unwrap(),
            TimeRange::ShortTerm
        );
        assert_eq!(
            "Medium-Term".parse::<TimeRange>().unwrap(),
            TimeRange::MediumTerm
        );
        assert_eq!("long".parse::<TimeRange>().unwrap(), TimeRange::LongTerm);
        assert!("forever".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_time_range_display() {
        assert_eq!(TimeRange::ShortTerm.to_string(), "short_term");
        assert_eq!(TimeRange::default().to_string(), "medium_term");
        assert_eq!(TimeRange::LongTerm.to_string(), "long_term");
    }

    #[test]
    fn test_track_deserialize_and_artist_names() {
        let track: Track = serde_json::from_str(
            r#"{
                "id": "3n3Ppam7vgaVa1iaRUc9Lp",
                "name": "Mr. Brightside",
                "uri": "spotify:track:3n3Ppam7vgaVa1iaRUc9Lp",
                "duration_ms": 222973,
                "popularity": 80,
                "artists": [
                    {"id": "0C0XlULifJtAgn6ZNCW2eu", "name": "The Killers"},
                    {"id": null, "name": "Guest"}
                ],
                "album": {"id": "4OHNH3sDzIxnmUADXzv2kT", "name": "Hot Fuss", "release_date": "2004-06-07"}
            }"#,
        )
        .unwrap();

        assert_eq!(track.artist_names(), "The Killers, Guest");
        assert_eq!(track.album.unwrap().name, "Hot Fuss");
    }

    #[test]
    fn test_user_name_falls_back_to_id() {
        let user: User = serde_json::from_str(
            r#"{"id": "wizzler", "display_name": null, "email": "w@example.com"}"#,
        )
        .unwrap();
        assert_eq!(user.name(), "wizzler");
        assert!(user.external_urls.is_empty());
    }
}
