//! Command handlers behind the CLI.
//!
//! Handlers take their services and an output sink, so they can run against
//! mocks in tests.

mod auth;
mod listening;
mod playlist;

pub use auth::{authorize, refresh, token};
pub use listening::{TopKind, following, me, now_playing, recent, top};
pub use playlist::save_top_tracks;

/// Formats milliseconds as `m:ss`.
pub(crate) fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59_999), "0:59");
        assert_eq!(format_duration(222_973), "3:42");
        assert_eq!(format_duration(3_600_000), "60:00");
    }
}
