use anyhow::Result;
use clap::Parser;
use std::io;
use std::time::Duration;
use telescope::app::App;
use telescope::commands::{self, TopKind};
use telescope::config::{Overrides, Settings};
use telescope::spotify::TimeRange;

/// telescope - a look at your Spotify listening
///
/// Authorizes against Spotify with the authorization-code flow and reads
/// listening data through the Web API. Failed requests are retried with
/// exponential backoff; rate limits are honored up to 30 seconds.
///
/// SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET and SPOTIFY_REDIRECT_URI configure
/// the OAuth client. SPOTIFY_ACCESS_TOKEN supplies the token for API calls.
///
/// Examples:
///   telescope authorize              # Print the URL to approve access
///   telescope top tracks --range short_term
#[derive(Parser, Debug)]
#[command(author, version = env!("TELESCOPE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Spotify Web API URL (defaults to https://api.spotify.com/v1)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Spotify accounts URL (defaults to https://accounts.spotify.com)
    #[arg(long = "accounts-url", value_name = "URL", global = true)]
    pub accounts_url: Option<String>,

    /// Access token for Web API calls
    #[arg(
        long = "token",
        env = "SPOTIFY_ACCESS_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", global = true)]
    pub timeout: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the URL that starts authorization
    Authorize(AuthorizeArgs),

    /// Exchange an authorization code for tokens
    Token(TokenArgs),

    /// Refresh an access token
    Refresh(RefreshArgs),

    /// Show the current user
    Me,

    /// List recently played tracks
    Recent(LimitArgs),

    /// List top artists or tracks
    Top(TopArgs),

    /// Show the currently playing track
    NowPlaying,

    /// List followed artists
    Following(LimitArgs),

    /// Save top tracks to a new private playlist
    Playlist(PlaylistArgs),
}

#[derive(clap::Args, Debug)]
pub struct AuthorizeArgs {
    /// State to round-trip through the redirect (random when omitted)
    #[arg(long, value_name = "STATE")]
    pub state: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct TokenArgs {
    /// The `code` query parameter from the redirect
    #[arg(value_name = "CODE")]
    pub code: String,
}

#[derive(clap::Args, Debug)]
pub struct RefreshArgs {
    #[arg(value_name = "REFRESH_TOKEN")]
    pub refresh_token: String,
}

#[derive(clap::Args, Debug)]
pub struct LimitArgs {
    /// Number of items, 1 to 50
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: u32,
}

#[derive(clap::Args, Debug)]
pub struct TopArgs {
    /// artists or tracks
    #[arg(value_name = "KIND")]
    pub kind: TopKind,

    /// short_term, medium_term or long_term
    #[arg(long, default_value = "medium_term")]
    pub range: TimeRange,

    /// Number of items, 1 to 50
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: u32,
}

#[derive(clap::Args, Debug)]
pub struct PlaylistArgs {
    /// Playlist name (defaults to "Top tracks (<range>)")
    #[arg(long)]
    pub name: Option<String>,

    /// short_term, medium_term or long_term
    #[arg(long, default_value = "short_term")]
    pub range: TimeRange,

    /// Number of tracks, 1 to 50
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: u32,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            accounts_url: self.accounts_url.clone(),
            access_token: self.token.clone(),
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = telescope::runtime::RealRuntime;

    let settings = Settings::load(&runtime, cli.overrides());
    let app = App::new(settings)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Authorize(args) => commands::authorize(&app.strategy()?, args.state, &mut out)?,
        Commands::Token(args) => commands::token(&app.oauth_client()?, &args.code, &mut out).await?,
        Commands::Refresh(args) => {
            commands::refresh(&app.oauth_client()?, &args.refresh_token, &mut out).await?
        }
        Commands::Me => commands::me(&app.spotify_client()?, &mut out).await?,
        Commands::Recent(args) => {
            commands::recent(&app.spotify_client()?, args.limit, &mut out).await?
        }
        Commands::Top(args) => {
            commands::top(
                &app.spotify_client()?,
                args.kind,
                args.range,
                args.limit,
                &mut out,
            )
            .await?
        }
        Commands::NowPlaying => commands::now_playing(&app.spotify_client()?, &mut out).await?,
        Commands::Following(args) => {
            commands::following(&app.spotify_client()?, args.limit, &mut out).await?
        }
        Commands::Playlist(args) => {
            commands::save_top_tracks(
                &app.spotify_client()?,
                args.name,
                args.range,
                args.limit,
                &mut out,
            )
            .await?
        }
    }
    Ok(())
}
