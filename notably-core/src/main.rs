//! notably - spell out a phrase with song titles
//!
//! **Commands:**
//! - `notably segment <PHRASE>` - find tracks whose titles spell the phrase,
//!   optionally saving them as a private Spotify playlist
//! - `notably remove <PLAYLIST_ID>` - unfollow a playlist created earlier
//!
//! Ctrl-C during a segmentation cancels it cleanly.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use notably_common::config::{self, TomlConfig};
use notably_core::services::SpotifyClient;
use notably_core::{
    playlist_name, Candidate, EngineConfig, ErrorKind, Objective, PlaylistHandle, RunStats,
    SegmentationEngine, SegmentationFailure, SegmentationResult, Suggestion, SuggestionGenerator,
    Tracklist, TracklistAssembler,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "notably", version, about = "Spell out a phrase with song titles")]
struct Args {
    /// Path to config file (overrides NOTABLY_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Spotify bearer token
    #[arg(long, global = true, env = "NOTABLY_SPOTIFY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Segment a phrase into track titles
    Segment(SegmentArgs),

    /// Remove (unfollow) a playlist
    Remove {
        /// Spotify playlist id
        playlist_id: String,
    },
}

#[derive(Debug, ClapArgs)]
struct SegmentArgs {
    /// Phrase to spell out
    phrase: String,

    /// Prefer many short titles over few long ones
    #[arg(long)]
    maximize: bool,

    /// Delay before each position's lookups (milliseconds)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Longest window looked up as one title (words)
    #[arg(long)]
    max_window: Option<usize>,

    /// Lookups in flight at once per position
    #[arg(long)]
    concurrency: Option<usize>,

    /// Overall time budget (milliseconds)
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Save the tracklist as a private playlist
    #[arg(long)]
    create_playlist: bool,

    /// Playlist name (default "<prefix>: <phrase>")
    #[arg(long, requires = "create_playlist")]
    name: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

impl SegmentArgs {
    /// Apply command-line overrides on top of the TOML engine settings
    fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(delay) = self.delay_ms {
            config.engine.batch_delay_ms = delay;
        }
        if let Some(window) = self.max_window {
            config.engine.max_window_words = window;
        }
        if let Some(concurrency) = self.concurrency {
            config.engine.lookup_concurrency = concurrency;
        }
        if let Some(deadline) = self.deadline_ms {
            config.engine.deadline_ms = Some(deadline);
        }
    }

    fn objective(&self) -> Objective {
        if self.maximize {
            Objective::MaximizeSegments
        } else {
            Objective::MinimizeSegments
        }
    }
}

/// Machine-readable run report
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Report<'a> {
    Success {
        tracklist: &'a Tracklist,
        stats: RunStats,
        #[serde(skip_serializing_if = "Option::is_none")]
        playlist: Option<&'a PlaylistHandle>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cover_image_url: Option<&'a str>,
    },
    Failure {
        failure: &'a SegmentationFailure,
        suggestions: &'a [Suggestion],
        stats: RunStats,
    },
    Error {
        kind: ErrorKind,
        message: String,
        checked_candidates: &'a [Candidate],
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let (mut toml_config, origin) =
        config::load_with_origin(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&toml_config)?;

    info!("Starting notably v{}", env!("CARGO_PKG_VERSION"));
    origin.log();

    let token = config::resolve_access_token(args.token.as_deref(), &toml_config)?;

    match args.command {
        Command::Segment(segment_args) => {
            segment_args.apply_overrides(&mut toml_config);
            toml_config
                .validate()
                .context("Invalid engine settings")?;
            run_segment(segment_args, &toml_config, token).await
        }
        Command::Remove { playlist_id } => {
            let client = Arc::new(
                SpotifyClient::new(token, &toml_config.spotify)
                    .context("Failed to create Spotify client")?,
            );
            TracklistAssembler::new(client)
                .remove(&playlist_id)
                .await
                .with_context(|| format!("Failed to remove playlist {}", playlist_id))?;
            println!("Removed playlist {}", playlist_id);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialize tracing: RUST_LOG wins, otherwise the configured level
fn init_tracing(toml_config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&toml_config.logging.level))
        .context("Invalid log level")?;

    match &toml_config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => {
            // stderr keeps stdout clean for --json
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

async fn run_segment(
    args: SegmentArgs,
    toml_config: &TomlConfig,
    token: String,
) -> Result<ExitCode> {
    let client = Arc::new(
        SpotifyClient::new(token, &toml_config.spotify).context("Failed to create Spotify client")?,
    );
    let engine = SegmentationEngine::new(client.clone(), EngineConfig::from(&toml_config.engine));

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, canceling segmentation");
                cancel.cancel();
            }
        }
    });

    let result = engine.segment(&args.phrase, args.objective(), &cancel).await;
    ctrl_c.abort();

    let status = exit_status(&result);
    match result {
        SegmentationResult::Success { tracklist, stats } => {
            let mut playlist = None;
            let mut cover = None;
            if args.create_playlist {
                let name = args.name.clone().unwrap_or_else(|| {
                    playlist_name(&toml_config.spotify.playlist_name_prefix, &args.phrase)
                });
                let handle = TracklistAssembler::new(client.clone())
                    .assemble(&tracklist, &name)
                    .await
                    .context("Failed to create playlist")?;
                cover = client.cover_image_url(&handle.id).await;
                playlist = Some(handle);
            }

            if args.json {
                print_json(&Report::Success {
                    tracklist: &tracklist,
                    stats,
                    playlist: playlist.as_ref(),
                    cover_image_url: cover.as_deref(),
                })?;
            } else {
                print_tracklist(&tracklist);
                if let Some(handle) = &playlist {
                    println!();
                    println!("Playlist: {}", handle.url.as_deref().unwrap_or(&handle.id));
                    if let Some(cover) = &cover {
                        println!("Cover:    {}", cover);
                    }
                }
            }
        }
        SegmentationResult::Failure { failure, stats } => {
            let suggestions = SuggestionGenerator::new().suggest(&failure);
            if args.json {
                print_json(&Report::Failure {
                    failure: &failure,
                    suggestions: &suggestions,
                    stats,
                })?;
            } else {
                print_failure(&failure, &suggestions);
            }
        }
        SegmentationResult::Error(err) => {
            if args.json {
                print_json(&Report::Error {
                    kind: err.kind(),
                    message: err.to_string(),
                    checked_candidates: err.checked_candidates(),
                })?;
            } else {
                eprintln!("Error: Segmentation failed: {}", err);
            }
        }
    }
    Ok(ExitCode::from(status))
}

/// Process exit status for a run
///
/// 0 success, 1 no segmentation exists, 2 the run itself failed
fn exit_status(result: &SegmentationResult) -> u8 {
    match result {
        SegmentationResult::Success { .. } => 0,
        SegmentationResult::Failure { .. } => 1,
        SegmentationResult::Error(_) => 2,
    }
}

fn print_json(report: &Report<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

fn print_tracklist(tracklist: &Tracklist) {
    println!("{} ({} tracks)", tracklist.text(), tracklist.len());
    for (idx, segment) in tracklist.segments.iter().enumerate() {
        let candidate = &segment.candidate;
        if candidate.artists.is_empty() {
            println!("{:>3}. {}  [{}]", idx + 1, candidate.name, candidate.id);
        } else {
            println!(
                "{:>3}. {} - {}  [{}]",
                idx + 1,
                candidate.name,
                candidate.artist_line(),
                candidate.id
            );
        }
    }
}

fn print_failure(failure: &SegmentationFailure, suggestions: &[Suggestion]) {
    println!("No tracklist spells \"{}\"", failure.tokens.join(" "));
    if !failure.best_prefix.is_empty() {
        println!("Longest match: {}", failure.best_prefix.text());
    }
    if suggestions.is_empty() {
        return;
    }
    println!("Try instead:");
    for suggestion in suggestions {
        println!("  - {}", suggestion.text);
    }
}
