use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iptv_catalog::{
    app::{AppState, Collaborators, Notification, NotificationLevel},
    config::Config,
    filter::StatusFilter,
    player::LoggingSink,
    services::HttpReachabilityProbe,
    storage::{JsonFileStore, UploadHistory},
    utils::{DecompressionService, StandardHttpClient, UrlUtils},
};

#[derive(Parser)]
#[command(name = "iptv-catalog")]
#[command(version)]
#[command(about = "Load IPTV playlists and guides into a searchable, status-aware channel catalog")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Persisted state file (overrides config file)
    #[arg(short, long, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a playlist from a local file or an http(s) URL
    Load {
        source: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Reload the playlist that was loaded last
    Restore {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List upload history, or reload one entry from it
    History {
        entry: Option<String>,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Toggle a channel URL in the favorites
    Favorite { url: String },
    /// Forget favorites, history and cached playlists
    Reset,
}

#[derive(clap::Args)]
struct ViewArgs {
    /// Guide feed to attach (overrides config file)
    #[arg(long, value_name = "URL")]
    epg: Option<String>,

    /// Case-insensitive search on title or group
    #[arg(short, long, default_value = "")]
    query: String,

    /// Only show channels with this status (total, active, offline, unknown)
    #[arg(long)]
    status: Option<String>,

    /// Skip reachability probing
    #[arg(long)]
    no_probe: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("iptv_catalog={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting IPTV Catalog v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);
    if let Some(state_path) = cli.state {
        config.storage.state_path = state_path;
    }

    let http_client = StandardHttpClient::new(&config.http)?;
    let probe = HttpReachabilityProbe::new(http_client.inner_client().clone());
    let store = JsonFileStore::open_or_empty(&config.storage.state_path);
    info!("Using state file: {}", store.path().display());

    let collaborators = Collaborators {
        store: Box::new(store),
        fetcher: Arc::new(http_client),
        probe: Arc::new(probe),
        sink: Box::new(LoggingSink),
    };
    let mut state = AppState::new(config, collaborators);
    let mut notifications = state.subscribe();

    match cli.command {
        Command::Load { source, view } => {
            let outcome = if UrlUtils::is_http_url(&source) {
                state.ingest_url(&source).await
            } else {
                let (name, contents) = read_playlist_file(Path::new(&source)).await?;
                state.ingest_file(&name, &contents)
            };
            print_notifications(&mut notifications);
            outcome?;
            show_catalog(&mut state, &view, &mut notifications).await?;
        }
        Command::Restore { view } => {
            let restored = state.restore_last_playlist().await;
            print_notifications(&mut notifications);
            if restored?.is_none() {
                println!("Nothing to restore.");
                return Ok(());
            }
            show_catalog(&mut state, &view, &mut notifications).await?;
        }
        Command::History { entry: None, .. } => {
            if state.history().is_empty() {
                println!("No upload history.");
            }
            for item in state.history().items() {
                let cached = state
                    .uploaded_playlists()
                    .contains_key(UploadHistory::entry_of(item));
                println!("{}{}", item, if cached { " (cached)" } else { "" });
            }
        }
        Command::History {
            entry: Some(entry),
            view,
        } => {
            let loaded = state.load_from_history(&entry).await;
            print_notifications(&mut notifications);
            loaded?;
            show_catalog(&mut state, &view, &mut notifications).await?;
        }
        Command::Favorite { url } => {
            let is_favorite = state.toggle_favorite(&url);
            println!(
                "{} {}",
                UrlUtils::obfuscate_credentials(&url),
                if is_favorite {
                    "added to favorites"
                } else {
                    "removed from favorites"
                }
            );
        }
        Command::Reset => {
            state.reset();
            print_notifications(&mut notifications);
        }
    }

    Ok(())
}

/// Read a local playlist, transparently inflating gzip content
async fn read_playlist_file(path: &Path) -> Result<(String, String)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {}", path.display()))?
        .to_string();
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let bytes = DecompressionService::decompress(raw)?;
    let contents = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    Ok((name, contents))
}

async fn show_catalog(
    state: &mut AppState,
    view: &ViewArgs,
    notifications: &mut broadcast::Receiver<Notification>,
) -> Result<()> {
    let epg = match &view.epg {
        Some(url) => Some(state.load_epg(url).await),
        None => state.load_configured_epg().await,
    };
    if let Some(Err(e)) = epg {
        warn!("Continuing without guide: {}", e);
    }

    if !view.no_probe {
        let stats = state.refresh_statuses().await;
        info!(
            "Probed {} channels: {} active, {} offline",
            stats.total, stats.active, stats.offline
        );
    }

    state.set_query(view.query.as_str());
    if let Some(name) = &view.status {
        let filter = StatusFilter::from_name(name)
            .with_context(|| format!("Unknown status filter: {name}"))?;
        state.toggle_status_filter(filter);
    }
    print_notifications(notifications);

    let catalog_view = state.view();
    if let Some(message) = catalog_view.message() {
        println!("{message}");
    }
    for group in catalog_view.groups() {
        println!("[{}] ({})", group.name, group.channels.len());
        for channel in &group.channels {
            let star = if state.favorites().contains(&channel.url) {
                "*"
            } else {
                " "
            };
            println!(
                " {} {:<8} {}  {}",
                star,
                channel.status.to_string(),
                channel.title,
                UrlUtils::obfuscate_credentials(&channel.url)
            );
        }
    }

    let stats = state.stats();
    println!(
        "Total: {}  Active: {}  Offline: {}  Unknown: {}",
        stats.total, stats.active, stats.offline, stats.unknown
    );

    if let (Some(playing), Some(snapshot)) = (state.now_playing(), state.epg_snapshot(Utc::now())) {
        println!("Now playing: {}", playing.title);
        if let Some(current) = &snapshot.current {
            println!(
                "  Now: {} ({:.0}%) - {}",
                current.title, snapshot.progress_percent, current.description
            );
        }
        if let Some(next) = &snapshot.next {
            println!("  Next: {} at {}", next.title, next.start_time.format("%H:%M"));
        }
    }
    Ok(())
}

fn print_notifications(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        match notification.level {
            NotificationLevel::Info => println!("{}", notification.message),
            NotificationLevel::Error => eprintln!("error: {}", notification.message),
        }
    }
}
