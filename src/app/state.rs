use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::notification::{Notification, Notifier};
use crate::catalog::{Catalog, PlaylistStats, deduplicate};
use crate::config::Config;
use crate::epg::{EpgGuide, EpgSnapshot};
use crate::errors::{AppResult, SourceError, SourceResult};
use crate::filter::{CatalogView, FilterEngine, FilterState, StatusFilter};
use crate::models::{Channel, ChannelStatus, Favorites, Program};
use crate::player::{MediaSink, NowPlaying, PlaybackController, PlayerEvent};
use crate::services::stream_prober::{ProbeJob, ProbeReport, ReachabilityProbe, StatusProber};
use crate::sources::PlaylistFormat;
use crate::sources::xmltv_epg::parse_guide;
use crate::storage::{
    FAVORITES_KEY, KeyValueStore, LAST_PLAYLIST_KEY, LastPlaylist, LastPlaylistKind,
    UPLOAD_HISTORY_KEY, UPLOADED_PLAYLISTS_KEY, UploadHistory, UploadedPlaylists, load_json,
    save_json,
};
use crate::utils::http_client::DecompressingHttpClient;
use crate::utils::url::UrlUtils;

/// External collaborators the state drives
pub struct Collaborators {
    pub store: Box<dyn KeyValueStore>,
    pub fetcher: Arc<dyn DecompressingHttpClient>,
    pub probe: Arc<dyn ReachabilityProbe>,
    pub sink: Box<dyn MediaSink>,
}

/// Result of a successful ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    /// File name or URL the playlist came from
    pub source: String,
    pub channels: usize,
}

/// All mutable application state, owned by one logical task
///
/// Every ingestion path takes `&mut self`, so a second ingestion cannot start
/// while one is awaiting its fetch.
pub struct AppState {
    config: Config,
    catalog: Catalog,
    favorites: Favorites,
    guide: EpgGuide,
    filter: FilterState,
    history: UploadHistory,
    uploaded: UploadedPlaylists,
    last_playlist: Option<LastPlaylist>,
    store: Box<dyn KeyValueStore>,
    fetcher: Arc<dyn DecompressingHttpClient>,
    prober: StatusProber,
    player: PlaybackController,
    notifier: Notifier,
}

impl AppState {
    /// Build the state and load whatever was persisted. Unreadable persisted
    /// values are logged and replaced with empty defaults.
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            fetcher,
            probe,
            sink,
        } = collaborators;

        let favorites: Favorites = load_or_default(store.as_ref(), FAVORITES_KEY);
        let history_items: Vec<String> = load_or_default(store.as_ref(), UPLOAD_HISTORY_KEY);
        let uploaded: UploadedPlaylists = load_or_default(store.as_ref(), UPLOADED_PLAYLISTS_KEY);
        let last_playlist: Option<LastPlaylist> = load_or_default(store.as_ref(), LAST_PLAYLIST_KEY);

        debug!(
            "Loaded state: {} favorites, {} history entries, {} cached playlists",
            favorites.len(),
            history_items.len(),
            uploaded.len()
        );

        let notifier = Notifier::new();
        Self {
            history: UploadHistory::from_items(history_items, config.catalog.history_limit),
            prober: StatusProber::new(probe, &config.probe),
            player: PlaybackController::new(sink, notifier.clone()),
            catalog: Catalog::new(),
            guide: EpgGuide::new(),
            filter: FilterState::default(),
            favorites,
            uploaded,
            last_playlist,
            store,
            fetcher,
            notifier,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn guide(&self) -> &EpgGuide {
        &self.guide
    }

    pub fn history(&self) -> &UploadHistory {
        &self.history
    }

    pub fn uploaded_playlists(&self) -> &UploadedPlaylists {
        &self.uploaded
    }

    pub fn last_playlist(&self) -> Option<&LastPlaylist> {
        self.last_playlist.as_ref()
    }

    pub fn stats(&self) -> PlaylistStats {
        self.catalog.stats()
    }

    /// Hand the store back, e.g. to reopen the state from it
    pub fn into_store(self) -> Box<dyn KeyValueStore> {
        self.store
    }

    // Ingestion

    /// Ingest an uploaded playlist file whose format follows from `name`
    pub fn ingest_file(&mut self, name: &str, contents: &str) -> AppResult<IngestSummary> {
        self.notifier.info("Uploading file...");

        let format = PlaylistFormat::from_name(name).inspect_err(|_| {
            self.notifier.error("Unsupported file format");
        })?;

        let channels = match format.parse(contents, &self.config.catalog.placeholder_logo) {
            Ok(channels) => deduplicate(channels),
            Err(e) => {
                error!("Failed to parse uploaded file '{}': {}", name, e);
                self.notifier.error("Failed to read file");
                return Err(e.into());
            }
        };

        self.uploaded.insert(name.to_string(), channels.clone());
        let summary = self.install_channels(channels, name);
        self.record_history(name);
        persist(self.store.as_mut(), UPLOADED_PLAYLISTS_KEY, &self.uploaded);
        self.set_last_playlist(LastPlaylist::file(name));

        info!("Parsed {} channels from file: {}", summary.channels, name);
        self.notifier.info("File uploaded successfully!");
        self.autoplay_first();
        Ok(summary)
    }

    /// Fetch and ingest a playlist URL entered by the user
    pub async fn ingest_url(&mut self, url: &str) -> AppResult<IngestSummary> {
        let url = url.trim();
        if url.is_empty() {
            self.notifier.error("Please enter a URL");
            return Err(SourceError::invalid_source("empty URL").into());
        }
        if !UrlUtils::is_http_url(url) {
            self.notifier.error("Invalid URL format");
            return Err(SourceError::invalid_source(format!(
                "not an http(s) URL: {}",
                UrlUtils::obfuscate_credentials(url)
            ))
            .into());
        }

        self.notifier.info("Loading URL...");

        let format = PlaylistFormat::from_name(url).inspect_err(|_| {
            self.notifier.error("Unsupported URL format");
        })?;

        let channels = match self.fetch_and_parse(url, format).await {
            Ok(channels) => channels,
            Err(e) => {
                error!("URL upload failed: {}", e);
                self.notifier.error("Failed to load URL");
                return Err(e.into());
            }
        };

        let summary = self.install_channels(channels, url);
        if self.record_history(url) {
            persist(self.store.as_mut(), UPLOADED_PLAYLISTS_KEY, &self.uploaded);
        }
        self.set_last_playlist(LastPlaylist::url(url));

        info!(
            "Parsed {} channels from URL: {}",
            summary.channels,
            UrlUtils::obfuscate_credentials(url)
        );
        self.notifier.info("URL loaded successfully!");
        self.autoplay_first();
        Ok(summary)
    }

    /// Replay a history entry: URLs are fetched again, file names come from the cache
    pub async fn load_from_history(&mut self, entry: &str) -> AppResult<IngestSummary> {
        self.notifier.info(format!("Loading {entry}..."));

        if UrlUtils::is_http_url(entry) {
            let summary = self.reload_url(entry).await?;
            self.autoplay_first();
            return Ok(summary);
        }

        match self.uploaded.get(entry).cloned() {
            Some(cached) => {
                let summary = self.install_channels(prepare_cached(cached), entry);
                self.set_last_playlist(LastPlaylist::file(entry));
                self.notifier.info(format!("Loaded {entry} from history!"));
                self.autoplay_first();
                Ok(summary)
            }
            None => {
                self.notifier
                    .error("Playlist data not found. Please re-upload the file.");
                Err(SourceError::invalid_source(format!("no cached playlist for '{entry}'")).into())
            }
        }
    }

    /// Bring back the playlist that was loaded last, if any
    pub async fn restore_last_playlist(&mut self) -> AppResult<Option<IngestSummary>> {
        let Some(last) = self.last_playlist.clone() else {
            debug!("No last playlist to restore");
            return Ok(None);
        };

        match last.kind {
            LastPlaylistKind::Url => self.reload_url(&last.value).await.map(Some),
            LastPlaylistKind::File => match self.uploaded.get(&last.value).cloned() {
                Some(cached) => Ok(Some(self.install_channels(prepare_cached(cached), &last.value))),
                None => {
                    warn!("Last playlist '{}' is no longer cached", last.value);
                    Ok(None)
                }
            },
        }
    }

    /// Fetch a known playlist URL, falling back to the extended format when
    /// the suffix names none
    async fn reload_url(&mut self, url: &str) -> AppResult<IngestSummary> {
        let format = PlaylistFormat::from_name(url).unwrap_or(PlaylistFormat::Extended);
        let channels = match self.fetch_and_parse(url, format).await {
            Ok(channels) => channels,
            Err(e) => {
                error!("Playlist fetch failed: {}", e);
                self.notifier.error("Failed to load M3U playlist");
                return Err(e.into());
            }
        };

        let summary = self.install_channels(channels, url);
        if self.record_history(url) {
            persist(self.store.as_mut(), UPLOADED_PLAYLISTS_KEY, &self.uploaded);
        }
        self.set_last_playlist(LastPlaylist::url(url));
        self.notifier.info("Playlist loaded successfully!");
        Ok(summary)
    }

    async fn fetch_and_parse(&self, url: &str, format: PlaylistFormat) -> SourceResult<Vec<Channel>> {
        let text = self.fetcher.fetch_text(url).await?;
        let channels = format.parse(&text, &self.config.catalog.placeholder_logo)?;
        Ok(deduplicate(channels))
    }

    fn install_channels(&mut self, channels: Vec<Channel>, source: &str) -> IngestSummary {
        self.catalog.replace(channels);
        if !self.guide.is_empty() {
            self.guide.attach(&mut self.catalog);
        }
        IngestSummary {
            source: source.to_string(),
            channels: self.catalog.len(),
        }
    }

    /// Record `entry` and drop cached uploads that fell out of the history.
    /// Returns whether the upload cache changed.
    fn record_history(&mut self, entry: &str) -> bool {
        if !self.history.record(entry, Local::now()) {
            return false;
        }
        persist(self.store.as_mut(), UPLOAD_HISTORY_KEY, &self.history);

        let items = self.history.items();
        let before = self.uploaded.len();
        self.uploaded
            .retain(|name, _| items.iter().any(|item| item.contains(name.as_str())));
        let dropped = before - self.uploaded.len();
        if dropped > 0 {
            debug!("Dropped {} cached uploads no longer in history", dropped);
        }
        dropped > 0
    }

    fn set_last_playlist(&mut self, last: LastPlaylist) {
        persist(self.store.as_mut(), LAST_PLAYLIST_KEY, &last);
        self.last_playlist = Some(last);
    }

    fn autoplay_first(&mut self) {
        if let Some(first) = self.catalog.channels().first() {
            self.player.play(first);
        }
    }

    // Status probing

    /// Snapshot of the current catalog for an externally driven probe run
    pub fn probe_job(&self) -> ProbeJob {
        self.catalog.probe_targets()
    }

    pub fn prober(&self) -> &StatusProber {
        &self.prober
    }

    /// Apply a finished probe run; reports from an older catalog are dropped
    pub fn apply_probe_report(&mut self, report: &ProbeReport) -> bool {
        let applied = self.catalog.apply_statuses(report);
        if applied {
            let stats = self.catalog.stats();
            info!(
                "Channel status: {} total, {} active, {} offline",
                stats.total, stats.active, stats.offline
            );
        }
        applied
    }

    /// Re-probe every channel and wait for all results
    pub async fn refresh_statuses(&mut self) -> PlaylistStats {
        if self.catalog.is_empty() {
            return self.catalog.stats();
        }
        self.catalog.reset_statuses();
        let report = self.prober.probe_all(self.catalog.probe_targets()).await;
        self.apply_probe_report(&report);
        self.catalog.stats()
    }

    // Guide

    /// Fetch and attach a guide feed. On failure the previous guide stays.
    pub async fn load_epg(&mut self, url: &str) -> AppResult<usize> {
        let policy = self.config.epg.timezone_policy;
        let result = match self.fetcher.fetch_text(url).await {
            Ok(text) => parse_guide(&text, policy),
            Err(e) => Err(e),
        };
        self.apply_guide(result, url)
    }

    /// Attach a guide document that is already in memory
    pub fn load_epg_text(&mut self, text: &str, source: &str) -> AppResult<usize> {
        let result = parse_guide(text, self.config.epg.timezone_policy);
        self.apply_guide(result, source)
    }

    /// Load the guide named in the configuration, if there is one
    pub async fn load_configured_epg(&mut self) -> Option<AppResult<usize>> {
        let url = self
            .config
            .epg
            .url
            .clone()
            .filter(|url| !url.trim().is_empty())?;
        Some(self.load_epg(&url).await)
    }

    fn apply_guide(&mut self, result: SourceResult<Vec<Program>>, source: &str) -> AppResult<usize> {
        match result {
            Ok(programs) => {
                let count = programs.len();
                self.guide.replace(programs, source);
                self.guide.attach(&mut self.catalog);
                info!(
                    "Loaded {} programmes from guide: {}",
                    count,
                    UrlUtils::obfuscate_credentials(source)
                );
                self.notifier.info("EPG loaded successfully!");
                Ok(count)
            }
            Err(e) => {
                warn!(
                    "EPG loading failed for {}: {}",
                    UrlUtils::obfuscate_credentials(source),
                    e
                );
                self.notifier.error("EPG unavailable");
                Err(e.into())
            }
        }
    }

    /// Current and next programme of the playing channel
    pub fn epg_snapshot(&self, now: DateTime<Utc>) -> Option<EpgSnapshot> {
        self.current_channel()
            .map(|channel| EpgSnapshot::for_channel(channel, now))
    }

    // Favorites and filtering

    /// Returns whether `url` is a favorite afterwards
    pub fn toggle_favorite(&mut self, url: &str) -> bool {
        let is_favorite = self.favorites.toggle(url);
        persist(self.store.as_mut(), FAVORITES_KEY, &self.favorites);
        is_favorite
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.set_query(query);
    }

    pub fn toggle_status_filter(&mut self, filter: StatusFilter) {
        self.filter.toggle_status(filter);
    }

    pub fn view(&self) -> CatalogView<'_> {
        FilterEngine::apply(&self.catalog, &self.favorites, &self.filter)
    }

    // Playback

    pub fn play_channel(&mut self, url: &str) -> bool {
        match self.catalog.find_by_url(url) {
            Some(channel) => self.player.play(channel),
            None => {
                self.notifier.error("Channel not found");
                false
            }
        }
    }

    pub fn refresh_channel(&mut self) -> bool {
        if self.player.replay() {
            self.notifier.info("Channel refreshed!");
            true
        } else {
            false
        }
    }

    pub fn handle_player_event(&mut self, event: PlayerEvent) {
        self.player.handle_event(event);
    }

    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.player.now_playing()
    }

    pub fn is_loading(&self) -> bool {
        self.player.is_loading()
    }

    pub fn current_channel(&self) -> Option<&Channel> {
        self.player
            .now_playing()
            .and_then(|playing| self.catalog.find_by_url(&playing.url))
    }

    // Reset

    /// Forget everything: catalog, guide, favorites, history, cache and playback
    pub fn reset(&mut self) {
        self.player.stop();
        self.catalog.clear();
        self.guide.clear();
        self.favorites.clear();
        self.history.clear();
        self.uploaded.clear();
        self.last_playlist = None;
        self.filter.status = None;

        for key in [
            FAVORITES_KEY,
            UPLOAD_HISTORY_KEY,
            LAST_PLAYLIST_KEY,
            UPLOADED_PLAYLISTS_KEY,
        ] {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove persisted '{}': {}", key, e);
            }
        }
        self.notifier.info("History cleared!");
    }
}

/// Cached channel lists are re-deduplicated and start unprobed
fn prepare_cached(mut channels: Vec<Channel>) -> Vec<Channel> {
    for channel in &mut channels {
        channel.status = ChannelStatus::Unknown;
    }
    deduplicate(channels)
}

fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    match load_json(store, key) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring unreadable persisted '{}': {}", key, e);
            T::default()
        }
    }
}

fn persist<T: Serialize + ?Sized>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = save_json(store, key, value) {
        warn!("Failed to persist '{}': {}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_cached_resets_status_and_dedups() {
        let mut active = Channel::new("A", "http://x/a", "L");
        active.status = ChannelStatus::Active;
        let prepared = prepare_cached(vec![active.clone(), active]);
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].status, ChannelStatus::Unknown);
    }
}
