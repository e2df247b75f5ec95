//! Playback control over an external media sink
//!
//! The sink renders streams; this module decides which playback path to use,
//! tracks the loading indicator, turns sink events into notifications and
//! performs the single native retry after a fatal adaptive-stream error.

use tracing::{debug, info, warn};

use crate::app::notification::Notifier;
use crate::errors::PlaybackError;
use crate::models::Channel;
use crate::utils::url::UrlUtils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPath {
    /// Segmented adaptive streaming (HLS manifests)
    Adaptive,
    /// The sink's own direct playback
    Native,
}

/// Asynchronous events reported by the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Playing,
    Waiting,
    Error { fatal: bool, message: String },
    Stalled,
}

/// Black-box renderer
pub trait MediaSink: Send {
    fn load(&mut self, url: &str, path: PlaybackPath) -> Result<(), PlaybackError>;
    fn stop(&mut self);
}

/// Sink that only records what it was asked to do
#[derive(Debug, Default)]
pub struct LoggingSink;

impl MediaSink for LoggingSink {
    fn load(&mut self, url: &str, path: PlaybackPath) -> Result<(), PlaybackError> {
        info!(
            "Media sink loading {} via {:?} path",
            UrlUtils::obfuscate_credentials(url),
            path
        );
        Ok(())
    }

    fn stop(&mut self) {
        debug!("Media sink stopped");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub url: String,
    pub title: String,
    pub path: PlaybackPath,
    /// Set once the native retry has been spent
    pub fallback_used: bool,
}

pub struct PlaybackController {
    sink: Box<dyn MediaSink>,
    notifier: Notifier,
    now_playing: Option<NowPlaying>,
    loading: bool,
}

impl PlaybackController {
    pub fn new(sink: Box<dyn MediaSink>, notifier: Notifier) -> Self {
        Self {
            sink,
            notifier,
            now_playing: None,
            loading: false,
        }
    }

    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.now_playing.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start `channel`. Returns false when it is already the current channel.
    pub fn play(&mut self, channel: &Channel) -> bool {
        if self
            .now_playing
            .as_ref()
            .is_some_and(|current| current.url == channel.url)
        {
            return false;
        }
        self.start(channel.url.clone(), channel.title.clone());
        true
    }

    /// Restart the current channel from scratch
    pub fn replay(&mut self) -> bool {
        match self.now_playing.take() {
            Some(current) => {
                self.start(current.url, current.title);
                true
            }
            None => false,
        }
    }

    pub fn stop(&mut self) {
        self.sink.stop();
        self.now_playing = None;
        self.loading = false;
    }

    pub fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Playing => self.loading = false,
            PlayerEvent::Waiting => self.loading = true,
            PlayerEvent::Stalled => self.report_error("Video stalled"),
            PlayerEvent::Error { fatal, message } => {
                debug!("Sink error (fatal: {}): {}", fatal, message);
                let retry_native = fatal
                    && self.now_playing.as_ref().is_some_and(|current| {
                        current.path == PlaybackPath::Adaptive && !current.fallback_used
                    });
                if retry_native {
                    self.report_error("Streaming error");
                    self.fall_back_to_native();
                } else {
                    self.report_error("Video error");
                }
            }
        }
    }

    fn start(&mut self, url: String, title: String) {
        self.sink.stop();
        self.loading = true;
        self.notifier.info(format!("Now Playing: {title}"));

        let path = if url.contains(".m3u8") {
            PlaybackPath::Adaptive
        } else {
            PlaybackPath::Native
        };
        let result = self.sink.load(&url, path);
        self.now_playing = Some(NowPlaying {
            url,
            title,
            path,
            fallback_used: false,
        });

        if let Err(e) = result {
            warn!("Sink refused to load: {}", e);
            match path {
                PlaybackPath::Adaptive => {
                    self.report_error("Playback failed");
                    self.fall_back_to_native();
                }
                PlaybackPath::Native => self.report_error("Native playback failed"),
            }
        }
    }

    fn fall_back_to_native(&mut self) {
        let Some(current) = self.now_playing.as_mut() else {
            return;
        };
        current.path = PlaybackPath::Native;
        current.fallback_used = true;
        info!(
            "Retrying {} on the native path",
            UrlUtils::obfuscate_credentials(&current.url)
        );
        let url = current.url.clone();
        if let Err(e) = self.sink.load(&url, PlaybackPath::Native) {
            warn!("Native retry failed: {}", e);
            self.report_error("Native playback failed");
        }
    }

    fn report_error(&mut self, message: &str) {
        self.loading = false;
        self.notifier.error(format!("{message}. Try another channel."));
    }
}
