#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use iptv_catalog::app::{AppState, Collaborators, Notification};
use iptv_catalog::config::Config;
use iptv_catalog::errors::{PlaybackError, ProbeError, SourceError, SourceResult};
use iptv_catalog::player::{MediaSink, PlaybackPath};
use iptv_catalog::services::ReachabilityProbe;
use iptv_catalog::storage::{KeyValueStore, MemoryStore};
use iptv_catalog::utils::DecompressingHttpClient;

/// Serves canned bodies; unknown URLs answer 404
#[derive(Default)]
pub struct FakeFetcher {
    bodies: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn serve(&self, url: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }

    pub fn withdraw(&self, url: &str) {
        self.bodies.lock().unwrap().remove(url);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecompressingHttpClient for FakeFetcher {
    async fn fetch_bytes(&self, url: &str) -> SourceResult<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .map(|body| body.clone().into_bytes())
            .ok_or_else(|| SourceError::Http {
                status: 404,
                url: url.to_string(),
            })
    }
}

/// URLs containing "down" are unreachable, everything else answers
pub struct FakeProbe;

#[async_trait]
impl ReachabilityProbe for FakeProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        if url.contains("down") {
            Err(ProbeError::Failure {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub loads: Arc<Mutex<Vec<(String, PlaybackPath)>>>,
}

impl MediaSink for RecordingSink {
    fn load(&mut self, url: &str, path: PlaybackPath) -> Result<(), PlaybackError> {
        self.loads.lock().unwrap().push((url.to_string(), path));
        Ok(())
    }

    fn stop(&mut self) {}
}

pub struct Harness {
    pub state: AppState,
    pub fetcher: Arc<FakeFetcher>,
    pub sink: RecordingSink,
    pub notifications: tokio::sync::broadcast::Receiver<Notification>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Box::new(MemoryStore::new()))
    }

    pub fn with_store(store: Box<dyn KeyValueStore>) -> Self {
        let fetcher = Arc::new(FakeFetcher::default());
        let sink = RecordingSink::default();
        let state = AppState::new(
            Config::default(),
            Collaborators {
                store,
                fetcher: fetcher.clone(),
                probe: Arc::new(FakeProbe),
                sink: Box::new(sink.clone()),
            },
        );
        let notifications = state.subscribe();
        Self {
            state,
            fetcher,
            sink,
            notifications,
        }
    }

    /// Reopen from the same store, as a restart would
    pub fn reopen(self) -> Self {
        Self::with_store(self.state.into_store())
    }

    pub fn messages(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            messages.push(n.message);
        }
        messages
    }
}

pub const EXTENDED_PLAYLIST: &str = "#EXTM3U
#EXTINF:-1 tvg-logo=\"http://logos/news.png\",World News (HD)
#EXTGRP:News
#EXTTVM:news.one
http://streams/news.m3u8
#EXTINF:-1,Match Day
#EXTGRP:Sports
http://streams/down/sport.ts
#EXTINF:-1,Cartoons
#EXTGRP:Kids
http://streams/kids.ts
#EXTINF:-1,World News (HD)
#EXTGRP:News
http://streams/news.m3u8
";

pub const GUIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tv>
  <programme start="20240101120000 +0000" stop="20240101130000 +0000" channel="news.one">
    <title>Midday Bulletin</title>
    <desc>Headlines</desc>
    <category>News</category>
  </programme>
  <programme start="20240101130000 +0000" stop="20240101140000 +0000" channel="news.one">
    <title>Business Hour</title>
  </programme>
  <programme start="20240101120000 +0000" stop="20240101130000 +0000" channel="elsewhere">
    <title>Unmatched</title>
  </programme>
</tv>
"#;
