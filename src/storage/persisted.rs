use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::KeyValueStore;
use crate::errors::StorageResult;
use crate::models::Channel;

/// Where the most recent playlist came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastPlaylistKind {
    Url,
    File,
}

/// `{"type": "url" | "file", "value": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastPlaylist {
    #[serde(rename = "type")]
    pub kind: LastPlaylistKind,
    pub value: String,
}

impl LastPlaylist {
    pub fn url(value: impl Into<String>) -> Self {
        Self {
            kind: LastPlaylistKind::Url,
            value: value.into(),
        }
    }

    pub fn file(value: impl Into<String>) -> Self {
        Self {
            kind: LastPlaylistKind::File,
            value: value.into(),
        }
    }
}

/// Channel lists of uploaded files, keyed by the history entry (file name)
pub type UploadedPlaylists = BTreeMap<String, Vec<Channel>>;

/// Read and decode the JSON value stored under `key`
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> StorageResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`
pub fn save_json<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    store.set(key, serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelStatus, Program};
    use crate::storage::{LAST_PLAYLIST_KEY, MemoryStore, UPLOADED_PLAYLISTS_KEY};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_last_playlist_wire_shape() {
        let json = serde_json::to_string(&LastPlaylist::url("http://x/a.m3u")).unwrap();
        assert_eq!(json, r#"{"type":"url","value":"http://x/a.m3u"}"#);

        let back: LastPlaylist = serde_json::from_str(r#"{"type":"file","value":"tv.json"}"#).unwrap();
        assert_eq!(back, LastPlaylist::file("tv.json"));
    }

    #[test]
    fn test_uploaded_playlists_round_trip() {
        let mut playing = Channel::new("A", "http://x/a", "L")
            .with_group("News")
            .with_id("a.tv");
        playing.status = ChannelStatus::Active;
        playing.duration = 3600;
        playing.programs.push(Program {
            channel: "a.tv".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap(),
            title: "Bulletin".to_string(),
            description: "No description".to_string(),
            category: "News".to_string(),
        });
        let channels = vec![playing, Channel::new("B", "http://x/b", "L")];

        let mut playlists = UploadedPlaylists::new();
        playlists.insert("tv.m3u".to_string(), channels.clone());

        let mut store = MemoryStore::new();
        save_json(&mut store, UPLOADED_PLAYLISTS_KEY, &playlists).unwrap();
        let loaded: UploadedPlaylists = load_json(&store, UPLOADED_PLAYLISTS_KEY).unwrap().unwrap();
        assert_eq!(loaded["tv.m3u"], channels);
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        let loaded: Option<LastPlaylist> = load_json(&store, LAST_PLAYLIST_KEY).unwrap();
        assert!(loaded.is_none());
    }
}
