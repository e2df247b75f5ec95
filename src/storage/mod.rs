//! Persisted application state
//!
//! The catalog defines what gets persisted but not how: all state goes
//! through the [`KeyValueStore`] trait as JSON strings under fixed keys.
//! [`JsonFileStore`] keeps them in one JSON object on disk; [`MemoryStore`]
//! keeps them in memory.

pub mod history;
pub mod persisted;

pub use history::UploadHistory;
pub use persisted::{LastPlaylist, LastPlaylistKind, UploadedPlaylists, load_json, save_json};

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::StorageResult;

pub const FAVORITES_KEY: &str = "favorites";
pub const UPLOAD_HISTORY_KEY: &str = "uploadHistory";
pub const UPLOADED_PLAYLISTS_KEY: &str = "uploadedPlaylists";
pub const LAST_PLAYLIST_KEY: &str = "lastPlaylist";

/// Opaque string key/value store
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> StorageResult<()>;
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> StorageResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file, rewritten on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            info!("No state file at {}, starting empty", path.display());
            BTreeMap::new()
        };
        debug!("Opened state store {} with {} keys", path.display(), values.len());
        Ok(Self { path, values })
    }

    /// Open the store at `path`, moving an unreadable file aside as
    /// `<name>.corrupt` and starting empty instead of failing
    pub fn open_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => store,
            Err(e) => {
                warn!("State file {} is unreadable, starting empty: {}", path.display(), e);
                let aside = path.with_extension("json.corrupt");
                if let Err(e) = std::fs::rename(path, &aside) {
                    warn!("Failed to move {} aside: {}", path.display(), e);
                } else {
                    info!("Kept unreadable state as {}", aside.display());
                }
                Self {
                    path: path.to_path_buf(),
                    values: BTreeMap::new(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> StorageResult<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
