use serde::{Deserialize, Serialize};

pub mod epg_program;
pub mod favorites;

pub use epg_program::Program;
pub use favorites::Favorites;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_GROUP: &str = "Ungrouped";
/// Group assigned to every channel of a plain URL list
pub const IMPORTED_GROUP: &str = "Imported";
/// Name of the pseudo-group synthesized from the favorites set
pub const FAVORITES_GROUP: &str = "Favorites";

/// Playlist duration for live streams and unparseable values
pub const UNKNOWN_DURATION: i64 = -1;

/// Reachability classification written by the status prober
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    #[default]
    Unknown,
    Active,
    Offline,
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelStatus::Unknown => write!(f, "unknown"),
            ChannelStatus::Active => write!(f, "active"),
            ChannelStatus::Offline => write!(f, "offline"),
        }
    }
}

/// One streamable source
///
/// `url` is the identity used for favorites and playback selection;
/// `(url, title)` is the identity used for deduplication. The serialized
/// form uses camelCase keys so cached playlists stay readable by older
/// state files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub status: ChannelStatus,
    #[serde(default = "default_duration")]
    pub duration: i64,
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

fn default_duration() -> i64 {
    UNKNOWN_DURATION
}

impl Channel {
    /// A channel with every optional field at its default
    pub fn new(title: impl Into<String>, url: impl Into<String>, placeholder_logo: &str) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            id: String::new(),
            group: default_group(),
            logo: placeholder_logo.to_string(),
            programs: Vec::new(),
            status: ChannelStatus::Unknown,
            duration: UNKNOWN_DURATION,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Whether the URL is served over an adaptive (HLS) manifest
    pub fn is_adaptive(&self) -> bool {
        self.url.contains(".m3u8")
    }
}
