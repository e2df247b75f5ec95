//! Playlist and guide source parsers
//!
//! Each playlist format has its own pure parser. [`PlaylistFormat`] is
//! resolved once from a file name or URL and then dispatches to exactly one
//! of them.

pub mod json;
pub mod m3u;
pub mod plain;
pub mod xmltv_epg;

use std::fmt;

use crate::errors::{SourceError, SourceResult};
use crate::models::Channel;
use crate::utils::url::UrlUtils;

/// The three supported playlist encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaylistFormat {
    /// `#EXTINF` tagged line format (`.m3u`, `.m3u8`)
    Extended,
    /// JSON array of flat records (`.json`)
    Structured,
    /// One URL per line (`.txt`)
    Plain,
}

impl PlaylistFormat {
    /// Resolve the format from a file name or URL suffix
    ///
    /// Matching is case-insensitive and, for URLs, only looks at the path so
    /// query strings never change the outcome.
    ///
    /// ```rust
    /// use iptv_catalog::sources::PlaylistFormat;
    ///
    /// assert_eq!(
    ///     PlaylistFormat::from_name("https://example.com/tv.m3u?user=a").unwrap(),
    ///     PlaylistFormat::Extended
    /// );
    /// assert_eq!(PlaylistFormat::from_name("LIST.TXT").unwrap(), PlaylistFormat::Plain);
    /// assert!(PlaylistFormat::from_name("guide.xml").is_err());
    /// ```
    pub fn from_name(name: &str) -> SourceResult<Self> {
        let path = UrlUtils::suffix_source(name).to_lowercase();
        if path.ends_with(".m3u") || path.ends_with(".m3u8") {
            Ok(Self::Extended)
        } else if path.ends_with(".json") {
            Ok(Self::Structured)
        } else if path.ends_with(".txt") {
            Ok(Self::Plain)
        } else {
            Err(SourceError::unsupported_format(UrlUtils::obfuscate_credentials(name)))
        }
    }

    /// Parse `text` with this format's parser
    pub fn parse(self, text: &str, placeholder_logo: &str) -> SourceResult<Vec<Channel>> {
        match self {
            Self::Extended => Ok(m3u::parse_playlist(text, placeholder_logo)),
            Self::Structured => json::parse_playlist(text, placeholder_logo),
            Self::Plain => Ok(plain::parse_playlist(text, placeholder_logo)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Extended => "m3u",
            Self::Structured => "json",
            Self::Plain => "txt",
        }
    }
}

impl fmt::Display for PlaylistFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sort channels by group, then title, with locale-style comparison
pub(crate) fn sort_by_group_and_title(channels: &mut [Channel]) {
    channels.sort_by(|a, b| {
        crate::utils::compare_group_title((&a.group, &a.title), (&b.group, &b.title))
    });
}
