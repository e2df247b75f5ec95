use chrono::{DateTime, Local};
use serde::Serialize;

const ENTRY_SEPARATOR: &str = " - ";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Recently loaded playlists, newest first
///
/// Items are display strings of the form `"<local time> - <entry>"`, where
/// the entry is a URL or an uploaded file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UploadHistory {
    items: Vec<String>,
    #[serde(skip)]
    limit: usize,
}

impl UploadHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit,
        }
    }

    /// Rebuild from persisted items, trimming to `limit`
    pub fn from_items(mut items: Vec<String>, limit: usize) -> Self {
        items.truncate(limit);
        Self { items, limit }
    }

    /// Record `entry` at the front unless some item already mentions it
    ///
    /// Returns whether the history changed.
    pub fn record(&mut self, entry: &str, at: DateTime<Local>) -> bool {
        if self.items.iter().any(|item| item.contains(entry)) {
            return false;
        }
        let item = format!("{}{}{}", at.format(TIMESTAMP_FORMAT), ENTRY_SEPARATOR, entry);
        self.items.insert(0, item);
        self.items.truncate(self.limit);
        true
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// The entry part of each item, in history order
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| Self::entry_of(item))
    }

    /// Split an item back into its entry; items without a timestamp are taken whole
    pub fn entry_of(item: &str) -> &str {
        item.split_once(ENTRY_SEPARATOR)
            .map_or(item, |(_, entry)| entry)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
