//! Structured (JSON array) playlist parser

use serde_json::Value;
use tracing::debug;

use crate::errors::{SourceError, SourceResult};
use crate::models::{Channel, DEFAULT_GROUP, DEFAULT_TITLE};

const FORMAT: &str = "json";

/// Parse a JSON array of flat records into channels sorted by group, then title
///
/// Keys are mapped permissively: `name`/`title`, `url`/`stream`,
/// `group`/`category`, `id` and `logo`. A key only counts when it holds a
/// non-empty string; otherwise the next alias or the default applies.
pub fn parse_playlist(content: &str, placeholder_logo: &str) -> SourceResult<Vec<Channel>> {
    let parsed: Value = serde_json::from_str(content)
        .map_err(|e| SourceError::format(FORMAT, format!("Invalid JSON: {e}")))?;

    let records = parsed
        .as_array()
        .ok_or_else(|| SourceError::format(FORMAT, "Expected an array of channel records"))?;

    let mut channels: Vec<Channel> = records
        .iter()
        .map(|record| {
            let title = first_present(record, &["name", "title"]).unwrap_or(DEFAULT_TITLE);
            let url = first_present(record, &["url", "stream"]).unwrap_or_default();
            let group = first_present(record, &["group", "category"]).unwrap_or(DEFAULT_GROUP);

            let mut channel = Channel::new(title, url, placeholder_logo).with_group(group);
            if let Some(id) = first_present(record, &["id"]) {
                channel.id = id.to_string();
            }
            if let Some(logo) = first_present(record, &["logo"]) {
                channel.logo = logo.to_string();
            }
            channel
        })
        .collect();

    super::sort_by_group_and_title(&mut channels);
    debug!("Parsed {} channels from structured playlist", channels.len());
    Ok(channels)
}

fn first_present<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| record.get(key).and_then(Value::as_str))
        .find(|value| !value.is_empty())
}
