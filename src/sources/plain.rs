//! Plain URL list parser

use tracing::debug;

use crate::models::{Channel, IMPORTED_GROUP};

/// One channel per non-blank line, titled "Channel N" in input order
pub fn parse_playlist(content: &str, placeholder_logo: &str) -> Vec<Channel> {
    let channels: Vec<Channel> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, url)| {
            Channel::new(format!("Channel {}", index + 1), url, placeholder_logo)
                .with_group(IMPORTED_GROUP)
        })
        .collect();

    debug!("Parsed {} channels from plain list", channels.len());
    channels
}
