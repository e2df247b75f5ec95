//! Extended (`#EXTINF`) playlist parser
//!
//! Permissive by design of the format: malformed lines are dropped or yield
//! defaulted fields, the parse itself never fails.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::models::{Channel, DEFAULT_GROUP, DEFAULT_TITLE, UNKNOWN_DURATION};

const EXTINF_PREFIX: &str = "#EXTINF:";
const EXTGRP_PREFIX: &str = "#EXTGRP:";
const EXTTVM_PREFIX: &str = "#EXTTVM:";

/// Parser state between lines: either waiting for an `#EXTINF` line or
/// holding the record it opened until a URL line closes it
enum ParseState {
    Idle,
    Accumulating(Channel),
}

fn parenthesized() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(.*?\)").expect("static pattern compiles"))
}

fn logo_attribute() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)tvg-logo=["'](.*?)["']"#).expect("static pattern compiles")
    })
}

/// Parse extended playlist text into channels sorted by group, then title
pub fn parse_playlist(content: &str, placeholder_logo: &str) -> Vec<Channel> {
    let mut channels = Vec::new();
    let mut state = ParseState::Idle;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with(EXTINF_PREFIX) {
            if let ParseState::Accumulating(dropped) = &state {
                debug!("Discarding channel '{}' without a stream URL", dropped.title);
            }
            state = ParseState::Accumulating(parse_extinf_line(line, placeholder_logo));
            continue;
        }

        if !line.starts_with('#') {
            if let ParseState::Accumulating(mut channel) =
                std::mem::replace(&mut state, ParseState::Idle)
            {
                channel.url = line.to_string();
                channels.push(channel);
            }
            continue;
        }

        match &mut state {
            ParseState::Accumulating(channel) if line.starts_with(EXTGRP_PREFIX) => {
                let group = tag_value(line);
                channel.group = if group.is_empty() {
                    DEFAULT_GROUP.to_string()
                } else {
                    group.to_string()
                };
            }
            ParseState::Accumulating(channel) if line.starts_with(EXTTVM_PREFIX) => {
                channel.id = tag_value(line).to_string();
            }
            _ => {}
        }
    }

    super::sort_by_group_and_title(&mut channels);
    debug!("Parsed {} channels from extended playlist", channels.len());
    channels
}

fn parse_extinf_line(line: &str, placeholder_logo: &str) -> Channel {
    let (head, title_part) = match line.split_once(',') {
        Some((head, rest)) => (head, rest),
        None => (line, ""),
    };

    let duration = head
        .split(':')
        .nth(1)
        .and_then(leading_integer)
        .filter(|d| *d != 0)
        .unwrap_or(UNKNOWN_DURATION);

    let stripped = parenthesized().replace_all(title_part.trim(), "");
    let title = match stripped.trim() {
        "" => DEFAULT_TITLE,
        t => t,
    };

    let logo = logo_attribute()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map_or(placeholder_logo, |m| m.as_str());

    let mut channel = Channel::new(title, String::new(), placeholder_logo);
    channel.duration = duration;
    channel.logo = logo.to_string();
    channel
}

/// Text between the first and second `:` of a tag line
fn tag_value(line: &str) -> &str {
    line.split(':').nth(1).unwrap_or_default().trim()
}

/// Integer prefix of `raw` after leading whitespace, e.g. `-1 tvg-id="x"` → -1
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(['-', '+']));
    let digits_len = raw[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    raw[..sign_len + digits_len].parse().ok()
}
