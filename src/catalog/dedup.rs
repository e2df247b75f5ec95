use std::collections::HashSet;
use tracing::info;

use crate::models::Channel;

/// Drop channels whose `(url, title)` pair was already seen, keeping the first
/// occurrence and the original order
pub fn deduplicate(channels: Vec<Channel>) -> Vec<Channel> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(channels.len());
        channels
            .iter()
            .map(|channel| seen.insert((channel.url.as_str(), channel.title.as_str())))
            .collect()
    };

    let before = channels.len();
    let unique: Vec<Channel> = channels
        .into_iter()
        .zip(keep)
        .filter_map(|(channel, keep)| keep.then_some(channel))
        .collect();

    let duplicate_count = before - unique.len();
    if duplicate_count > 0 {
        info!("Removed {} duplicate channel entries", duplicate_count);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn channel(title: &str, url: &str) -> Channel {
        Channel::new(title, url, "L")
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut first = channel("A", "http://x/1");
        first.group = "First".to_string();
        let mut second = channel("A", "http://x/1");
        second.group = "Second".to_string();

        let unique = deduplicate(vec![first, channel("B", "http://x/1"), second]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].group, "First");
        assert_eq!(unique[1].title, "B");
    }

    #[test]
    fn test_pipe_characters_do_not_collide() {
        let unique = deduplicate(vec![channel("b", "a|"), channel("|b", "a")]);
        assert_eq!(unique.len(), 2);
    }

    fn arb_channels() -> impl Strategy<Value = Vec<Channel>> {
        prop::collection::vec(("[ab]{0,2}", "[xy|]{0,2}"), 0..24).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(title, url)| channel(&title, &url))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_idempotent(channels in arb_channels()) {
            let once = deduplicate(channels);
            let twice = deduplicate(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_order_preserving_subsequence(channels in arb_channels()) {
            let unique = deduplicate(channels.clone());
            let mut remaining = channels.iter();
            for kept in &unique {
                prop_assert!(remaining.any(|c| c == kept));
            }

            let keys: HashSet<_> = unique.iter().map(|c| (&c.url, &c.title)).collect();
            prop_assert_eq!(keys.len(), unique.len());
            let all: HashSet<_> = channels.iter().map(|c| (&c.url, &c.title)).collect();
            prop_assert_eq!(all.len(), unique.len());
        }
    }
}
