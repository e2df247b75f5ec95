//! Search and status filtering over the catalog
//!
//! Produces the grouped view the presentation layer renders: text search on
//! title or group, an optional status filter, partitioning by group and the
//! synthesized Favorites group.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::catalog::Catalog;
use crate::models::{Channel, ChannelStatus, FAVORITES_GROUP, Favorites};

pub const NO_CHANNELS_MESSAGE: &str = "No channels available. Please upload a playlist.";
pub const NO_MATCHES_MESSAGE: &str = "No channels match your search or filter.";

/// Status filter values. `Total` matches everything but is still a set filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Total,
    Active,
    Offline,
    Unknown,
}

impl StatusFilter {
    pub fn matches(self, status: ChannelStatus) -> bool {
        match self {
            Self::Total => true,
            Self::Active => status == ChannelStatus::Active,
            Self::Offline => status == ChannelStatus::Offline,
            Self::Unknown => status == ChannelStatus::Unknown,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "total" => Some(Self::Total),
            "active" => Some(Self::Active),
            "offline" => Some(Self::Offline),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Total => "total",
            Self::Active => "active",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Current search text and status filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub status: Option<StatusFilter>,
}

impl FilterState {
    pub fn new(query: impl Into<String>, status: Option<StatusFilter>) -> Self {
        Self {
            query: query.into(),
            status,
        }
    }

    /// Select `filter`, or clear it when it is already selected
    pub fn toggle_status(&mut self, filter: StatusFilter) {
        self.status = if self.status == Some(filter) {
            None
        } else {
            Some(filter)
        };
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGroup<'a> {
    pub name: String,
    pub channels: Vec<&'a Channel>,
}

/// Renderable result of a filter pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogView<'a> {
    /// The catalog itself is empty
    NoChannelsLoaded,
    /// Channels exist but none survive the filter
    NoMatches,
    Groups(Vec<ChannelGroup<'a>>),
}

impl CatalogView<'_> {
    /// User-facing text for the two empty states
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::NoChannelsLoaded => Some(NO_CHANNELS_MESSAGE),
            Self::NoMatches => Some(NO_MATCHES_MESSAGE),
            Self::Groups(_) => None,
        }
    }

    pub fn groups(&self) -> &[ChannelGroup<'_>] {
        match self {
            Self::Groups(groups) => groups,
            _ => &[],
        }
    }

    pub fn group(&self, name: &str) -> Option<&ChannelGroup<'_>> {
        self.groups().iter().find(|g| g.name == name)
    }
}

pub struct FilterEngine;

impl FilterEngine {
    /// Filter, partition and order the catalog for display
    ///
    /// Groups come out in lexical name order with Favorites sorted among
    /// them. Favorite channels also stay in their own group.
    pub fn apply<'a>(
        catalog: &'a Catalog,
        favorites: &Favorites,
        state: &FilterState,
    ) -> CatalogView<'a> {
        if catalog.is_empty() {
            return CatalogView::NoChannelsLoaded;
        }

        let needle = state.query.to_lowercase();
        let filtered: Vec<&Channel> = catalog
            .channels()
            .iter()
            .filter(|c| matches_query(c, &needle))
            .filter(|c| state.status.is_none_or(|s| s.matches(c.status)))
            .collect();

        if filtered.is_empty() {
            debug!(
                "No channels match query '{}' with status filter {:?}",
                state.query, state.status
            );
            return CatalogView::NoMatches;
        }

        let mut grouped: BTreeMap<&str, Vec<&Channel>> = BTreeMap::new();
        for channel in &filtered {
            grouped.entry(channel.group.as_str()).or_default().push(channel);
        }

        let favorite_channels = filtered.iter().filter(|c| favorites.contains(&c.url));
        for channel in favorite_channels {
            let members = grouped.entry(FAVORITES_GROUP).or_default();
            if !members.iter().any(|m| std::ptr::eq(*m, *channel)) {
                members.push(channel);
            }
        }

        CatalogView::Groups(
            grouped
                .into_iter()
                .map(|(name, channels)| ChannelGroup {
                    name: name.to_string(),
                    channels,
                })
                .collect(),
        )
    }
}

fn matches_query(channel: &Channel, needle: &str) -> bool {
    needle.is_empty()
        || channel.title.to_lowercase().contains(needle)
        || channel.group.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        let mut channels = vec![
            Channel::new("BBC News", "http://x/bbc", "L").with_group("News"),
            Channel::new("Sky Sports", "http://x/sky", "L").with_group("Sport"),
            Channel::new("Cartoons", "http://x/toons", "L").with_group("Kids"),
            Channel::new("Eurosport", "http://x/euro", "L").with_group("Sport"),
        ];
        channels[0].status = ChannelStatus::Active;
        channels[1].status = ChannelStatus::Offline;
        channels[3].status = ChannelStatus::Active;
        catalog.replace(channels);
        catalog
    }

    fn names(view: &CatalogView<'_>) -> Vec<String> {
        view.groups().iter().map(|g| g.name.clone()).collect()
    }

    fn titles(view: &CatalogView<'_>) -> Vec<String> {
        let mut titles: Vec<String> = view
            .groups()
            .iter()
            .flat_map(|g| g.channels.iter().map(|c| c.title.clone()))
            .collect();
        titles.sort();
        titles
    }

    #[test]
    fn test_empty_catalog_and_no_matches_are_distinct() {
        let empty = Catalog::new();
        let view = FilterEngine::apply(&empty, &Favorites::new(), &FilterState::default());
        assert_eq!(view, CatalogView::NoChannelsLoaded);
        assert_eq!(view.message(), Some(NO_CHANNELS_MESSAGE));

        let catalog = catalog();
        let view = FilterEngine::apply(
            &catalog,
            &Favorites::new(),
            &FilterState::new("nothing like this", None),
        );
        assert_eq!(view, CatalogView::NoMatches);
        assert_eq!(view.message(), Some(NO_MATCHES_MESSAGE));
    }

    #[test]
    fn test_query_matches_title_or_group_case_insensitively() {
        let catalog = catalog();
        let view = FilterEngine::apply(&catalog, &Favorites::new(), &FilterState::new("SPORT", None));
        assert_eq!(names(&view), vec!["Sport"]);
        assert_eq!(titles(&view), vec!["Eurosport", "Sky Sports"]);

        let view = FilterEngine::apply(&catalog, &Favorites::new(), &FilterState::new("kid", None));
        assert_eq!(titles(&view), vec!["Cartoons"]);
    }

    #[test]
    fn test_status_filter() {
        let catalog = catalog();
        let favorites = Favorites::new();

        let active = FilterEngine::apply(&catalog, &favorites, &FilterState::new("", Some(StatusFilter::Active)));
        assert_eq!(titles(&active), vec!["BBC News", "Eurosport"]);

        let offline = FilterEngine::apply(&catalog, &favorites, &FilterState::new("", Some(StatusFilter::Offline)));
        assert_eq!(titles(&offline), vec!["Sky Sports"]);

        let total = FilterEngine::apply(&catalog, &favorites, &FilterState::new("", Some(StatusFilter::Total)));
        let unfiltered = FilterEngine::apply(&catalog, &favorites, &FilterState::default());
        assert_eq!(total, unfiltered);
    }

    #[test]
    fn test_toggle_twice_clears_and_switching_needs_no_clear() {
        let mut state = FilterState::default();
        state.toggle_status(StatusFilter::Active);
        assert_eq!(state.status, Some(StatusFilter::Active));
        state.toggle_status(StatusFilter::Offline);
        assert_eq!(state.status, Some(StatusFilter::Offline));
        state.toggle_status(StatusFilter::Offline);
        assert_eq!(state.status, None);

        let catalog = catalog();
        let favorites = Favorites::new();
        let mut toggled = FilterState::default();
        toggled.toggle_status(StatusFilter::Total);
        assert_eq!(toggled.status, Some(StatusFilter::Total));
        toggled.toggle_status(StatusFilter::Total);
        assert_eq!(
            FilterEngine::apply(&catalog, &favorites, &toggled),
            FilterEngine::apply(&catalog, &favorites, &FilterState::default())
        );
    }

    #[test]
    fn test_favorites_group_is_sorted_in_and_non_exclusive() {
        let catalog = catalog();
        let mut favorites = Favorites::new();
        favorites.toggle("http://x/sky");

        let view = FilterEngine::apply(&catalog, &favorites, &FilterState::default());
        assert_eq!(names(&view), vec!["Favorites", "Kids", "News", "Sport"]);
        let fav = view.group(FAVORITES_GROUP).unwrap();
        assert_eq!(fav.channels.len(), 1);
        assert_eq!(fav.channels[0].title, "Sky Sports");
        assert_eq!(view.group("Sport").unwrap().channels.len(), 2);
    }

    #[test]
    fn test_favorites_group_only_from_filtered_channels() {
        let catalog = catalog();
        let mut favorites = Favorites::new();
        favorites.toggle("http://x/sky");

        let view = FilterEngine::apply(&catalog, &favorites, &FilterState::new("news", None));
        assert_eq!(names(&view), vec!["News"]);
    }

    #[test]
    fn test_group_names_sort_lexically() {
        let mut catalog = Catalog::new();
        catalog.replace(vec![
            Channel::new("a", "u1", "L").with_group("apple"),
            Channel::new("b", "u2", "L").with_group("Zebra"),
        ]);
        let view = FilterEngine::apply(&catalog, &Favorites::new(), &FilterState::default());
        assert_eq!(names(&view), vec!["Zebra", "apple"]);
    }

    #[test]
    fn test_status_filter_names() {
        assert_eq!(StatusFilter::from_name("Active"), Some(StatusFilter::Active));
        assert_eq!(StatusFilter::from_name("bogus"), None);
        assert_eq!(StatusFilter::Offline.to_string(), "offline");
    }
}
