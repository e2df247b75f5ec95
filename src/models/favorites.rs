use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of favorite channel URLs
///
/// Outlives any single catalog: a playlist replacement keeps it, only a full
/// reset clears it. Serializes as a plain JSON array of URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    urls: BTreeSet<String>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `url` if absent, remove it if present. Returns whether it is now a favorite.
    pub fn toggle(&mut self, url: &str) -> bool {
        if self.urls.remove(url) {
            false
        } else {
            self.urls.insert(url.to_string());
            true
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn clear(&mut self) {
        self.urls.clear();
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

impl FromIterator<String> for Favorites {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut favorites = Favorites::new();
        assert!(favorites.toggle("http://x/a"));
        assert!(favorites.contains("http://x/a"));
        assert!(!favorites.toggle("http://x/a"));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_serializes_as_array() {
        let favorites: Favorites = ["http://x/b".to_string(), "http://x/a".to_string()]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_string(&favorites).unwrap(),
            r#"["http://x/a","http://x/b"]"#
        );
        let back: Favorites = serde_json::from_str(r#"["http://x/a","http://x/a"]"#).unwrap();
        assert_eq!(back.len(), 1);
    }
}
