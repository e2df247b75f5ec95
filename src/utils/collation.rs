//! Locale-style string ordering for channel and group names
//!
//! Approximates the root-locale collation user agents apply to `localeCompare`:
//! letters compare case-insensitively first ("apple" < "Banana") and lowercase
//! sorts before uppercase on an otherwise equal name. Digits compare
//! character by character, so "Channel 10" precedes "Channel 2".

use std::cmp::Ordering;

/// Compare two display names the way a user expects a sorted list to look
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    primary_compare(a, b)
        .then_with(|| case_compare(a, b))
        .then_with(|| a.cmp(b))
}

/// Sort key comparator for `(group, title)` pairs
pub fn compare_group_title(a: (&str, &str), b: (&str, &str)) -> Ordering {
    if a.0 == b.0 {
        locale_compare(a.1, b.1)
    } else {
        locale_compare(a.0, b.0)
    }
}

fn primary_compare(a: &str, b: &str) -> Ordering {
    a.chars().map(fold).cmp(b.chars().map(fold))
}

/// Lowercase before uppercase at the first case-only difference
fn case_compare(a: &str, b: &str) -> Ordering {
    for (l, r) in a.chars().zip(b.chars()) {
        if l != r && fold(l) == fold(r) {
            return match (l.is_lowercase(), r.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            };
        }
    }
    Ordering::Equal
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_primary() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("Zulu", "alpha"), Ordering::Greater);
    }

    #[test]
    fn test_lowercase_first_on_tie() {
        assert_eq!(locale_compare("news", "News"), Ordering::Less);
        assert_eq!(locale_compare("News", "news"), Ordering::Greater);
        assert_eq!(locale_compare("News", "News"), Ordering::Equal);
    }

    #[test]
    fn test_digits_compare_per_character() {
        assert_eq!(locale_compare("Channel 10", "Channel 2"), Ordering::Less);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(locale_compare("BBC", "BBC One"), Ordering::Less);
    }

    #[test]
    fn test_group_then_title() {
        assert_eq!(
            compare_group_title(("G", "B"), ("Ungrouped", "A")),
            Ordering::Less
        );
        assert_eq!(
            compare_group_title(("News", "b"), ("News", "A")),
            Ordering::Greater
        );
    }
}
