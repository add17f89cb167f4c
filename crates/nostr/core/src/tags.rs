//! Read-only lookups over an event's ordered tag list.
//!
//! Tags are addressed three ways: by position (for `#[n]` backreferences), by
//! marker (element 0, e.g. `p`, `e`, `a`), and by referenced value (element 1).
//! None of these lookups fail; absent entries are `None` or empty.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Marker for user (public key) references.
pub const USER_MARKER: &str = "p";
/// Marker for event references.
pub const EVENT_MARKER: &str = "e";
/// Marker for addressable-object references.
pub const ADDRESS_MARKER: &str = "a";

/// A view over a tag list keyed by position, marker and referenced value.
///
/// The marker index is built on first marker lookup and reused afterwards.
#[derive(Debug)]
pub struct TagIndex<'a> {
    tags: &'a [Vec<String>],
    by_marker: OnceLock<HashMap<&'a str, Vec<usize>>>,
}

impl<'a> TagIndex<'a> {
    pub fn new(tags: &'a [Vec<String>]) -> Self {
        Self {
            tags,
            by_marker: OnceLock::new(),
        }
    }

    /// Number of tags in the view.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tag at `index`, if any.
    pub fn tag_at(&self, index: usize) -> Option<&'a [String]> {
        self.tags.get(index).map(Vec::as_slice)
    }

    /// All tags whose first element equals `marker`, in tag order.
    pub fn tags_where(&self, marker: &str) -> Vec<&'a [String]> {
        let tags = self.tags;
        self.marker_positions(marker)
            .iter()
            .map(|&i| tags[i].as_slice())
            .collect()
    }

    /// Element 1 of every `marker` tag that has one, in tag order.
    pub fn values_where(&self, marker: &str) -> Vec<&'a str> {
        self.tags_where(marker)
            .into_iter()
            .filter_map(|tag| tag.get(1).map(String::as_str))
            .collect()
    }

    /// First tag with at least two elements whose element 1 equals `value`.
    pub fn tag_referencing(&self, value: &str) -> Option<&'a [String]> {
        self.tags
            .iter()
            .find(|tag| tag.len() > 1 && tag[1] == value)
            .map(Vec::as_slice)
    }

    fn marker_positions(&self, marker: &str) -> &[usize] {
        let tags: &'a [Vec<String>] = self.tags;
        let index = self.by_marker.get_or_init(|| {
            let mut map: HashMap<&'a str, Vec<usize>> = HashMap::new();
            for (i, tag) in tags.iter().enumerate() {
                if let Some(first) = tag.first() {
                    map.entry(first.as_str()).or_default().push(i);
                }
            }
            map
        });
        index.get(marker).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Marker of a tag, if it has one.
pub fn marker(tag: &[String]) -> Option<&str> {
    tag.first().map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|t| t.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_tag_at() {
        let tags = tags(&[&["p", "u1"], &["e", "e1", "wss://r"]]);
        let index = TagIndex::new(&tags);

        assert_eq!(index.tag_at(0).unwrap()[1], "u1");
        assert_eq!(index.tag_at(1).unwrap().len(), 3);
        assert!(index.tag_at(2).is_none());
    }

    #[test]
    fn test_tags_where_keeps_order() {
        let tags = tags(&[&["e", "e1"], &["p", "u1"], &["e", "e2"], &["e"]]);
        let index = TagIndex::new(&tags);

        let events = index.tags_where(EVENT_MARKER);
        assert_eq!(events.len(), 3);
        assert_eq!(index.values_where(EVENT_MARKER), vec!["e1", "e2"]);
        assert!(index.tags_where("t").is_empty());
    }

    #[test]
    fn test_tag_referencing_first_match() {
        let tags = tags(&[&["e", "same"], &["p", "same"], &["p"]]);
        let index = TagIndex::new(&tags);

        let found = index.tag_referencing("same").unwrap();
        assert_eq!(marker(found), Some("e"));
        assert!(index.tag_referencing("missing").is_none());
    }

    #[test]
    fn test_empty_tags() {
        let tags: Vec<Vec<String>> = vec![vec![]];
        let index = TagIndex::new(&tags);

        assert_eq!(index.len(), 1);
        assert!(index.tags_where(USER_MARKER).is_empty());
        assert!(index.tag_referencing("").is_none());
        assert_eq!(marker(index.tag_at(0).unwrap()), None);
    }
}
