//! Tag Set Module
//!
//! Normalized tag labels attached to cache entries for grouped retrieval.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// == Tags ==
/// A deduplicated set of tag labels.
///
/// Anything tag-shaped converts into `Tags`: a single `&str`/`String` becomes
/// a one-element set, `None` becomes the empty set, and slices or vectors are
/// collected as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    /// Empty tag set.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if `self` and `other` share at least one tag.
    pub fn intersects(&self, other: &Tags) -> bool {
        // Iterate the smaller set.
        let (small, large) = if self.0.len() <= other.0.len() {
            (&self.0, &other.0)
        } else {
            (&other.0, &self.0)
        };
        small.iter().any(|tag| large.contains(tag))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for Tags {
    fn from(tag: &str) -> Self {
        Tags(BTreeSet::from([tag.to_string()]))
    }
}

impl From<String> for Tags {
    fn from(tag: String) -> Self {
        Tags(BTreeSet::from([tag]))
    }
}

impl From<Vec<String>> for Tags {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<Vec<&str>> for Tags {
    fn from(tags: Vec<&str>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<&[&str]> for Tags {
    fn from(tags: &[&str]) -> Self {
        tags.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for Tags {
    fn from(tags: [&str; N]) -> Self {
        tags.into_iter().collect()
    }
}

impl<T: Into<Tags>> From<Option<T>> for Tags {
    fn from(tags: Option<T>) -> Self {
        tags.map(Into::into).unwrap_or_default()
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Tags(iter.into_iter().map(Into::into).collect())
    }
}
