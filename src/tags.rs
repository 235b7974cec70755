//! Tag mappings and the project filter predicate.
//!
//! Scaleway stores tags as flat strings. `shotty` reads `key=value` labels as
//! key-value pairs so that a project filter can be expressed as a simple
//! equality check on one key, independent of the provider's filter syntax.

use std::collections::BTreeMap;
use std::fmt;

/// Separator between key and value inside a provider label.
pub const TAG_SEPARATOR: char = '=';

/// Unordered key-value tags attached to an instance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// Builds a tag mapping from provider labels.
    ///
    /// A label without a separator becomes a key with an empty value. When a
    /// key repeats, the last label wins.
    #[must_use]
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pairs = labels.into_iter().map(|label| {
            let raw = label.as_ref();
            raw.split_once(TAG_SEPARATOR).map_or_else(
                || (raw.trim().to_owned(), String::new()),
                |(key, value)| (key.trim().to_owned(), value.trim().to_owned()),
            )
        });
        Self(pairs.collect())
    }

    /// Inserts or replaces a tag.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Renders the tags back into provider labels.
    #[must_use]
    pub fn to_labels(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(key, value)| format!("{key}{TAG_SEPARATOR}{value}"))
            .collect()
    }

    /// Returns `true` when no tags are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Equality predicate on a single tag key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TagFilter {
    /// Tag key compared against.
    pub key: String,
    /// Value the tag must equal.
    pub value: String,
}

impl TagFilter {
    /// Creates a filter, trimming both sides.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into().trim().to_owned(),
            value: value.into().trim().to_owned(),
        }
    }

    /// Returns `true` when `tags` carries this key with exactly this value.
    #[must_use]
    pub fn matches(&self, tags: &Tags) -> bool {
        tags.get(&self.key) == Some(self.value.as_str())
    }

    /// Renders the filter as a provider label (`key=value`).
    #[must_use]
    pub fn as_label(&self) -> String {
        format!("{}{TAG_SEPARATOR}{}", self.key, self.value)
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag {}={}", self.key, self.value)
    }
}
