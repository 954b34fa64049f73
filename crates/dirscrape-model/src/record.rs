use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key under which the listing's display name is merged into a detail record.
pub const ORG_NAME: &str = "org_name";
/// Key under which the resolved detail-page address is merged into a detail record.
pub const ORG_URL: &str = "org_url";

/// One entry read from an index page: the anchor text and its (usually relative) href.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub name: String,
    pub relative_link: String,
}

impl ListingRecord {
    pub fn new(name: impl Into<String>, relative_link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relative_link: relative_link.into(),
        }
    }
}

/// One organisation's flattened label → value mapping.
///
/// Keys vary per source page. Insertion order is preserved so that output
/// files list fields the way the detail page presents them; re-inserting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailRecord(IndexMap<String, String>);

impl DetailRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from ordered label/value pairs. Later pairs win on duplicate labels.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.insert(k, v);
        }
        record
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Merge the listing's name and resolved address under `org_name` / `org_url`.
    pub fn with_origin(mut self, name: &str, url: &str) -> Self {
        self.insert(ORG_NAME, name);
        self.insert(ORG_URL, url);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn org_name(&self) -> Option<&str> {
        self.get(ORG_NAME)
    }

    pub fn org_url(&self) -> Option<&str> {
        self.get(ORG_URL)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields read from the page itself, excluding the merged origin keys.
    pub fn field_count(&self) -> usize {
        self.keys().filter(|k| *k != ORG_NAME && *k != ORG_URL).count()
    }
}
