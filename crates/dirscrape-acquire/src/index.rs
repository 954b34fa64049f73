use dirscrape_model::CrawlConfig;

/// One index page to visit: the partition key and the address built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPage {
    pub key: String,
    pub url: String,
}

/// Fixed, ordered set of index addresses: `base + key` for every partition key.
///
/// The key set is an assumption about the target site's directory layout; it
/// is not checked against what the site actually lists. Keys are appended
/// verbatim, without URL-encoding.
#[derive(Debug, Clone)]
pub struct IndexEnumerator {
    base: String,
    keys: Vec<String>,
}

impl IndexEnumerator {
    pub fn new(base: impl Into<String>, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            base: base.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Uppercase ASCII letters `A`..=`Z`.
    pub fn alphabetical(base: impl Into<String>) -> Self {
        Self::new(base, ('A'..='Z').map(String::from))
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(config.index_base.clone(), config.partition_keys.iter().cloned())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Lazily yield every index page. Each call starts again from the first key.
    pub fn iter(&self) -> impl Iterator<Item = IndexPage> + '_ {
        self.keys.iter().map(move |key| IndexPage {
            key: key.clone(),
            url: format!("{}{}", self.base, key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirscrape_model::Preset;

    #[test]
    fn test_alphabetical_addresses() {
        let index = IndexEnumerator::alphabetical("https://example.org/a-to-z/");
        let pages: Vec<IndexPage> = index.iter().collect();
        assert_eq!(pages.len(), 26);
        assert_eq!(pages[0].url, "https://example.org/a-to-z/A");
        assert_eq!(pages[25].key, "Z");
        assert_eq!(pages[25].url, "https://example.org/a-to-z/Z");
    }

    #[test]
    fn test_iter_is_restartable() {
        let index = IndexEnumerator::new("https://example.org/", ["x", "y"]);
        let first: Vec<IndexPage> = index.iter().collect();
        let second: Vec<IndexPage> = index.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_keys_are_not_encoded() {
        let index = IndexEnumerator::new("https://example.org/az/", ["Ä"]);
        assert_eq!(index.iter().next().unwrap().url, "https://example.org/az/Ä");
    }

    #[test]
    fn test_from_config() {
        let config = Preset::WarmSpaces.config();
        let index = IndexEnumerator::from_config(&config);
        assert_eq!(index.len(), 26);
        assert_eq!(
            index.iter().nth(1).unwrap().url,
            "https://www.edinburgh.gov.uk/directory/10258/a-to-z/B"
        );
    }
}
