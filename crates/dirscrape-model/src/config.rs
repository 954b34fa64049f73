use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const EDINBURGH: &str = "https://www.edinburgh.gov.uk";

/// Browser-like identifying string sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// An exact-match element filter: tag name plus one attribute whose whole value must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub tag: String,
    pub attr: String,
    pub value: String,
}

impl Filter {
    pub fn new(tag: &str, attr: &str, value: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attr: attr.to_string(),
            value: value.to_string(),
        }
    }

    /// Shorthand for the common `class="..."` case.
    pub fn class(tag: &str, value: &str) -> Self {
        Self::new(tag, "class", value)
    }

    /// Render as a CSS attribute selector, e.g. `ul[class="list list--record"]`.
    pub fn css(&self) -> String {
        let escaped = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{}[{}=\"{}\"]", self.tag, self.attr, escaped)
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.css())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// What to do when the same organisation is listed under more than one partition key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Record every listing, duplicates included.
    #[default]
    Keep,
    /// Drop listings whose resolved detail address was already seen.
    DedupByUrl,
}

/// What to do when one index or detail step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log the failure, contribute zero records for that step, keep going.
    #[default]
    Skip,
    /// Stop the run on the first failure.
    Abort,
}

/// Everything a crawl run needs to know about its target site and its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Dataset label used in the output file name (e.g., "coe-library-spaces").
    pub label: String,
    /// Index address prefix; each partition key is appended verbatim.
    pub index_base: String,
    #[serde(default = "default_partition_keys")]
    pub partition_keys: Vec<String>,
    /// Base that listing links are resolved against.
    pub site_base: String,
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_listing_selector")]
    pub listing_selector: Filter,
    #[serde(default = "default_detail_selector")]
    pub detail_selector: Filter,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    #[serde(default)]
    pub on_error: FailurePolicy,
    /// Pause between consecutive requests, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
    /// Directory for raw copies of every fetched page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_html: Option<PathBuf>,
}

fn default_partition_keys() -> Vec<String> {
    ('A'..='Z').map(|c| c.to_string()).collect()
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("user-agent".to_string(), DEFAULT_USER_AGENT.to_string())])
}

fn default_listing_selector() -> Filter {
    Filter::class("ul", "list list--record")
}

fn default_detail_selector() -> Filter {
    Filter::class("dl", "list list--definition definition")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data/local-authorities")
}

impl CrawlConfig {
    /// A config with default keys, headers, selectors and output settings.
    pub fn new(label: &str, index_base: &str, site_base: &str) -> Self {
        Self {
            label: label.to_string(),
            index_base: index_base.to_string(),
            partition_keys: default_partition_keys(),
            site_base: site_base.to_string(),
            headers: default_headers(),
            listing_selector: default_listing_selector(),
            detail_selector: default_detail_selector(),
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
            duplicates: DuplicatePolicy::default(),
            on_error: FailurePolicy::default(),
            delay_ms: 0,
            cache_html: None,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CrawlConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label.trim().is_empty() {
            return Err(ConfigError::Invalid("label must not be empty".into()));
        }
        if self.partition_keys.is_empty() {
            return Err(ConfigError::Invalid("partition_keys must not be empty".into()));
        }
        for (field, value) in [("index_base", &self.index_base), ("site_base", &self.site_base)] {
            if !is_http_url(value) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be an absolute http(s) address, got '{value}'"
                )));
            }
        }
        for (field, filter) in [
            ("listing_selector", &self.listing_selector),
            ("detail_selector", &self.detail_selector),
        ] {
            if filter.tag.is_empty() || filter.attr.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{field} needs both a tag and an attribute"
                )));
            }
        }
        Ok(())
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

/// Built-in crawl targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// City of Edinburgh Council library locations and opening hours.
    LibrarySpaces,
    /// City of Edinburgh Council warm and welcoming locations.
    WarmSpaces,
}

impl Preset {
    pub fn config(self) -> CrawlConfig {
        let (label, directory) = match self {
            Preset::LibrarySpaces => ("coe-library-spaces", 10199),
            Preset::WarmSpaces => ("coe-warm-spaces", 10258),
        };
        CrawlConfig::new(
            label,
            &format!("{EDINBURGH}/directory/{directory}/a-to-z/"),
            EDINBURGH,
        )
    }
}
