use anyhow::{Context, Result};
use dirscrape_model::{DetailRecord, ORG_NAME, ORG_URL};
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("record {index}: missing required field: {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index}: org_url is not an absolute http(s) address: {url}")]
    InvalidUrl { index: usize, url: String },

    #[error("record {index}: duplicate org_url {url} (first seen in record {first})")]
    DuplicateUrl {
        index: usize,
        first: usize,
        url: String,
    },

    #[error("record {index}: no fields besides org_name/org_url")]
    NoFields { index: usize },
}

/// Validate a saved JSON output file.
///
/// The file must be an array of flat string-to-string objects; anything else
/// is a hard error. Content problems are returned (and logged) as a list.
pub fn validate(file_path: &str) -> Result<Vec<ValidationError>> {
    let contents = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read {file_path}"))?;
    let records: Vec<DetailRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("{file_path} is not a JSON array of string-valued records"))?;

    let errors = validate_records(&records);
    if errors.is_empty() {
        tracing::info!(records = records.len(), "Output file is valid");
    } else {
        for e in &errors {
            tracing::warn!("{e}");
        }
    }
    Ok(errors)
}

/// Check every record for the injected origin fields and flag duplicates.
pub fn validate_records(records: &[DetailRecord]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen_urls: HashMap<&str, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        match record.org_name() {
            Some(name) if !name.trim().is_empty() => {}
            _ => errors.push(ValidationError::MissingField { index, field: ORG_NAME }),
        }

        match record.org_url() {
            Some(url) if !url.trim().is_empty() => {
                if !is_absolute_http(url) {
                    errors.push(ValidationError::InvalidUrl {
                        index,
                        url: url.to_string(),
                    });
                }
                if let Some(&first) = seen_urls.get(url) {
                    errors.push(ValidationError::DuplicateUrl {
                        index,
                        first,
                        url: url.to_string(),
                    });
                } else {
                    seen_urls.insert(url, index);
                }
            }
            _ => errors.push(ValidationError::MissingField { index, field: ORG_URL }),
        }

        if record.field_count() == 0 {
            errors.push(ValidationError::NoFields { index });
        }
    }

    errors
}

fn is_absolute_http(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}
