use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("no element matching {selector} on {url}")]
    SelectorMiss { url: String, selector: String },

    #[error("invalid selector {selector}: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("definition list on {url} has {labels} labels but {values} values")]
    DefinitionMismatch {
        url: String,
        labels: usize,
        values: usize,
    },

    #[error("definition list on {url} cannot be paired: {detail}")]
    UnpairedDefinition { url: String, detail: String },

    #[error("definition list on {url} repeats label '{label}'")]
    DuplicateLabel { url: String, label: String },

    #[error("cannot resolve link '{link}' against {base}: {source}")]
    InvalidUrl {
        base: String,
        link: String,
        #[source]
        source: url::ParseError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Coarse classification the crawler's failure policy is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The page was fetched but the expected container is not on it.
    NotFound,
    /// The page could not be fetched (network failure or non-200 status).
    Transport,
    /// The page was fetched but its content cannot be turned into a record.
    Malformed,
    /// Local setup or filesystem failure; affects every step, not just one page.
    Local,
}

impl AcquireError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquireError::SelectorMiss { .. } => ErrorKind::NotFound,
            AcquireError::Transport { .. } | AcquireError::HttpStatus { .. } => ErrorKind::Transport,
            AcquireError::DefinitionMismatch { .. }
            | AcquireError::UnpairedDefinition { .. }
            | AcquireError::DuplicateLabel { .. }
            | AcquireError::InvalidUrl { .. } => ErrorKind::Malformed,
            AcquireError::Client(_)
            | AcquireError::InvalidHeader { .. }
            | AcquireError::InvalidSelector { .. }
            | AcquireError::Io { .. }
            | AcquireError::Json(_)
            | AcquireError::Csv(_) => ErrorKind::Local,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> AcquireError {
        let path = path.into();
        move |source| AcquireError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let miss = AcquireError::SelectorMiss {
            url: "https://example.org/A".into(),
            selector: "ul".into(),
        };
        assert_eq!(miss.kind(), ErrorKind::NotFound);

        let status = AcquireError::HttpStatus {
            url: "https://example.org/A".into(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(status.kind(), ErrorKind::Transport);
        assert_eq!(status.to_string(), "HTTP 500 Internal Server Error for https://example.org/A");

        let mismatch = AcquireError::DefinitionMismatch {
            url: "https://example.org/org/1".into(),
            labels: 2,
            values: 1,
        };
        assert_eq!(mismatch.kind(), ErrorKind::Malformed);

        let repeated = AcquireError::DuplicateLabel {
            url: "https://example.org/org/1".into(),
            label: "Phone".into(),
        };
        assert_eq!(repeated.kind(), ErrorKind::Malformed);
        assert_eq!(
            repeated.to_string(),
            "definition list on https://example.org/org/1 repeats label 'Phone'"
        );
    }
}
