use crate::error::AcquireError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use std::collections::BTreeMap;

/// Anything that can turn an address into page text.
///
/// The crawler only talks to the network through this trait, so tests can
/// substitute canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, AcquireError>;
}

/// Live HTTP fetcher: one GET per call, a static header bag, no retries.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(headers: &BTreeMap<String, String>) -> Result<Self, AcquireError> {
        let client = reqwest::Client::builder()
            .default_headers(header_map(headers)?)
            .build()
            .map_err(AcquireError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AcquireError> {
        let transport = |source: reqwest::Error| AcquireError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AcquireError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(transport)
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, AcquireError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = |message: String| AcquireError::InvalidHeader {
            name: name.clone(),
            message,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
