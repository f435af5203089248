//! HTTP remote client.
//!
//! Wraps reqwest with:
//! - endpoint templates filled with one id or a comma-joined batch
//! - the API credential as a query parameter
//! - status mapping (404 = no data, 429 = rate limited, other non-2xx = failure)

use super::traits::{Collection, FetchMode, RemoteClient};
use crate::config::NetworkConfig;
use crate::error::{IreliaError, Result};
use crate::store::Payload;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Remote client backed by a reqwest [`Client`].
pub struct HttpRemote {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpRemote {
    /// Create a client for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, NetworkConfig::REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| IreliaError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout,
        })
    }

    /// Send `key` as the credential query parameter on every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL (without credential) for fetching `ids` from `collection`.
    pub fn url_for(&self, collection: &Collection, ids: &[String]) -> String {
        format!("{}{}", self.base_url, collection.endpoint().path_for(ids))
    }
}

#[async_trait]
impl RemoteClient for HttpRemote {
    async fn fetch(
        &self,
        collection: &Collection,
        ids: &[String],
    ) -> Result<HashMap<String, Payload>> {
        if collection.mode() == FetchMode::Single && ids.len() != 1 {
            return Err(IreliaError::Other(format!(
                "Collection '{}' fetches one id per request, got {}",
                collection.name(),
                ids.len()
            )));
        }

        let url = self.url_for(collection, ids);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.query(&[(NetworkConfig::API_KEY_PARAM, key.as_str())]);
        }

        debug!("GET {}", url);
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                IreliaError::Timeout(self.timeout)
            } else {
                // reqwest reports the full request URL, credential included
                let e = e.without_url();
                IreliaError::Network {
                    message: format!("GET {} failed: {}", url, e),
                    source: Some(e),
                }
            }
        })?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("No data at {}", url);
            return Ok(HashMap::new());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            warn!("Remote rate limit hit for {} (retry after {:?}s)", url, retry_after);
            return Err(IreliaError::RateLimited {
                service: extract_domain(&url),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(IreliaError::FetchFailed {
                message: format!("GET {} returned {}", url, status),
                status: Some(status.as_u16()),
            });
        }

        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            IreliaError::Network {
                message: format!("Failed to read body from {}: {}", url, e),
                source: Some(e),
            }
        })?;

        decode_payloads(collection.mode(), ids, &body)
    }
}

/// Turn a response body into an id → payload map.
///
/// Batch responses are objects keyed by id; a single response is the payload
/// of the one requested id.
pub fn decode_payloads(
    mode: FetchMode,
    ids: &[String],
    body: &str,
) -> Result<HashMap<String, Payload>> {
    let value: Payload = serde_json::from_str(body)?;

    match mode {
        FetchMode::Batch => match value {
            Payload::Object(map) => Ok(map.into_iter().collect()),
            other => Err(IreliaError::FetchFailed {
                message: format!("Expected an object keyed by id, got {}", json_type(&other)),
                status: None,
            }),
        },
        FetchMode::Single => match ids {
            [id] => Ok(HashMap::from([(id.clone(), value)])),
            _ => Err(IreliaError::FetchFailed {
                message: format!("Single-item response for {} ids", ids.len()),
                status: None,
            }),
        },
    }
}

fn json_type(value: &Payload) -> &'static str {
    match value {
        Payload::Null => "null",
        Payload::Bool(_) => "a boolean",
        Payload::Number(_) => "a number",
        Payload::String(_) => "a string",
        Payload::Array(_) => "an array",
        Payload::Object(_) => "an object",
    }
}

/// Extract domain from a URL.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
