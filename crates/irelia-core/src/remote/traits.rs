//! Remote client trait and collection descriptors.

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::store::Payload;
use async_trait::async_trait;
use std::collections::HashMap;

/// URL path around a variable identifier segment, e.g.
/// `/v2.2/matchlist/by-summoner/{ids}` is prefix `/v2.2/matchlist/by-summoner/`
/// and an empty suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    prefix: String,
    suffix: String,
}

impl EndpointTemplate {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Fill the variable segment with one id or a comma-joined list.
    pub fn path_for(&self, ids: &[String]) -> String {
        let segment = ids
            .iter()
            .map(|id| urlencoding::encode(id).into_owned())
            .collect::<Vec<_>>()
            .join(NetworkConfig::BATCH_SEPARATOR);
        format!("{}{}{}", self.prefix, segment, self.suffix)
    }
}

/// Whether an endpoint accepts several identifiers per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Comma-joined ids; the response maps each id to its payload.
    Batch,
    /// One id per request; the response is the payload itself.
    Single,
}

/// A named group of cached entries and the endpoint that fills it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: String,
    endpoint: EndpointTemplate,
    mode: FetchMode,
}

impl Collection {
    pub fn new(name: impl Into<String>, endpoint: EndpointTemplate, mode: FetchMode) -> Self {
        Self {
            name: name.into(),
            endpoint,
            mode,
        }
    }

    pub fn batch(name: impl Into<String>, endpoint: EndpointTemplate) -> Self {
        Self::new(name, endpoint, FetchMode::Batch)
    }

    pub fn single(name: impl Into<String>, endpoint: EndpointTemplate) -> Self {
        Self::new(name, endpoint, FetchMode::Single)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &EndpointTemplate {
        &self.endpoint
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }
}

/// Performs one network call for a set of identifiers.
///
/// Ids absent from the returned map had no data at the remote. A
/// `FetchMode::Single` collection is only ever called with one id.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn fetch(&self, collection: &Collection, ids: &[String])
        -> Result<HashMap<String, Payload>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_single_and_batch() {
        let endpoint = EndpointTemplate::new("/v1.4/summoner/by-name/", "");
        assert_eq!(
            endpoint.path_for(&["faker".to_string()]),
            "/v1.4/summoner/by-name/faker"
        );
        assert_eq!(
            endpoint.path_for(&["faker".to_string(), "bjergsen".to_string()]),
            "/v1.4/summoner/by-name/faker,bjergsen"
        );
    }

    #[test]
    fn test_path_for_encodes_ids_and_keeps_suffix() {
        let endpoint = EndpointTemplate::new("/player/", "/champions");
        assert_eq!(
            endpoint.path_for(&["a b".to_string(), "c/d".to_string()]),
            "/player/a%20b,c%2Fd/champions"
        );
    }
}
