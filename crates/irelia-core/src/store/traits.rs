//! Cache store trait and entry types.

use crate::clock::Timestamp;
use crate::error::{IreliaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Opaque remote payload.
pub type Payload = serde_json::Value;

/// One cached payload and the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Payload,
    pub last_update: Timestamp,
}

/// On-disk shape of an entry's value: `{ "info": ..., "lastUpdate": ... }`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    info: Payload,
    #[serde(rename = "lastUpdate")]
    last_update: Timestamp,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: Payload, last_update: Timestamp) -> Self {
        Self {
            key: key.into(),
            payload,
            last_update,
        }
    }

    pub fn age(&self, now: Timestamp) -> Duration {
        now.saturating_since(self.last_update)
    }

    /// Stale once `now - last_update >= threshold`.
    pub fn is_stale(&self, now: Timestamp, threshold: Duration) -> bool {
        self.age(now) >= threshold
    }

    /// Encode as the persisted document `{ "<key>": { "info", "lastUpdate" } }`.
    pub fn to_document(&self) -> Result<serde_json::Value> {
        let mut doc = BTreeMap::new();
        doc.insert(
            self.key.as_str(),
            StoredRecord {
                info: self.payload.clone(),
                last_update: self.last_update,
            },
        );
        Ok(serde_json::to_value(doc)?)
    }

    /// Decode a persisted document holding exactly one entry.
    pub fn from_document(doc: serde_json::Value) -> Result<Self> {
        let mut records: BTreeMap<String, StoredRecord> = serde_json::from_value(doc)?;
        if records.len() != 1 {
            return Err(IreliaError::store(format!(
                "Cache document must hold exactly one entry, found {}",
                records.len()
            )));
        }
        let (key, record) = records
            .pop_first()
            .ok_or_else(|| IreliaError::store("Empty cache document"))?;
        Ok(Self {
            key,
            payload: record.info,
            last_update: record.last_update,
        })
    }
}

/// Entry count for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection: String,
    pub entry_count: usize,
    /// Most recent `last_update` in the collection.
    pub newest_update: Option<Timestamp>,
}

/// Store-wide statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_entries: usize,
    pub collections: Vec<CollectionStats>,
}

/// Keyed storage for cached payloads, partitioned by collection.
///
/// No transactional guarantee spans several calls. Operations on different
/// keys may run concurrently.
pub trait CacheStore: Send + Sync {
    /// Get the entry for `key`, stale or not.
    fn lookup(&self, collection: &str, key: &str) -> Result<Option<CacheEntry>>;

    /// Remove the entry for `key`. Returns whether one existed.
    fn evict(&self, collection: &str, key: &str) -> Result<bool>;

    /// Write all `entries` in one batch, replacing any with the same key.
    fn insert(&self, collection: &str, entries: &[CacheEntry]) -> Result<()>;

    /// Remove every entry in a collection.
    fn clear(&self, collection: &str) -> Result<usize>;

    fn stats(&self) -> Result<StoreStats>;
}
