//! In-process cache store.

use super::traits::{CacheEntry, CacheStore, CollectionStats, StoreStats};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Collections = HashMap<String, HashMap<String, CacheEntry>>;

/// Cache store held entirely in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.collections.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.collections.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn lookup(&self, collection: &str, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self
            .read()
            .get(collection)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn evict(&self, collection: &str, key: &str) -> Result<bool> {
        Ok(self
            .write()
            .get_mut(collection)
            .and_then(|entries| entries.remove(key))
            .is_some())
    }

    fn insert(&self, collection: &str, entries: &[CacheEntry]) -> Result<()> {
        let mut collections = self.write();
        let target = collections.entry(collection.to_string()).or_default();
        for entry in entries {
            target.insert(entry.key.clone(), entry.clone());
        }
        Ok(())
    }

    fn clear(&self, collection: &str) -> Result<usize> {
        Ok(self
            .write()
            .remove(collection)
            .map(|entries| entries.len())
            .unwrap_or(0))
    }

    fn stats(&self) -> Result<StoreStats> {
        let collections = self.read();
        let mut stats: Vec<CollectionStats> = collections
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, entries)| CollectionStats {
                collection: name.clone(),
                entry_count: entries.len(),
                newest_update: entries.values().map(|e| e.last_update).max(),
            })
            .collect();
        stats.sort_by(|a, b| a.collection.cmp(&b.collection));

        Ok(StoreStats {
            total_entries: stats.iter().map(|c| c.entry_count).sum(),
            collections: stats,
        })
    }
}
