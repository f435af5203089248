//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use irelia_core::{
    CacheEntry, CacheStore, Collection, IreliaError, MemoryStore, Payload, RemoteClient, Result,
    StoreStats,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How a [`ScriptedRemote`] should fail its next calls.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Status(u16),
    RateLimited { retry_after_secs: u64 },
}

/// Remote that answers from a fixed table and records every request.
#[derive(Default)]
pub struct ScriptedRemote {
    known: Mutex<HashMap<String, Payload>>,
    delay: Duration,
    failure: Mutex<Option<Failure>>,
    requests: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, id: &str, payload: Payload) -> Self {
        self.known.lock().unwrap().insert(id.to_string(), payload);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set(&self, id: &str, payload: Payload) {
        self.known.lock().unwrap().insert(id.to_string(), payload);
    }

    pub fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteClient for ScriptedRemote {
    async fn fetch(
        &self,
        _collection: &Collection,
        ids: &[String],
    ) -> Result<HashMap<String, Payload>> {
        self.requests.lock().unwrap().push(ids.to_vec());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failure = *self.failure.lock().unwrap();
        match failure {
            Some(Failure::Status(status)) => Err(IreliaError::FetchFailed {
                message: format!("scripted status {}", status),
                status: Some(status),
            }),
            Some(Failure::RateLimited { retry_after_secs }) => Err(IreliaError::RateLimited {
                service: "scripted".to_string(),
                retry_after_secs: Some(retry_after_secs),
            }),
            None => {
                let known = self.known.lock().unwrap();
                Ok(ids
                    .iter()
                    .filter_map(|id| known.get(id).map(|p| (id.clone(), p.clone())))
                    .collect())
            }
        }
    }
}

/// In-memory store whose lookups or inserts can be made to fail.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    pub fail_lookup: AtomicBool,
    pub fail_insert: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_lookup(&self, fail: bool) {
        self.fail_lookup.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }
}

impl CacheStore for FailingStore {
    fn lookup(&self, collection: &str, key: &str) -> Result<Option<CacheEntry>> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(IreliaError::store("lookup unavailable"));
        }
        self.inner.lookup(collection, key)
    }

    fn evict(&self, collection: &str, key: &str) -> Result<bool> {
        self.inner.evict(collection, key)
    }

    fn insert(&self, collection: &str, entries: &[CacheEntry]) -> Result<()> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(IreliaError::store("disk full"));
        }
        self.inner.insert(collection, entries)
    }

    fn clear(&self, collection: &str) -> Result<usize> {
        self.inner.clear(collection)
    }

    fn stats(&self) -> Result<StoreStats> {
        self.inner.stats()
    }
}
