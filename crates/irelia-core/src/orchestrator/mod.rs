//! Read-through resolution of keys against the cache store and the remote.
//!
//! One algorithm serves single keys and batches:
//! 1. Partition keys into fresh hits, keys another caller is already
//!    fetching, and keys this call must fetch (stale entries are evicted).
//! 2. Admit each remote call through the shared [`QuotaGate`]. A refused call
//!    yields `RateLimited` for its keys right away.
//! 3. Stamp fetched payloads, write them back in one batch, then publish the
//!    outcomes to any waiting callers.

mod builder;
mod inflight;
mod resolution;

pub use builder::OrchestratorBuilder;
pub use resolution::{KeyOutcome, Origin, Resolution, WriteBack};

use crate::clock::{Clock, Timestamp};
use crate::quota::{Admission, QuotaGate};
use crate::remote::{Collection, FetchMode, RemoteClient};
use crate::store::{CacheEntry, CacheStore, Payload};
use futures::future::join_all;
use inflight::{Follower, InFlight, Leadership};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Decides cache-vs-fetch per key and merges the results.
pub struct QueryOrchestrator {
    store: Arc<dyn CacheStore>,
    remote: Arc<dyn RemoteClient>,
    gate: Arc<QuotaGate>,
    clock: Arc<dyn Clock>,
    update_frequency: Duration,
    in_flight: InFlight,
}

struct Partition {
    outcomes: BTreeMap<String, KeyOutcome>,
    followers: Vec<(String, Follower)>,
    leading: Vec<String>,
}

#[derive(Default)]
struct FetchReport {
    outcomes: BTreeMap<String, KeyOutcome>,
    entries: Vec<CacheEntry>,
    calls: usize,
}

impl FetchReport {
    fn merge(&mut self, other: FetchReport) {
        self.outcomes.extend(other.outcomes);
        self.entries.extend(other.entries);
        self.calls += other.calls;
    }
}

fn found_in_cache(payload: Payload) -> KeyOutcome {
    KeyOutcome::Found {
        payload,
        origin: Origin::Cache,
    }
}

impl QueryOrchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn gate(&self) -> &Arc<QuotaGate> {
        &self.gate
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Age at which a cached entry must be refetched.
    pub fn update_frequency(&self) -> Duration {
        self.update_frequency
    }

    /// Keys currently being fetched, across all collections.
    pub fn pending_fetches(&self) -> usize {
        self.in_flight.len()
    }

    /// Resolve one key.
    pub async fn resolve_one(&self, collection: &Collection, key: impl Into<String>) -> Resolution {
        self.resolve(collection, [key.into()]).await
    }

    /// Resolve every key in `keys`, fetching only what is missing or stale.
    ///
    /// Duplicate keys are resolved once. Every distinct key gets an outcome.
    pub async fn resolve<I, S>(&self, collection: &Collection, keys: I) -> Resolution
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        let now = self.clock.now();

        let Partition {
            mut outcomes,
            followers,
            leading,
        } = self.partition(collection, &keys, now);
        let leadership = Leadership::new(&self.in_flight, collection.name(), leading);

        let mut remote_calls = 0;
        let mut write_back = WriteBack::NotNeeded;

        if !leadership.keys().is_empty() {
            let report = self.fetch(collection, leadership.keys()).await;
            remote_calls = report.calls;
            write_back = self.write_back(collection, &report.entries);
            leadership.publish(&report.outcomes);
            outcomes.extend(report.outcomes);
        }

        for (key, follower) in followers {
            debug!("Waiting on in-flight fetch of {}/{}", collection.name(), key);
            outcomes.insert(key, follower.outcome().await);
        }

        Resolution::new(collection.name(), now, outcomes, write_back, remote_calls)
    }

    /// Split `keys` into cache hits, keys another resolve is already
    /// fetching, and keys this resolve must fetch itself.
    ///
    /// Fresh hits are served without touching the in-flight map. Only the
    /// remaining keys are checked again under its lock, since a concurrent
    /// leader may have written them back in the meantime.
    fn partition(&self, collection: &Collection, keys: &BTreeSet<String>, now: Timestamp) -> Partition {
        let name = collection.name();
        let mut partition = Partition {
            outcomes: BTreeMap::new(),
            followers: Vec::new(),
            leading: Vec::new(),
        };

        let mut candidates = Vec::new();
        for key in keys {
            match self.fresh_entry(name, key, now) {
                Some(payload) => {
                    debug!("Cache hit for {}/{}", name, key);
                    partition.outcomes.insert(key.clone(), found_in_cache(payload));
                }
                None => candidates.push(key),
            }
        }
        if candidates.is_empty() {
            return partition;
        }

        let mut pending = self.in_flight.lock(name);
        for key in candidates {
            if let Some(follower) = pending.follow(key) {
                partition.followers.push((key.clone(), follower));
                continue;
            }

            match self.store.lookup(name, key) {
                Ok(Some(entry)) if !entry.is_stale(now, self.update_frequency) => {
                    debug!("Cache hit for {}/{} after a concurrent fetch", name, key);
                    partition
                        .outcomes
                        .insert(key.clone(), found_in_cache(entry.payload));
                    continue;
                }
                Ok(Some(entry)) => {
                    debug!(
                        "Stale entry for {}/{} (updated {})",
                        name, key, entry.last_update
                    );
                    if let Err(e) = self.store.evict(name, key) {
                        warn!("Failed to evict {}/{}: {}", name, key, e);
                    }
                }
                Ok(None) => debug!("Cache miss for {}/{}", name, key),
                Err(e) => warn!("Cache lookup failed for {}/{}, fetching: {}", name, key, e),
            }

            pending.lead(key);
            partition.leading.push(key.clone());
        }

        partition
    }

    /// Payload of a cached entry that is still fresh at `now`.
    fn fresh_entry(&self, collection: &str, key: &str, now: Timestamp) -> Option<Payload> {
        match self.store.lookup(collection, key) {
            Ok(Some(entry)) if !entry.is_stale(now, self.update_frequency) => Some(entry.payload),
            Ok(_) => None,
            Err(e) => {
                debug!("Cache lookup failed for {}/{}: {}", collection, key, e);
                None
            }
        }
    }

    async fn fetch(&self, collection: &Collection, keys: &[String]) -> FetchReport {
        match collection.mode() {
            FetchMode::Batch => self.fetch_call(collection, keys.to_vec()).await,
            FetchMode::Single => {
                let calls = keys
                    .iter()
                    .map(|key| self.fetch_call(collection, vec![key.clone()]));
                let mut report = FetchReport::default();
                for part in join_all(calls).await {
                    report.merge(part);
                }
                report
            }
        }
    }

    /// One gated remote call for `ids`.
    async fn fetch_call(&self, collection: &Collection, ids: Vec<String>) -> FetchReport {
        let mut report = FetchReport::default();

        if let Admission::Refused { retry_at } = self.gate.try_acquire(self.clock.now()) {
            warn!(
                "Quota exhausted, refusing fetch of {} key(s) from {}",
                ids.len(),
                collection.name()
            );
            for id in ids {
                report.outcomes.insert(id, KeyOutcome::RateLimited { retry_at });
            }
            return report;
        }

        report.calls = 1;
        info!("Fetching {} key(s) from {}", ids.len(), collection.name());

        match self.remote.fetch(collection, &ids).await {
            Ok(payloads) => {
                let stamp = self.clock.now();
                for id in &ids {
                    if !payloads.contains_key(id) {
                        debug!("Remote has no data for {}/{}", collection.name(), id);
                        report.outcomes.insert(id.clone(), KeyOutcome::Missing);
                    }
                }
                for (id, payload) in payloads {
                    report
                        .entries
                        .push(CacheEntry::new(id.clone(), payload.clone(), stamp));
                    report.outcomes.insert(
                        id,
                        KeyOutcome::Found {
                            payload,
                            origin: Origin::Remote,
                        },
                    );
                }
            }
            Err(e) => {
                warn!("Fetch from {} failed: {}", collection.name(), e);
                let outcome = KeyOutcome::from_error(&e, self.clock.now());
                for id in ids {
                    report.outcomes.insert(id, outcome.clone());
                }
            }
        }

        report
    }

    fn write_back(&self, collection: &Collection, entries: &[CacheEntry]) -> WriteBack {
        if entries.is_empty() {
            return WriteBack::NotNeeded;
        }
        match self.store.insert(collection.name(), entries) {
            Ok(()) => {
                debug!("Cached {} entries in {}", entries.len(), collection.name());
                WriteBack::Stored(entries.len())
            }
            Err(e) => {
                warn!(
                    "Failed to cache {} entries in {}: {}",
                    entries.len(),
                    collection.name(),
                    e
                );
                WriteBack::Failed(e.to_string())
            }
        }
    }
}
