//! Result of resolving a set of keys.

use crate::clock::Timestamp;
use crate::error::{IreliaError, Result};
use crate::store::Payload;
use std::collections::{BTreeMap, HashMap};

/// Where a resolved payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Fresh entry in the cache store.
    Cache,
    /// Fetched by this call.
    Remote,
    /// Fetched by a concurrent call for the same key.
    Shared,
}

/// What happened to one requested key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Found { payload: Payload, origin: Origin },
    /// The remote answered but had no data for this key.
    Missing,
    /// The call for this key was refused, locally by the quota gate or by
    /// the remote itself. Nothing was sent for a local refusal.
    RateLimited { retry_at: Option<Timestamp> },
    FetchFailed { reason: String, status: Option<u16> },
}

impl KeyOutcome {
    pub(crate) fn from_error(err: &IreliaError, now: Timestamp) -> Self {
        match err {
            IreliaError::RateLimited {
                retry_after_secs, ..
            } => KeyOutcome::RateLimited {
                retry_at: retry_after_secs
                    .map(|secs| now.saturating_add(std::time::Duration::from_secs(secs))),
            },
            IreliaError::FetchFailed { status, .. } => KeyOutcome::FetchFailed {
                reason: err.to_string(),
                status: *status,
            },
            other => KeyOutcome::FetchFailed {
                reason: other.to_string(),
                status: None,
            },
        }
    }

    /// The same outcome as seen by a caller that waited on someone else's fetch.
    pub(crate) fn into_shared(self) -> Self {
        match self {
            KeyOutcome::Found { payload, .. } => KeyOutcome::Found {
                payload,
                origin: Origin::Shared,
            },
            other => other,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            KeyOutcome::Found { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, KeyOutcome::Found { .. })
    }

    /// Refused or failed, as opposed to found or known-missing.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            KeyOutcome::RateLimited { .. } | KeyOutcome::FetchFailed { .. }
        )
    }
}

/// Status of the batched write of freshly fetched entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBack {
    /// Nothing was fetched, so nothing had to be written.
    NotNeeded,
    /// This many entries were written.
    Stored(usize),
    /// The write failed; fetched payloads are still in the resolution.
    Failed(String),
}

/// Per-key outcomes of one `resolve` call.
#[derive(Debug, Clone)]
pub struct Resolution {
    collection: String,
    resolved_at: Timestamp,
    outcomes: BTreeMap<String, KeyOutcome>,
    write_back: WriteBack,
    remote_calls: usize,
}

impl Resolution {
    pub(crate) fn new(
        collection: impl Into<String>,
        resolved_at: Timestamp,
        outcomes: BTreeMap<String, KeyOutcome>,
        write_back: WriteBack,
        remote_calls: usize,
    ) -> Self {
        Self {
            collection: collection.into(),
            resolved_at,
            outcomes,
            write_back,
            remote_calls,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn resolved_at(&self) -> Timestamp {
        self.resolved_at
    }

    pub fn outcomes(&self) -> &BTreeMap<String, KeyOutcome> {
        &self.outcomes
    }

    pub fn outcome(&self, key: &str) -> Option<&KeyOutcome> {
        self.outcomes.get(key)
    }

    pub fn write_back(&self) -> &WriteBack {
        &self.write_back
    }

    /// Remote calls issued by this resolve (refused calls are not counted).
    pub fn remote_calls(&self) -> usize {
        self.remote_calls
    }

    /// True when every key was found.
    pub fn is_complete(&self) -> bool {
        self.outcomes.values().all(KeyOutcome::is_found)
    }

    /// Keys that were refused or failed.
    pub fn failed_keys(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Found keys and their payloads.
    pub fn found(&self) -> impl Iterator<Item = (&str, &Payload)> {
        self.outcomes
            .iter()
            .filter_map(|(key, outcome)| outcome.payload().map(|p| (key.as_str(), p)))
    }

    /// Number of keys answered from a fresh cache entry.
    pub fn cache_hits(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, KeyOutcome::Found { origin: Origin::Cache, .. }))
            .count()
    }

    /// Payload for `key`, or the error describing why there is none.
    pub fn payload(&self, key: &str) -> Result<&Payload> {
        match self.outcomes.get(key) {
            Some(KeyOutcome::Found { payload, .. }) => Ok(payload),
            Some(KeyOutcome::Missing) | None => Err(IreliaError::NotFound {
                collection: self.collection.clone(),
                key: key.to_string(),
            }),
            Some(KeyOutcome::RateLimited { retry_at }) => Err(IreliaError::RateLimited {
                service: self.collection.clone(),
                retry_after_secs: retry_at.map(|at| {
                    let wait = at.saturating_since(self.resolved_at);
                    wait.as_secs() + u64::from(wait.subsec_nanos() > 0)
                }),
            }),
            Some(KeyOutcome::FetchFailed { reason, status }) => Err(IreliaError::FetchFailed {
                message: reason.clone(),
                status: *status,
            }),
        }
    }

    /// Consume into the found payloads only.
    pub fn into_payloads(self) -> HashMap<String, Payload> {
        self.outcomes
            .into_iter()
            .filter_map(|(key, outcome)| match outcome {
                KeyOutcome::Found { payload, .. } => Some((key, payload)),
                _ => None,
            })
            .collect()
    }
}
