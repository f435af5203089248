//! Table of fetches currently in progress, keyed by collection and id.
//!
//! The first caller to miss on a key becomes its leader and registers a
//! watch channel; later callers subscribe and receive the leader's outcome
//! instead of fetching again. A leader publishes only after its write-back,
//! so a caller that no longer finds a pending slot finds the cache entry.

use super::resolution::KeyOutcome;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

type SlotKey = (String, String);
type Slot = watch::Sender<Option<KeyOutcome>>;

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    pending: Mutex<HashMap<SlotKey, Slot>>,
}

/// Pending table, locked for one partition pass.
pub(crate) struct PendingGuard<'a> {
    collection: &'a str,
    slots: MutexGuard<'a, HashMap<SlotKey, Slot>>,
}

impl InFlight {
    pub(crate) fn lock<'a>(&'a self, collection: &'a str) -> PendingGuard<'a> {
        PendingGuard {
            collection,
            slots: self.pending.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl PendingGuard<'_> {
    fn slot_key(&self, key: &str) -> SlotKey {
        (self.collection.to_string(), key.to_string())
    }

    /// Receiver for a fetch already led by another caller.
    pub(crate) fn follow(&self, key: &str) -> Option<Follower> {
        self.slots
            .get(&self.slot_key(key))
            .map(|slot| Follower { rx: slot.subscribe() })
    }

    /// Register the caller as leader for `key`.
    pub(crate) fn lead(&mut self, key: &str) {
        let (tx, _) = watch::channel(None);
        let slot_key = self.slot_key(key);
        self.slots.insert(slot_key, tx);
    }
}

/// Keys this caller must fetch and publish.
///
/// Dropping it without [`publish`](Self::publish) (e.g. when the resolving
/// future is cancelled) releases the slots, and followers observe a failure.
pub(crate) struct Leadership<'a> {
    in_flight: &'a InFlight,
    collection: String,
    keys: Vec<String>,
}

impl<'a> Leadership<'a> {
    pub(crate) fn new(in_flight: &'a InFlight, collection: &str, keys: Vec<String>) -> Self {
        Self {
            in_flight,
            collection: collection.to_string(),
            keys,
        }
    }

    pub(crate) fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Release every slot and hand each follower the outcome for its key.
    pub(crate) fn publish(mut self, outcomes: &BTreeMap<String, KeyOutcome>) {
        let mut pending = self.in_flight.pending.lock().unwrap_or_else(|e| e.into_inner());
        for key in self.keys.drain(..) {
            let slot_key = (self.collection.clone(), key);
            if let Some(tx) = pending.remove(&slot_key) {
                let outcome = outcomes
                    .get(&slot_key.1)
                    .cloned()
                    .map(KeyOutcome::into_shared)
                    .unwrap_or(KeyOutcome::FetchFailed {
                        reason: "Leader produced no outcome".to_string(),
                        status: None,
                    });
                tx.send_replace(Some(outcome));
            }
        }
    }
}

impl Drop for Leadership<'_> {
    fn drop(&mut self) {
        if self.keys.is_empty() {
            return;
        }
        let mut pending = self.in_flight.pending.lock().unwrap_or_else(|e| e.into_inner());
        for key in self.keys.drain(..) {
            pending.remove(&(self.collection.clone(), key));
        }
    }
}

/// A caller waiting on someone else's fetch.
pub(crate) struct Follower {
    rx: watch::Receiver<Option<KeyOutcome>>,
}

impl Follower {
    pub(crate) async fn outcome(mut self) -> KeyOutcome {
        match self.rx.wait_for(Option::is_some).await {
            Ok(published) => published.clone().unwrap_or(KeyOutcome::FetchFailed {
                reason: "In-flight fetch published nothing".to_string(),
                status: None,
            }),
            Err(_) => KeyOutcome::FetchFailed {
                reason: "In-flight fetch was abandoned".to_string(),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Origin;
    use serde_json::json;

    #[tokio::test]
    async fn test_follower_receives_shared_outcome() {
        let in_flight = InFlight::default();
        {
            let mut guard = in_flight.lock("players");
            assert!(guard.follow("faker").is_none());
            guard.lead("faker");
        }
        let leader = Leadership::new(&in_flight, "players", vec!["faker".to_string()]);
        let follower = in_flight.lock("players").follow("faker").unwrap();

        let outcomes = BTreeMap::from([(
            "faker".to_string(),
            KeyOutcome::Found {
                payload: json!({"id": 1}),
                origin: Origin::Remote,
            },
        )]);
        leader.publish(&outcomes);

        assert_eq!(
            follower.outcome().await,
            KeyOutcome::Found {
                payload: json!({"id": 1}),
                origin: Origin::Shared
            }
        );
        assert_eq!(in_flight.len(), 0);
    }

    #[tokio::test]
    async fn test_dropped_leader_fails_followers() {
        let in_flight = InFlight::default();
        in_flight.lock("matches").lead("1");
        let leader = Leadership::new(&in_flight, "matches", vec!["1".to_string()]);
        let follower = in_flight.lock("matches").follow("1").unwrap();

        drop(leader);

        assert!(matches!(
            follower.outcome().await,
            KeyOutcome::FetchFailed { .. }
        ));
        assert_eq!(in_flight.len(), 0);
    }

    #[test]
    fn test_slots_are_per_collection() {
        let in_flight = InFlight::default();
        in_flight.lock("players").lead("42");
        assert!(in_flight.lock("player_matches").follow("42").is_none());
        assert!(in_flight.lock("players").follow("42").is_some());
    }
}
