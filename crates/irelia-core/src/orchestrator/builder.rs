//! Builder for configuring a [`QueryOrchestrator`].

use super::inflight::InFlight;
use super::QueryOrchestrator;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{IreliaError, Result};
use crate::quota::QuotaGate;
use crate::remote::RemoteClient;
use crate::store::CacheStore;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`QueryOrchestrator`].
///
/// A store and a remote client are required. The gate defaults to the
/// Riot development-key limits, the clock to wall time, and the update
/// frequency to [`CacheConfig::UPDATE_FREQUENCY`].
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = QueryOrchestrator::builder()
///     .store(SqliteStore::open("cache.sqlite")?)
///     .remote(HttpRemote::new(base_url)?.with_api_key(key))
///     .update_frequency(Duration::from_secs(3600))
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    store: Option<Arc<dyn CacheStore>>,
    remote: Option<Arc<dyn RemoteClient>>,
    gate: Option<Arc<QuotaGate>>,
    clock: Option<Arc<dyn Clock>>,
    update_frequency: Duration,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            remote: None,
            gate: None,
            clock: None,
            update_frequency: CacheConfig::UPDATE_FREQUENCY,
        }
    }

    pub fn store(self, store: impl CacheStore + 'static) -> Self {
        self.shared_store(Arc::new(store))
    }

    /// Use a store that is also held elsewhere.
    pub fn shared_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn remote(self, remote: impl RemoteClient + 'static) -> Self {
        self.shared_remote(Arc::new(remote))
    }

    pub fn shared_remote(mut self, remote: Arc<dyn RemoteClient>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn gate(self, gate: QuotaGate) -> Self {
        self.shared_gate(Arc::new(gate))
    }

    /// Share one quota between several orchestrators.
    pub fn shared_gate(mut self, gate: Arc<QuotaGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Age at which cached entries are refetched.
    ///
    /// Default: 10 hours
    pub fn update_frequency(mut self, frequency: Duration) -> Self {
        self.update_frequency = frequency;
        self
    }

    pub fn build(self) -> Result<QueryOrchestrator> {
        let store = self.store.ok_or_else(|| IreliaError::Config {
            message: "Orchestrator requires a cache store".to_string(),
        })?;
        let remote = self.remote.ok_or_else(|| IreliaError::Config {
            message: "Orchestrator requires a remote client".to_string(),
        })?;

        Ok(QueryOrchestrator {
            store,
            remote,
            gate: self.gate.unwrap_or_default(),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            update_frequency: self.update_frequency,
            in_flight: InFlight::default(),
        })
    }
}
