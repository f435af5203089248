//! Builder for configuring RiotApi initialization.

use super::RiotApi;
use crate::config::RiotConfig;
use irelia_core::{
    CacheConfig, Clock, HttpRemote, IreliaError, MemoryStore, NetworkConfig, QueryOrchestrator,
    QuotaGate, Result, SqliteStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
enum Storage {
    DefaultPath,
    Path(PathBuf),
    InMemory,
}

/// Builder for [`RiotApi`].
///
/// # Example
///
/// ```rust,ignore
/// use irelia_riot::RiotApi;
///
/// let api = RiotApi::builder()
///     .api_key("RGAPI-...")
///     .db_path("./irelia.sqlite")
///     .build()?;
/// ```
pub struct RiotApiBuilder {
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
    storage: Storage,
    update_frequency: Duration,
    gate: Option<Arc<QuotaGate>>,
    clock: Option<Arc<dyn Clock>>,
    timeout: Duration,
}

impl Default for RiotApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RiotApiBuilder {
    pub fn new() -> Self {
        Self {
            base_url: RiotConfig::BASE_URL.to_string(),
            api_key: None,
            api_key_env: RiotConfig::API_KEY_ENV.to_string(),
            storage: Storage::DefaultPath,
            update_frequency: CacheConfig::UPDATE_FREQUENCY,
            gate: None,
            clock: None,
            timeout: NetworkConfig::REQUEST_TIMEOUT,
        }
    }

    /// Regional API root.
    ///
    /// Default: [`RiotConfig::BASE_URL`]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// API credential. Takes precedence over the environment.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Environment variable holding the credential when none is given.
    ///
    /// Default: `RIOT_API_KEY`
    pub fn api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }

    /// SQLite database file. Parent directories are created.
    ///
    /// Default: `<data dir>/irelia/irelia.sqlite`
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage = Storage::Path(path.into());
        self
    }

    /// Keep the cache in memory only.
    pub fn in_memory(mut self) -> Self {
        self.storage = Storage::InMemory;
        self
    }

    /// Default: 10 hours
    pub fn update_frequency(mut self, frequency: Duration) -> Self {
        self.update_frequency = frequency;
        self
    }

    /// Default: 5 requests per 5 s and 250 per 10 min
    pub fn gate(self, gate: QuotaGate) -> Self {
        self.shared_gate(Arc::new(gate))
    }

    /// Share one quota with other clients using the same key.
    pub fn shared_gate(mut self, gate: Arc<QuotaGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Default: 15 s
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<RiotApi> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => std::env::var(&self.api_key_env).map_err(|_| IreliaError::Config {
                message: format!(
                    "No API key given and {} is not set",
                    self.api_key_env
                ),
            })?,
        };

        let remote = HttpRemote::with_timeout(self.base_url, self.timeout)?.with_api_key(api_key);

        let mut builder = QueryOrchestrator::builder()
            .remote(remote)
            .update_frequency(self.update_frequency);

        if let Some(gate) = self.gate {
            builder = builder.shared_gate(gate);
        }

        builder = match self.storage {
            Storage::InMemory => builder.store(MemoryStore::new()),
            Storage::Path(path) => builder.store(SqliteStore::open(&path)?),
            Storage::DefaultPath => {
                let path = default_db_path()?;
                info!("Using cache database at {}", path.display());
                builder.store(SqliteStore::open(&path)?)
            }
        };

        if let Some(clock) = self.clock {
            builder = builder.clock(clock);
        }

        Ok(RiotApi::from_orchestrator(builder.build()?))
    }
}

/// `<data dir>/irelia/irelia.sqlite` for the current user.
pub fn default_db_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| {
            dir.join(CacheConfig::DATA_DIR_NAME)
                .join(CacheConfig::DB_FILE_NAME)
        })
        .ok_or_else(|| IreliaError::Config {
            message: "Could not determine the user data directory".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use irelia_core::ErrorKind;

    #[test]
    fn test_missing_key_is_config_error() {
        let err = RiotApiBuilder::new()
            .api_key_env("IRELIA_TEST_KEY_THAT_IS_NEVER_SET")
            .in_memory()
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("IRELIA_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_default_db_path_ends_with_file_name() {
        if let Ok(path) = default_db_path() {
            assert!(path.ends_with("irelia/irelia.sqlite"));
        }
    }
}
