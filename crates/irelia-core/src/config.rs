//! Centralized configuration constants.
//!
//! All durations are `std::time::Duration`; all clock readings and persisted
//! timestamps are whole milliseconds since the Unix epoch (see [`crate::clock`]).

use std::time::Duration;

/// Cache behaviour shared by every collection.
pub struct CacheConfig;

impl CacheConfig {
    /// Age at which a cached entry is considered stale (10 hours).
    pub const UPDATE_FREQUENCY: Duration = Duration::from_millis(36_000_000);
    pub const DB_FILE_NAME: &'static str = "irelia.sqlite";
    pub const DATA_DIR_NAME: &'static str = "irelia";
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const USER_AGENT: &'static str = "Irelia/0.1";
    /// Query parameter carrying the API credential.
    pub const API_KEY_PARAM: &'static str = "api_key";
    /// Separator used when several identifiers share one request.
    pub const BATCH_SEPARATOR: &'static str = ",";
}

/// Default admission limits.
pub struct QuotaConfig;

impl QuotaConfig {
    /// Short burst limit: requests per window.
    pub const BURST_LIMIT: usize = 5;
    pub const BURST_WINDOW: Duration = Duration::from_secs(5);
    /// Sustained limit: requests per window.
    pub const SUSTAINED_LIMIT: usize = 250;
    pub const SUSTAINED_WINDOW: Duration = Duration::from_secs(600);
}
