//! Irelia Core - rate-limited, staleness-aware read-through cache.
//!
//! Answers queries for remote records from a local cache when the cached
//! copy is fresh enough, and otherwise fetches them from a quota-constrained
//! remote API without ever exceeding its rate limits.
//!
//! # Example
//!
//! ```rust,ignore
//! use irelia_core::{Collection, EndpointTemplate, HttpRemote, QueryOrchestrator, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> irelia_core::Result<()> {
//!     let orchestrator = QueryOrchestrator::builder()
//!         .store(SqliteStore::open("irelia.sqlite")?)
//!         .remote(HttpRemote::new("https://na.api.pvp.net/api/lol/na")?.with_api_key("..."))
//!         .build()?;
//!
//!     let players = Collection::batch(
//!         "players",
//!         EndpointTemplate::new("/v1.4/summoner/by-name/", ""),
//!     );
//!     let resolution = orchestrator.resolve(&players, ["faker", "bjergsen"]).await;
//!     let faker = resolution.payload("faker")?;
//!     println!("{}", faker["id"]);
//!
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod quota;
pub mod remote;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{CacheConfig, NetworkConfig, QuotaConfig};
pub use error::{ErrorKind, IreliaError, Result};
pub use orchestrator::{KeyOutcome, OrchestratorBuilder, Origin, QueryOrchestrator, Resolution, WriteBack};
pub use quota::{Admission, QuotaGate, RateLimiter};
pub use remote::{Collection, EndpointTemplate, FetchMode, HttpRemote, RemoteClient};
pub use store::{CacheEntry, CacheStore, MemoryStore, Payload, SqliteStore, StoreStats};
