//! Persistent storage for cached remote payloads.
//!
//! Entries are grouped into named collections (players, match lists, ...)
//! that share one backend. The orchestrator only needs lookup, evict and a
//! batched insert; the rest is maintenance.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CacheEntry, CacheStore, CollectionStats, Payload, StoreStats};
