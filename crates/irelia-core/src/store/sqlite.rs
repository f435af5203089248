//! SQLite-backed cache store.

use super::traits::{CacheEntry, CacheStore, CollectionStats, StoreStats};
use crate::clock::Timestamp;
use crate::error::{IreliaError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// SQLite cache store.
///
/// All collections share one database file. Each row keeps the persisted
/// document exactly as written, plus the `last_update` column for queries.
/// Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a store at the specified database path.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IreliaError::io_with_path(e, parent))?;
        }

        let conn = Connection::open(db_path).map_err(|e| IreliaError::Store {
            message: format!("Failed to open cache database: {}", e),
            source: Some(e),
        })?;

        // WAL for concurrent readers from other processes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| IreliaError::Store {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| IreliaError::Store {
            message: format!("Failed to open in-memory database: {}", e),
            source: Some(e),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| IreliaError::store(format!("Failed to lock database: {}", e)))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                document TEXT NOT NULL,
                last_update INTEGER NOT NULL,
                PRIMARY KEY (collection, key)
            );

            CREATE INDEX IF NOT EXISTS idx_cache_last_update
                ON cache_entries(collection, last_update);
            "#,
        )
        .map_err(|e| IreliaError::Store {
            message: format!("Failed to initialize cache schema: {}", e),
            source: Some(e),
        })?;

        Ok(())
    }
}

impl CacheStore for SqliteStore {
    fn lookup(&self, collection: &str, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.lock()?;

        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM cache_entries WHERE collection = ?1 AND key = ?2",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| IreliaError::Store {
                message: format!("Failed to query cache entry: {}", e),
                source: Some(e),
            })?;

        let Some(document) = document else {
            return Ok(None);
        };

        let entry = serde_json::from_str(&document)
            .map_err(IreliaError::from)
            .and_then(CacheEntry::from_document)
            .map_err(|e| {
                IreliaError::store(format!(
                    "Corrupt cache document for {}/{}: {}",
                    collection, key, e
                ))
            })?;
        if entry.key != key {
            warn!(
                "Cache row {}/{} holds a document for '{}'",
                collection, key, entry.key
            );
            return Err(IreliaError::store(format!(
                "Document key mismatch for {}/{}",
                collection, key
            )));
        }
        Ok(Some(entry))
    }

    fn evict(&self, collection: &str, key: &str) -> Result<bool> {
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM cache_entries WHERE collection = ?1 AND key = ?2",
                params![collection, key],
            )
            .map_err(|e| IreliaError::Store {
                message: format!("Failed to evict cache entry: {}", e),
                source: Some(e),
            })?;

        Ok(deleted > 0)
    }

    fn insert(&self, collection: &str, entries: &[CacheEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        // Encode before taking the lock.
        let rows = entries
            .iter()
            .map(|entry| -> Result<(&str, String, i64)> {
                let document = serde_json::to_string(&entry.to_document()?)?;
                Ok((entry.key.as_str(), document, entry.last_update.as_millis()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| IreliaError::Store {
            message: format!("Failed to begin write-back: {}", e),
            source: Some(e),
        })?;

        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT OR REPLACE INTO cache_entries
                    (collection, key, document, last_update)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                )
                .map_err(|e| IreliaError::Store {
                    message: format!("Failed to prepare write-back: {}", e),
                    source: Some(e),
                })?;

            for (key, document, last_update) in &rows {
                stmt.execute(params![collection, key, document, last_update])
                .map_err(|e| IreliaError::Store {
                    message: format!("Failed to write cache entry {}: {}", key, e),
                    source: Some(e),
                })?;
            }
        }

        tx.commit().map_err(|e| IreliaError::Store {
            message: format!("Failed to commit write-back: {}", e),
            source: Some(e),
        })?;

        debug!("Stored {} entries in '{}'", rows.len(), collection);
        Ok(())
    }

    fn clear(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM cache_entries WHERE collection = ?1",
                params![collection],
            )
            .map_err(|e| IreliaError::Store {
                message: format!("Failed to clear collection: {}", e),
                source: Some(e),
            })?;

        debug!("Cleared {} entries from '{}'", deleted, collection);
        Ok(deleted)
    }

    fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT collection, COUNT(*), MAX(last_update)
                FROM cache_entries
                GROUP BY collection
                ORDER BY collection
                "#,
            )
            .map_err(|e| IreliaError::Store {
                message: format!("Failed to prepare stats query: {}", e),
                source: Some(e),
            })?;

        let collections: Vec<CollectionStats> = stmt
            .query_map([], |row| {
                let collection: String = row.get(0)?;
                let entry_count: i64 = row.get(1)?;
                let newest: Option<i64> = row.get(2)?;
                Ok(CollectionStats {
                    collection,
                    entry_count: entry_count as usize,
                    newest_update: newest.map(Timestamp::from_millis),
                })
            })
            .map_err(|e| IreliaError::Store {
                message: format!("Failed to query stats: {}", e),
                source: Some(e),
            })?
            .collect::<std::result::Result<_, _>>()?;

        Ok(StoreStats {
            total_entries: collections.iter().map(|c| c.entry_count).sum(),
            collections,
        })
    }
}
