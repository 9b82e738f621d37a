//! SQLite implementation of the Store trait.
//!
//! This is the persistent backend for the ledger. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use sharebook_core::{ContentHash, Namespace};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Store, Versioned, WriteSet};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn row_version(raw: i64) -> Result<u64> {
    u64::try_from(raw).map_err(|_| StoreError::InvalidData(format!("negative version {raw}")))
}

fn hash_from_blob(blob: Vec<u8>) -> Result<ContentHash> {
    let arr: [u8; 32] = blob
        .try_into()
        .map_err(|_| StoreError::InvalidData("content hash is not 32 bytes".into()))?;
    Ok(ContentHash::from_bytes(arr))
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, namespace: &Namespace, key: &str) -> Result<Versioned<Bytes>> {
        let ns = namespace.name().to_string();
        let key = key.to_string();

        self.with_conn(move |conn| {
            let row: Option<(Option<Vec<u8>>, i64)> = conn
                .query_row(
                    "SELECT value, version FROM entries WHERE namespace = ?1 AND key = ?2",
                    params![ns, key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match row {
                Some((value, version)) => Ok(Versioned {
                    value: value.map(Bytes::from),
                    version: row_version(version)?,
                }),
                None => Ok(Versioned::absent()),
            }
        })
        .await
    }

    async fn content_hash(
        &self,
        namespace: &Namespace,
        key: &str,
    ) -> Result<Versioned<ContentHash>> {
        let ns = namespace.name().to_string();
        let key = key.to_string();

        self.with_conn(move |conn| {
            // Only the hash column is read; the plaintext never leaves SQLite.
            let row: Option<(Option<Vec<u8>>, i64)> = conn
                .query_row(
                    "SELECT content_hash, version FROM entries WHERE namespace = ?1 AND key = ?2",
                    params![ns, key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match row {
                Some((hash, version)) => Ok(Versioned {
                    value: hash.map(hash_from_blob).transpose()?,
                    version: row_version(version)?,
                }),
                None => Ok(Versioned::absent()),
            }
        })
        .await
    }

    async fn scan(
        &self,
        namespace: &Namespace,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Versioned<Bytes>)>> {
        let ns = namespace.name().to_string();
        let start = start.to_string();
        let end = end.to_string();

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value, version FROM entries
                 WHERE namespace = ?1 AND value IS NOT NULL
                   AND (?2 = '' OR key >= ?2)
                   AND (?3 = '' OR key < ?3)
                 ORDER BY key ASC",
            )?;

            let rows = stmt.query_map(params![ns, start, end], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;

            let mut out = Vec::new();
            for row in rows {
                let (key, value, version) = row?;
                out.push((
                    key,
                    Versioned {
                        value: Some(Bytes::from(value)),
                        version: row_version(version)?,
                    },
                ));
            }
            Ok(out)
        })
        .await
    }

    async fn commit(&self, write_set: WriteSet) -> Result<u64> {
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            for read in &write_set.reads {
                let current: i64 = tx
                    .query_row(
                        "SELECT version FROM entries WHERE namespace = ?1 AND key = ?2",
                        params![read.namespace.name(), read.key],
                        |row| row.get(0),
                    )
                    .optional()?
                    .unwrap_or(0);
                let current = row_version(current)?;

                if current != read.version {
                    return Err(StoreError::Conflict {
                        namespace: read.namespace.clone(),
                        key: read.key.clone(),
                        read: read.version,
                        current,
                    });
                }
            }

            let height: i64 = tx.query_row(
                "UPDATE ledger_height SET height = height + 1 WHERE id = 0 RETURNING height",
                [],
                |row| row.get(0),
            )?;

            for write in &write_set.writes {
                let hash = write
                    .value
                    .as_deref()
                    .map(|v| ContentHash::hash(v).as_bytes().to_vec());

                tx.execute(
                    "INSERT INTO entries (namespace, key, value, content_hash, version)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (namespace, key) DO UPDATE SET
                        value = excluded.value,
                        content_hash = excluded.content_hash,
                        version = excluded.version",
                    params![
                        write.namespace.name(),
                        write.key,
                        write.value.as_deref(),
                        hash,
                        height,
                    ],
                )?;
            }

            tx.commit()?;
            row_version(height)
        })
        .await
    }

    async fn height(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let height: i64 =
                conn.query_row("SELECT height FROM ledger_height WHERE id = 0", [], |row| {
                    row.get(0)
                })?;
            row_version(height)
        })
        .await
    }
}
