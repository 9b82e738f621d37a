//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use sharebook_core::{ContentHash, Namespace};

use crate::error::{Result, StoreError};
use crate::traits::{in_range, Store, Versioned, WriteSet};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Entries indexed by (namespace, key). Deleted keys keep a tombstone.
    entries: BTreeMap<(Namespace, String), Entry>,

    /// Height of the last commit.
    height: u64,
}

struct Entry {
    value: Option<Bytes>,
    version: u64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Task(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn version_of(&self, namespace: &Namespace, key: &str) -> u64 {
        self.entries
            .get(&(namespace.clone(), key.to_string()))
            .map(|e| e.version)
            .unwrap_or(0)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, namespace: &Namespace, key: &str) -> Result<Versioned<Bytes>> {
        let inner = self.read()?;
        Ok(inner
            .entries
            .get(&(namespace.clone(), key.to_string()))
            .map(|e| Versioned {
                value: e.value.clone(),
                version: e.version,
            })
            .unwrap_or_else(Versioned::absent))
    }

    async fn content_hash(
        &self,
        namespace: &Namespace,
        key: &str,
    ) -> Result<Versioned<ContentHash>> {
        let inner = self.read()?;
        Ok(inner
            .entries
            .get(&(namespace.clone(), key.to_string()))
            .map(|e| Versioned {
                value: e.value.as_deref().map(ContentHash::hash),
                version: e.version,
            })
            .unwrap_or_else(Versioned::absent))
    }

    async fn scan(
        &self,
        namespace: &Namespace,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Versioned<Bytes>)>> {
        let inner = self.read()?;
        let lower = (namespace.clone(), start.to_string());

        Ok(inner
            .entries
            .range(lower..)
            .take_while(|((ns, _), _)| ns == namespace)
            .filter(|((_, key), _)| in_range(key, start, end))
            .filter_map(|((_, key), e)| {
                e.value.as_ref().map(|v| {
                    (
                        key.clone(),
                        Versioned {
                            value: Some(v.clone()),
                            version: e.version,
                        },
                    )
                })
            })
            .collect())
    }

    async fn commit(&self, write_set: WriteSet) -> Result<u64> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Task(format!("lock poisoned: {e}")))?;

        for read in &write_set.reads {
            let current = inner.version_of(&read.namespace, &read.key);
            if current != read.version {
                return Err(StoreError::Conflict {
                    namespace: read.namespace.clone(),
                    key: read.key.clone(),
                    read: read.version,
                    current,
                });
            }
        }

        inner.height += 1;
        let height = inner.height;
        for write in write_set.writes {
            inner.entries.insert(
                (write.namespace, write.key),
                Entry {
                    value: write.value,
                    version: height,
                },
            );
        }

        Ok(height)
    }

    async fn height(&self) -> Result<u64> {
        Ok(self.read()?.height)
    }
}
