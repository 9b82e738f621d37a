//! Transactions over a [`Store`].
//!
//! A transaction buffers writes and records the version of every key it
//! reads. Nothing reaches the store until [`Transaction::commit`], which
//! hands the read set and write set to the store in one atomic step; a
//! transaction that is dropped instead simply writes nothing.
//!
//! Each transaction runs on behalf of one organization and may read
//! plaintext only from the public namespace and that organization's own
//! private namespace. Other private namespaces are reachable through
//! [`Transaction::content_hash`] alone.
//!
//! Range scans record the versions of the keys they return but do not
//! guard against keys inserted into the range by a concurrent commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use sharebook_core::{ContentHash, Namespace};

use crate::error::{Result, StoreError};
use crate::traits::{in_range, ReadVersion, Store, WriteOp, WriteSet};

type Slot = (Namespace, String);

/// A single read-modify-write unit of work against a store.
pub struct Transaction<S: Store + ?Sized> {
    store: Arc<S>,
    private: Namespace,
    reads: BTreeMap<Slot, u64>,
    writes: BTreeMap<Slot, Option<Bytes>>,
}

impl<S: Store + ?Sized> Transaction<S> {
    /// Begin a transaction whose plaintext view includes `private`.
    pub fn begin(store: Arc<S>, private: Namespace) -> Self {
        Self {
            store,
            private,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// The private namespace this transaction may read in plaintext.
    pub fn private_namespace(&self) -> &Namespace {
        &self.private
    }

    fn check_plaintext_access(&self, namespace: &Namespace) -> Result<()> {
        match namespace {
            Namespace::Public => Ok(()),
            ns if *ns == self.private => Ok(()),
            ns => Err(StoreError::PrivateAccess(ns.clone())),
        }
    }

    fn record_read(&mut self, namespace: &Namespace, key: &str, version: u64) {
        self.reads
            .entry((namespace.clone(), key.to_string()))
            .or_insert(version);
    }

    fn pending(&self, namespace: &Namespace, key: &str) -> Option<&Option<Bytes>> {
        self.writes.get(&(namespace.clone(), key.to_string()))
    }

    /// Read a key, observing this transaction's own pending writes.
    pub async fn get(&mut self, namespace: &Namespace, key: &str) -> Result<Option<Bytes>> {
        self.check_plaintext_access(namespace)?;

        if let Some(pending) = self.pending(namespace, key) {
            return Ok(pending.clone());
        }

        let versioned = self.store.get(namespace, key).await?;
        self.record_read(namespace, key, versioned.version);
        Ok(versioned.value)
    }

    /// Hash of the bytes stored at a key, in any namespace.
    pub async fn content_hash(
        &mut self,
        namespace: &Namespace,
        key: &str,
    ) -> Result<Option<ContentHash>> {
        if let Some(pending) = self.pending(namespace, key) {
            return Ok(pending.as_deref().map(ContentHash::hash));
        }

        let versioned = self.store.content_hash(namespace, key).await?;
        self.record_read(namespace, key, versioned.version);
        Ok(versioned.value)
    }

    /// Scan `[start, end)` in key order, merged with pending writes.
    ///
    /// The returned iterator is consumed once; scan again for a fresh view.
    pub async fn range_scan(
        &mut self,
        namespace: &Namespace,
        start: &str,
        end: &str,
    ) -> Result<RangeScan> {
        self.check_plaintext_access(namespace)?;

        let committed = self.store.scan(namespace, start, end).await?;
        let mut merged: BTreeMap<String, Bytes> = BTreeMap::new();
        for (key, versioned) in committed {
            self.record_read(namespace, &key, versioned.version);
            if let Some(value) = versioned.value {
                merged.insert(key, value);
            }
        }

        for ((ns, key), value) in &self.writes {
            if ns != namespace || !in_range(key, start, end) {
                continue;
            }
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(RangeScan {
            inner: merged.into_iter(),
        })
    }

    /// Buffer a write.
    pub fn put(&mut self, namespace: &Namespace, key: &str, value: impl Into<Bytes>) -> Result<()> {
        self.check_plaintext_access(namespace)?;
        self.writes
            .insert((namespace.clone(), key.to_string()), Some(value.into()));
        Ok(())
    }

    /// Buffer a delete.
    pub fn delete(&mut self, namespace: &Namespace, key: &str) -> Result<()> {
        self.check_plaintext_access(namespace)?;
        self.writes.insert((namespace.clone(), key.to_string()), None);
        Ok(())
    }

    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }

    /// Commit the transaction.
    ///
    /// Returns the store's commit height, or `None` when there was nothing
    /// to write.
    pub async fn commit(self) -> Result<Option<u64>> {
        if self.writes.is_empty() {
            return Ok(None);
        }

        let write_set = WriteSet {
            reads: self
                .reads
                .into_iter()
                .map(|((namespace, key), version)| ReadVersion {
                    namespace,
                    key,
                    version,
                })
                .collect(),
            writes: self
                .writes
                .into_iter()
                .map(|((namespace, key), value)| WriteOp {
                    namespace,
                    key,
                    value,
                })
                .collect(),
        };

        let height = self.store.commit(write_set).await?;
        tracing::debug!(height, "transaction committed");
        Ok(Some(height))
    }
}

/// Key-ordered results of a range scan.
pub struct RangeScan {
    inner: std::collections::btree_map::IntoIter<String, Bytes>,
}

impl Iterator for RangeScan {
    type Item = (String, Bytes);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
