//! Store trait: the abstract interface of the ledger's key/value substrate.
//!
//! Every key lives in a [`Namespace`] and carries a version. Versions come
//! from a single commit height that only grows, and deletes leave a
//! tombstone behind, so a reader can always tell whether a key moved
//! underneath it.

use async_trait::async_trait;
use bytes::Bytes;
use sharebook_core::{ContentHash, Namespace};

use crate::error::Result;

/// A value as of a given version. `value` is `None` for absent keys;
/// `version` is 0 for keys that were never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: Option<T>,
    pub version: u64,
}

impl<T> Versioned<T> {
    /// The state of a key that was never written.
    pub fn absent() -> Self {
        Self {
            value: None,
            version: 0,
        }
    }
}

/// A key a transaction read, and the version it saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadVersion {
    pub namespace: Namespace,
    pub key: String,
    pub version: u64,
}

/// A buffered mutation. `value: None` deletes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOp {
    pub namespace: Namespace,
    pub key: String,
    pub value: Option<Bytes>,
}

/// Everything a transaction read and wants to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    pub reads: Vec<ReadVersion>,
    pub writes: Vec<WriteOp>,
}

/// The Store trait: async interface to the transactional key/value substrate.
///
/// # Design Notes
///
/// - **Atomic commit**: `commit` validates every read version and applies
///   every write, or does neither.
/// - **Hash-only disclosure**: `content_hash` never returns the stored bytes.
/// - **Key order**: `scan` yields keys in ascending byte order.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get the current value and version of a key.
    async fn get(&self, namespace: &Namespace, key: &str) -> Result<Versioned<Bytes>>;

    /// Get the Blake3 hash of a key's stored bytes, and its version.
    async fn content_hash(&self, namespace: &Namespace, key: &str)
        -> Result<Versioned<ContentHash>>;

    /// List live keys with `start <= key < end`, ordered by key.
    ///
    /// An empty `start` or `end` leaves that side unbounded.
    async fn scan(
        &self,
        namespace: &Namespace,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Versioned<Bytes>)>>;

    /// Validate the read set and apply the writes atomically.
    ///
    /// Returns the new commit height.
    async fn commit(&self, write_set: WriteSet) -> Result<u64>;

    /// The current commit height (0 for an empty store).
    async fn height(&self) -> Result<u64>;
}

/// Whether `key` falls in the half-open scan range `[start, end)`.
pub(crate) fn in_range(key: &str, start: &str, end: &str) -> bool {
    (start.is_empty() || key >= start) && (end.is_empty() || key < end)
}
