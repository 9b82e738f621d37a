//! Privacy-preserving student verification.
//!
//! A book owner never reads another organization's student records. It
//! asks the store for the content hash of the record the other
//! organization keeps in its private namespace, and compares hashes.
//! Every party holding the same record bytes derives the same hash, so a
//! hash committed at grant time can be re-derived and compared bit-for-bit
//! at borrow time.

use async_trait::async_trait;
use sharebook_core::{ContentHash, Identity, Namespace, StudentId};
use sharebook_store::{Store, StoreError, Transaction};

use crate::error::{LedgerError, Result};

/// Hash-only view into organizations' private namespaces.
#[async_trait]
pub trait Disclosure: Send {
    /// The private namespace `org` keeps its records in.
    fn private_namespace(&self, org: &Identity) -> Namespace {
        org.private_namespace()
    }

    /// Hash of the record at `key`, or `None` if there is no such record.
    async fn content_hash(
        &mut self,
        namespace: &Namespace,
        key: &str,
    ) -> std::result::Result<Option<ContentHash>, StoreError>;
}

#[async_trait]
impl<S: Store + ?Sized> Disclosure for Transaction<S> {
    async fn content_hash(
        &mut self,
        namespace: &Namespace,
        key: &str,
    ) -> std::result::Result<Option<ContentHash>, StoreError> {
        Transaction::content_hash(self, namespace, key).await
    }
}

/// Content hash of `student` as registered by `org`.
///
/// Fails with `StudentNotFound` if `org` holds no such record.
pub async fn student_hash<D: Disclosure + ?Sized>(
    disclosure: &mut D,
    org: &Identity,
    student: &StudentId,
) -> Result<ContentHash> {
    let namespace = disclosure.private_namespace(org);
    disclosure
        .content_hash(&namespace, student.as_str())
        .await?
        .ok_or_else(|| LedgerError::StudentNotFound {
            org: org.clone(),
            student: student.clone(),
        })
}
