//! The Ledger: the operation surface shared by every organization.
//!
//! Each operation resolves its caller once through the [`IdentityOracle`],
//! runs as a single [`Transaction`] scoped to the caller's private
//! namespace, and commits only when every check has passed. Nothing is
//! cached between operations; every call re-derives state from the store.

use std::sync::Arc;

use sharebook_core::{ContentHash, Identity, StudentId};
use sharebook_store::{Store, Transaction};

use crate::config::LedgerConfig;
use crate::error::Result;
use crate::identity::{CallContext, IdentityOracle};
use crate::verify;

/// The shared book-custody ledger.
pub struct Ledger<S: Store + ?Sized> {
    /// The storage backend.
    store: Arc<S>,
    /// Resolves callers from invocation credentials.
    oracle: Arc<dyn IdentityOracle>,
    /// Configuration.
    config: LedgerConfig,
}

impl<S: Store + ?Sized> Ledger<S> {
    /// Create a ledger over `store`.
    pub fn new(store: Arc<S>, oracle: Arc<dyn IdentityOracle>, config: LedgerConfig) -> Self {
        Self {
            store,
            oracle,
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Resolve the caller and open a transaction on their behalf.
    pub(crate) fn begin(&self, ctx: &CallContext) -> Result<(Identity, Transaction<S>)> {
        let caller = self.oracle.resolve_caller(ctx)?;
        let tx = Transaction::begin(self.store.clone(), caller.private_namespace());
        Ok((caller, tx))
    }

    /// Content hash of `student` as registered by `org`.
    ///
    /// Lets a client pre-compute the reader hash a grant will append.
    #[tracing::instrument(skip_all, fields(org = %org, student = %student))]
    pub async fn student_hash(
        &self,
        ctx: &CallContext,
        org: &Identity,
        student: &StudentId,
    ) -> Result<ContentHash> {
        let (_caller, mut tx) = self.begin(ctx)?;
        verify::student_hash(&mut tx, org, student).await
    }
}

/// Exclusive upper bound of the key range sharing `prefix`.
pub(crate) fn prefix_end(prefix: &str) -> String {
    let mut end = prefix.to_string();
    if let Some(last) = end.pop() {
        end.push(char::from_u32(last as u32 + 1).unwrap_or(char::MAX));
    }
    end
}
