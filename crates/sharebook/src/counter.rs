//! Sequence counters that mint entity identifiers.
//!
//! A counter is an ordinary versioned record, read, advanced and written
//! inside the transaction that consumes the new value. Two transactions
//! minting from the same counter both read its version, so the store
//! rejects whichever commits second.

use sharebook_core::{decode_record, encode_record, Counter, Namespace};
use sharebook_store::{Store, Transaction};

use crate::error::Result;

/// Advance the counter at `namespace`/`key` and return the new value.
///
/// A missing counter starts from 0, so the first value minted is 1.
pub async fn next_id<S: Store + ?Sized>(
    tx: &mut Transaction<S>,
    namespace: &Namespace,
    key: &str,
) -> Result<u64> {
    let mut counter: Counter = match tx.get(namespace, key).await? {
        Some(bytes) => decode_record(&bytes)?,
        None => Counter::default(),
    };

    let next = counter.advance();
    tx.put(namespace, key, encode_record(&counter)?)?;
    Ok(next)
}
