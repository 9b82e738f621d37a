//! # Sharebook Store
//!
//! The transactional key/value substrate the ledger runs on. Provides a
//! trait-based interface with SQLite and in-memory implementations, and a
//! [`Transaction`] type that turns them into read-modify-write units.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`Transaction`] - Buffered writes plus a versioned read set
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sharebook_core::Namespace;
//! use sharebook_store::{SqliteStore, Transaction};
//!
//! async fn example() {
//!     let store = Arc::new(SqliteStore::open("ledger.db").unwrap());
//!     let private = Namespace::Private("_implicit_org_Org1MSP".into());
//!
//!     let mut tx = Transaction::begin(store, private);
//!     tx.put(&Namespace::Public, "book_1", b"...".to_vec()).unwrap();
//!     tx.commit().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic commits**: a write set is applied whole or not at all
//! - **Conflict detection**: a commit fails if any key it read has moved on
//! - **Private namespaces**: plaintext is readable only by the owning organization

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;
pub mod tx;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ReadVersion, Store, Versioned, WriteOp, WriteSet};
pub use tx::{RangeScan, Transaction};
