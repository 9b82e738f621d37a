//! # Sharebook
//!
//! A shared book-custody ledger for organizations that do not fully trust
//! one another.
//!
//! ## Overview
//!
//! - **Books** live in the public namespace. Each has an owner, a list of
//!   entitled organizations, a list of vetted reader hashes, a holder and a
//!   FIFO request queue.
//! - **Students** live in their organization's private namespace. Other
//!   organizations only ever see the content hash of a student record.
//! - **Lending** is gated twice: the caller's organization must be entitled,
//!   and the named student's hash must have been vetted by the owner.
//!
//! Every operation runs as one transaction against a [`store::Store`] and
//! either commits in full or writes nothing.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sharebook::core::{Identity, StudentInput};
//! use sharebook::store::SqliteStore;
//! use sharebook::{CallContext, Ledger, LedgerConfig, SubjectOracle};
//!
//! async fn example() -> sharebook::Result<()> {
//!     let store = Arc::new(SqliteStore::open("sharebook.db")?);
//!     let ledger = Ledger::new(store, Arc::new(SubjectOracle), LedgerConfig::default());
//!
//!     let owner = CallContext::new("Admin@org1.example.com");
//!     let book = ledger.create_book(&owner, "Dune", "Frank Herbert", "978-0441013593").await?;
//!
//!     // Org2 registers a student and the owner vets it.
//!     let org2 = CallContext::new("Admin@org2.example.com")
//!         .with_student(&StudentInput::new("Ada", "555-0100", "ada@example.com"))?;
//!     let student = ledger.register_student(&org2).await?;
//!     let org2_id = Identity::parse("Admin@org2.example.com")?;
//!     ledger.grant_book(&owner, &book, &org2_id, &student).await?;
//!
//!     ledger.borrow_book(&org2, &book, &student).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `sharebook::core` - value types, records, credentials
//! - `sharebook::store` - the transactional store and its backends

pub mod config;
pub mod counter;
pub mod error;
pub mod identity;
pub mod ledger;
mod lending;
mod registry;
pub mod verify;

pub use sharebook_core as core;
pub use sharebook_store as store;

pub use config::{AdminPolicy, LedgerConfig};
pub use error::{LedgerError, Result};
pub use identity::{
    CallContext, CertificateOracle, IdentityOracle, StaticOracle, SubjectOracle,
    STUDENT_PROPERTIES,
};
pub use ledger::Ledger;
pub use verify::{student_hash, Disclosure};

pub use sharebook_core::{
    Book, BookId, BookRequester, BookState, ContentHash, Credential, Identity, Keypair, Release,
    Student, StudentId, StudentInput,
};
