//! # Sharebook Core
//!
//! Pure value types for the Sharebook ledger: identities, namespaces, books,
//! students, and content hashes.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Identity`] - An organization-qualified principal, parsed once at the boundary
//! - [`Namespace`] - The public namespace or one organization's private namespace
//! - [`Book`] - A shared book and its lending state machine
//! - [`Student`] - A privately held student record
//! - [`ContentHash`] - Blake3 hash of a stored record, the only cross-organization view of a student
//!
//! ## Encoding
//!
//! Records are stored as deterministic CBOR. See [`canonical`].

pub mod book;
pub mod canonical;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod student;
pub mod types;

pub use book::{Book, BookRequester, BookState, Release, TransitionError};
pub use canonical::{decode_record, encode_record};
pub use credential::Credential;
pub use crypto::{ContentHash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use error::{CoreError, Result};
pub use identity::{msp_id, Identity};
pub use student::{Counter, Student, StudentInput, BOOK_COUNTER_KEY, STUDENT_COUNTER_KEY};
pub use types::{BookId, Namespace, StudentId, BOOK_KEY_PREFIX, STUDENT_KEY_PREFIX};
