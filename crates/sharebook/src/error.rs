//! Error types for the ledger.

use sharebook_core::{BookId, CoreError, Identity, StudentId};
use sharebook_store::StoreError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
///
/// Every error aborts the enclosing transaction; nothing it wrote is
/// committed.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The caller's credential could not be decoded or verified.
    #[error("failed to parse caller identity: {0}")]
    IdentityParse(String),

    /// The referenced book does not exist.
    #[error("the book {0} does not exist")]
    BookNotFound(BookId),

    /// The caller does not own the book.
    #[error("the book {book} is not owned by {caller}")]
    NotOwner { book: BookId, caller: Identity },

    /// The caller is not entitled to the book, or the student is not vetted.
    #[error("the book {book} is not entitled to {caller}")]
    NotEntitled { book: BookId, caller: Identity },

    /// The caller and student are not the book's current holder.
    #[error("the book {book} is not borrowed by {caller} for {student}")]
    NotHolder {
        book: BookId,
        caller: Identity,
        student: StudentId,
    },

    /// The book is free, so it cannot be returned or queued for.
    #[error("the book {0} is not borrowed")]
    NotBorrowed(BookId),

    /// The book is already borrowed.
    #[error("the book {0} has been borrowed")]
    NotBorrowable(BookId),

    /// No such student in the organization's private namespace.
    #[error("cannot find student {student} of {org}")]
    StudentNotFound { org: Identity, student: StudentId },

    /// Missing or malformed invocation payload.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Storage error, propagated verbatim.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A stored record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CoreError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
