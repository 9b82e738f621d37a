//! Strong type definitions for Sharebook.
//!
//! Identifiers are newtypes so a book id can never be passed where a
//! student id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key prefix shared by every book record in the public namespace.
pub const BOOK_KEY_PREFIX: &str = "book_";

/// Key prefix shared by every student record in a private namespace.
pub const STUDENT_KEY_PREFIX: &str = "student_";

/// Identifier of a book in the public namespace, e.g. `book_7`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Build the identifier for the `seq`-th minted book.
    pub fn from_seq(seq: u64) -> Self {
        Self(format!("{BOOK_KEY_PREFIX}{seq}"))
    }

    /// Wrap an identifier supplied by a caller.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookId({})", self.0)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a student, unique within its organization's private
/// namespace, e.g. `student_3@org2.example.com`.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    /// Build the identifier for the `seq`-th student registered under `domain`.
    pub fn from_seq(seq: u64, domain: &str) -> Self {
        Self(format!("{STUDENT_KEY_PREFIX}{seq}@{domain}"))
    }

    /// Wrap an identifier supplied by a caller.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StudentId({})", self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A partition of the ledger.
///
/// The public namespace is readable by every organization. Each
/// organization additionally owns one private namespace whose plaintext is
/// readable only by its members; everyone else sees content hashes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Public,
    Private(String),
}

impl Namespace {
    /// Stable name used as the storage partition key.
    pub fn name(&self) -> &str {
        match self {
            Namespace::Public => "",
            Namespace::Private(name) => name,
        }
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Public => f.write_str("Public"),
            Namespace::Private(name) => write!(f, "Private({name})"),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Public => f.write_str("<public>"),
            Namespace::Private(name) => f.write_str(name),
        }
    }
}
