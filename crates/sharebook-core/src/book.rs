//! Book records and the lending state machine.
//!
//! A book is either `Free` (no holder, empty queue) or `Borrowed` (a holder,
//! plus a FIFO of waiting requesters). The lending fields are private and
//! only move through the transition methods below, so a `Free` book with a
//! dangling holder or queue cannot be constructed.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::ContentHash;
use crate::identity::Identity;
use crate::types::{BookId, StudentId};

/// An (organization, student) pair holding or waiting for a book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookRequester {
    pub org: Identity,
    pub student_id: StudentId,
}

impl BookRequester {
    pub fn new(org: Identity, student_id: StudentId) -> Self {
        Self { org, student_id }
    }
}

/// Lending state of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookState {
    Free,
    Borrowed,
}

/// A lending transition that is not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("book is already borrowed")]
    NotBorrowable,

    #[error("book is not borrowed")]
    NotBorrowed,

    #[error("book is not held by {0:?}")]
    NotHolder(BookRequester),
}

/// What happened to possession when the holder returned the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// The head of the queue now holds the book; it stays borrowed.
    HandedOff(BookRequester),
    /// Nobody was waiting; the book is free.
    Freed,
}

/// A book in the public namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub owner: Identity,
    holder: Option<BookRequester>,
    request_queue: VecDeque<BookRequester>,
    entitle_list: Vec<Identity>,
    reader_list: Vec<ContentHash>,
}

impl Book {
    /// A freshly created book: free, entitled only to its owner.
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        owner: Identity,
    ) -> Self {
        let mut book = Self::bare(id, title, author, isbn, owner);
        book.entitle_list.push(book.owner.clone());
        book
    }

    /// A book with descriptive fields only: no entitlements, readers, holder
    /// or queue. Used by the legacy full-replacement update.
    pub fn bare(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        owner: Identity,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            owner,
            holder: None,
            request_queue: VecDeque::new(),
            entitle_list: Vec::new(),
            reader_list: Vec::new(),
        }
    }

    pub fn state(&self) -> BookState {
        if self.holder.is_some() {
            BookState::Borrowed
        } else {
            BookState::Free
        }
    }

    pub fn is_borrowed(&self) -> bool {
        self.state() == BookState::Borrowed
    }

    pub fn holder(&self) -> Option<&BookRequester> {
        self.holder.as_ref()
    }

    pub fn request_queue(&self) -> impl ExactSizeIterator<Item = &BookRequester> {
        self.request_queue.iter()
    }

    pub fn entitle_list(&self) -> &[Identity] {
        &self.entitle_list
    }

    pub fn reader_list(&self) -> &[ContentHash] {
        &self.reader_list
    }

    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        &self.owner == identity
    }

    /// Whether `identity` may view the book and have its students considered.
    pub fn is_entitled(&self, identity: &Identity) -> bool {
        self.entitle_list.contains(identity)
    }

    /// Whether a student record with this content hash has been vetted.
    pub fn is_vetted(&self, hash: &ContentHash) -> bool {
        self.reader_list.contains(hash)
    }

    /// Record an entitlement for `grantee` and vet the student behind `hash`.
    ///
    /// Both lists behave as sets; a repeated grant leaves them unchanged.
    pub fn grant(&mut self, grantee: Identity, hash: ContentHash) {
        if !self.entitle_list.contains(&grantee) {
            self.entitle_list.push(grantee);
        }
        if !self.reader_list.contains(&hash) {
            self.reader_list.push(hash);
        }
    }

    /// `Free -> Borrowed`, held by `requester`.
    pub fn lend_to(&mut self, requester: BookRequester) -> Result<(), TransitionError> {
        if self.is_borrowed() {
            return Err(TransitionError::NotBorrowable);
        }
        self.holder = Some(requester);
        Ok(())
    }

    /// Queue `requester` behind the current holder.
    pub fn enqueue(&mut self, requester: BookRequester) -> Result<(), TransitionError> {
        if !self.is_borrowed() {
            return Err(TransitionError::NotBorrowed);
        }
        self.request_queue.push_back(requester);
        Ok(())
    }

    /// Give the book back.
    ///
    /// Possession moves straight to the head of the queue when someone is
    /// waiting, so there is no window in which a queued book is free.
    pub fn release(&mut self, returner: &BookRequester) -> Result<Release, TransitionError> {
        match &self.holder {
            None => return Err(TransitionError::NotBorrowed),
            Some(holder) if holder != returner => {
                return Err(TransitionError::NotHolder(returner.clone()))
            }
            Some(_) => {}
        }

        match self.request_queue.pop_front() {
            Some(next) => {
                self.holder = Some(next.clone());
                Ok(Release::HandedOff(next))
            }
            None => {
                self.holder = None;
                Ok(Release::Freed)
            }
        }
    }

    /// Rewrite the owner and nothing else.
    pub fn transfer_to(&mut self, new_owner: Identity) {
        self.owner = new_owner;
    }

    /// Overwrite the descriptive fields and owner, keeping lending state.
    pub fn redescribe(
        &mut self,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        owner: Identity,
    ) {
        self.title = title.into();
        self.author = author.into();
        self.isbn = isbn.into();
        self.owner = owner;
    }

    /// `Free` implies no holder and an empty queue.
    pub fn invariants_hold(&self) -> bool {
        self.is_borrowed() || self.request_queue.is_empty()
    }
}
