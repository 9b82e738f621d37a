//! Book lending.
//!
//! Every operation reads the book, validates against it, and writes it
//! back inside one transaction, so two callers racing for the same book
//! cannot both commit.
//!
//! Eligibility to borrow or queue is two-layered: the caller's
//! organization must be on the book's entitle list, and the content hash
//! of the named student in that organization's private namespace must be
//! on its reader list. The owner never sees the student record itself.

use sharebook_core::{
    decode_record, encode_record, Book, BookId, BookRequester, Identity, Namespace, Release,
    StudentId, TransitionError, BOOK_COUNTER_KEY, BOOK_KEY_PREFIX,
};
use sharebook_store::{Store, Transaction};
use tracing::{debug, info};

use crate::config::AdminPolicy;
use crate::counter::next_id;
use crate::error::{LedgerError, Result};
use crate::identity::CallContext;
use crate::ledger::{prefix_end, Ledger};
use crate::verify;

fn is_book_key(id: &BookId) -> bool {
    id.as_str().starts_with(BOOK_KEY_PREFIX)
}

async fn load_book<S: Store + ?Sized>(tx: &mut Transaction<S>, id: &BookId) -> Result<Book> {
    // The public namespace also holds the book counter.
    if !is_book_key(id) {
        return Err(LedgerError::BookNotFound(id.clone()));
    }
    match tx.get(&Namespace::Public, id.as_str()).await? {
        Some(bytes) => Ok(decode_record(&bytes)?),
        None => Err(LedgerError::BookNotFound(id.clone())),
    }
}

fn save_book<S: Store + ?Sized>(tx: &mut Transaction<S>, book: &Book) -> Result<()> {
    tx.put(&Namespace::Public, book.id.as_str(), encode_record(book)?)?;
    Ok(())
}

fn ensure_entitled(book: &Book, caller: &Identity) -> Result<()> {
    if book.is_entitled(caller) {
        Ok(())
    } else {
        Err(LedgerError::NotEntitled {
            book: book.id.clone(),
            caller: caller.clone(),
        })
    }
}

fn ensure_owner(book: &Book, caller: &Identity) -> Result<()> {
    if book.is_owned_by(caller) {
        Ok(())
    } else {
        Err(LedgerError::NotOwner {
            book: book.id.clone(),
            caller: caller.clone(),
        })
    }
}

fn transition_error(book: &BookId, err: TransitionError) -> LedgerError {
    match err {
        TransitionError::NotBorrowable => LedgerError::NotBorrowable(book.clone()),
        TransitionError::NotBorrowed => LedgerError::NotBorrowed(book.clone()),
        TransitionError::NotHolder(requester) => LedgerError::NotHolder {
            book: book.clone(),
            caller: requester.org,
            student: requester.student_id,
        },
    }
}

impl<S: Store + ?Sized> Ledger<S> {
    /// The student must resolve in the caller's namespace and its hash must
    /// have been vetted for this book.
    async fn ensure_vetted(
        &self,
        tx: &mut Transaction<S>,
        book: &Book,
        caller: &Identity,
        student: &StudentId,
    ) -> Result<()> {
        let not_entitled = || LedgerError::NotEntitled {
            book: book.id.clone(),
            caller: caller.clone(),
        };

        let hash = match verify::student_hash(tx, caller, student).await {
            Ok(hash) => hash,
            Err(LedgerError::StudentNotFound { .. }) => return Err(not_entitled()),
            Err(e) => return Err(e),
        };

        if self.config().trace_reader_hashes {
            debug!(book = %book.id, %student, %hash, "computed reader hash");
        }

        if book.is_vetted(&hash) {
            Ok(())
        } else {
            Err(not_entitled())
        }
    }

    /// Create a book owned by the caller and return its id.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn create_book(
        &self,
        ctx: &CallContext,
        title: &str,
        author: &str,
        isbn: &str,
    ) -> Result<BookId> {
        let (caller, mut tx) = self.begin(ctx)?;

        let seq = next_id(&mut tx, &Namespace::Public, BOOK_COUNTER_KEY).await?;
        let book = Book::new(BookId::from_seq(seq), title, author, isbn, caller.clone());
        save_book(&mut tx, &book)?;
        tx.commit().await?;

        info!(book = %book.id, owner = %caller, "book created");
        Ok(book.id)
    }

    /// Fetch a book the caller is entitled to.
    #[tracing::instrument(skip_all, fields(book = %id))]
    pub async fn get_book(&self, ctx: &CallContext, id: &BookId) -> Result<Book> {
        let (caller, mut tx) = self.begin(ctx)?;
        let book = load_book(&mut tx, id).await?;
        ensure_entitled(&book, &caller)?;
        Ok(book)
    }

    /// Whether a book with this id exists. Visible to every caller.
    #[tracing::instrument(skip_all, fields(book = %id))]
    pub async fn book_exists(&self, ctx: &CallContext, id: &BookId) -> Result<bool> {
        let (_caller, mut tx) = self.begin(ctx)?;
        if !is_book_key(id) {
            return Ok(false);
        }
        Ok(tx.get(&Namespace::Public, id.as_str()).await?.is_some())
    }

    /// Entitle `grantee`'s organization and vet its `student`.
    ///
    /// Only the owner may grant. The student's content hash is read from the
    /// grantee's private namespace, so the student must already be
    /// registered there.
    #[tracing::instrument(skip_all, fields(book = %id, grantee = %grantee, student = %student))]
    pub async fn grant_book(
        &self,
        ctx: &CallContext,
        id: &BookId,
        grantee: &Identity,
        student: &StudentId,
    ) -> Result<()> {
        let (caller, mut tx) = self.begin(ctx)?;
        let mut book = load_book(&mut tx, id).await?;
        ensure_owner(&book, &caller)?;

        let hash = verify::student_hash(&mut tx, grantee, student).await?;
        if self.config().trace_reader_hashes {
            debug!(%hash, "vetting reader hash");
        }

        book.grant(grantee.clone(), hash);
        save_book(&mut tx, &book)?;
        tx.commit().await?;

        info!("book granted");
        Ok(())
    }

    /// Borrow a free book for one of the caller's students.
    #[tracing::instrument(skip_all, fields(book = %id, student = %student))]
    pub async fn borrow_book(
        &self,
        ctx: &CallContext,
        id: &BookId,
        student: &StudentId,
    ) -> Result<()> {
        let (caller, mut tx) = self.begin(ctx)?;
        let mut book = load_book(&mut tx, id).await?;
        ensure_entitled(&book, &caller)?;
        if book.is_borrowed() {
            return Err(LedgerError::NotBorrowable(id.clone()));
        }
        self.ensure_vetted(&mut tx, &book, &caller, student).await?;

        book.lend_to(BookRequester::new(caller.clone(), student.clone()))
            .map_err(|e| transition_error(id, e))?;
        save_book(&mut tx, &book)?;
        tx.commit().await?;

        info!(holder = %caller, "book borrowed");
        Ok(())
    }

    /// Queue for a borrowed book on behalf of one of the caller's students.
    #[tracing::instrument(skip_all, fields(book = %id, student = %student))]
    pub async fn request_book(
        &self,
        ctx: &CallContext,
        id: &BookId,
        student: &StudentId,
    ) -> Result<()> {
        let (caller, mut tx) = self.begin(ctx)?;
        let mut book = load_book(&mut tx, id).await?;
        ensure_entitled(&book, &caller)?;
        if !book.is_borrowed() {
            return Err(LedgerError::NotBorrowed(id.clone()));
        }
        self.ensure_vetted(&mut tx, &book, &caller, student).await?;

        book.enqueue(BookRequester::new(caller.clone(), student.clone()))
            .map_err(|e| transition_error(id, e))?;
        let position = book.request_queue().len();
        save_book(&mut tx, &book)?;
        tx.commit().await?;

        info!(requester = %caller, position, "book requested");
        Ok(())
    }

    /// Return a book held by the caller's student.
    ///
    /// Possession passes straight to the head of the request queue if
    /// anyone is waiting; otherwise the book becomes free.
    #[tracing::instrument(skip_all, fields(book = %id, student = %student))]
    pub async fn return_book(
        &self,
        ctx: &CallContext,
        id: &BookId,
        student: &StudentId,
    ) -> Result<Release> {
        let (caller, mut tx) = self.begin(ctx)?;
        let mut book = load_book(&mut tx, id).await?;

        let returner = BookRequester::new(caller.clone(), student.clone());
        let release = book.release(&returner).map_err(|e| transition_error(id, e))?;

        // The returning student must still be on record.
        verify::student_hash(&mut tx, &caller, student).await?;

        save_book(&mut tx, &book)?;
        tx.commit().await?;

        match &release {
            Release::HandedOff(next) => {
                info!(holder = %next.org, next = %next.student_id, "book handed off")
            }
            Release::Freed => info!("book returned"),
        }
        Ok(release)
    }

    /// Hand ownership of a book to `new_owner`. Nothing but the owner
    /// changes.
    ///
    /// The new owner is not added to the entitle list. It can administer
    /// the book at once, but must grant itself before `get_book` or
    /// `list_books` will show it the record.
    #[tracing::instrument(skip_all, fields(book = %id, new_owner = %new_owner))]
    pub async fn transfer_book(
        &self,
        ctx: &CallContext,
        id: &BookId,
        new_owner: &Identity,
    ) -> Result<()> {
        let (caller, mut tx) = self.begin(ctx)?;
        let mut book = load_book(&mut tx, id).await?;
        match self.config().admin_policy {
            AdminPolicy::OwnerOnly => ensure_owner(&book, &caller)?,
            AdminPolicy::Legacy => ensure_entitled(&book, &caller)?,
        }

        book.transfer_to(new_owner.clone());
        save_book(&mut tx, &book)?;
        tx.commit().await?;

        info!(from = %caller, "book transferred");
        Ok(())
    }

    /// Overwrite a book's descriptive fields and owner.
    ///
    /// Under [`AdminPolicy::Legacy`] the whole record is replaced and its
    /// entitlements, readers, holder and queue are dropped.
    #[tracing::instrument(skip_all, fields(book = %id))]
    pub async fn update_book(
        &self,
        ctx: &CallContext,
        id: &BookId,
        title: &str,
        author: &str,
        isbn: &str,
        owner: &Identity,
    ) -> Result<()> {
        let (caller, mut tx) = self.begin(ctx)?;
        let mut book = load_book(&mut tx, id).await?;

        let book = match self.config().admin_policy {
            AdminPolicy::OwnerOnly => {
                ensure_owner(&book, &caller)?;
                book.redescribe(title, author, isbn, owner.clone());
                book
            }
            AdminPolicy::Legacy => Book::bare(id.clone(), title, author, isbn, owner.clone()),
        };
        save_book(&mut tx, &book)?;
        tx.commit().await?;

        info!(by = %caller, "book updated");
        Ok(())
    }

    /// Remove a book from the ledger.
    #[tracing::instrument(skip_all, fields(book = %id))]
    pub async fn delete_book(&self, ctx: &CallContext, id: &BookId) -> Result<()> {
        let (caller, mut tx) = self.begin(ctx)?;
        let book = load_book(&mut tx, id).await?;
        if self.config().admin_policy == AdminPolicy::OwnerOnly {
            ensure_owner(&book, &caller)?;
        }

        tx.delete(&Namespace::Public, id.as_str())?;
        tx.commit().await?;

        info!(by = %caller, "book deleted");
        Ok(())
    }

    /// Every book the caller is entitled to, in key order.
    #[tracing::instrument(skip_all)]
    pub async fn list_books(&self, ctx: &CallContext) -> Result<Vec<Book>> {
        let (caller, mut tx) = self.begin(ctx)?;

        let mut books = Vec::new();
        for (_key, bytes) in tx
            .range_scan(&Namespace::Public, BOOK_KEY_PREFIX, &prefix_end(BOOK_KEY_PREFIX))
            .await?
        {
            let book: Book = decode_record(&bytes)?;
            if book.is_entitled(&caller) {
                books.push(book);
            }
        }
        debug!(count = books.len(), "listed books");
        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sharebook_core::StudentInput;
    use sharebook_store::MemoryStore;

    use super::*;
    use crate::config::LedgerConfig;
    use crate::identity::SubjectOracle;

    const ORG1: &str = "Admin@org1.example.com";
    const ORG2: &str = "Admin@org2.example.com";

    fn ctx(caller: &str) -> CallContext {
        CallContext::new(caller.to_string())
    }

    fn ident(s: &str) -> Identity {
        Identity::parse(s).unwrap()
    }

    fn ledger(policy: AdminPolicy) -> Ledger<MemoryStore> {
        Ledger::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SubjectOracle),
            LedgerConfig::default().with_admin_policy(policy),
        )
    }

    async fn register(ledger: &Ledger<MemoryStore>, caller: &str) -> StudentId {
        let ctx = ctx(caller)
            .with_student(&StudentInput::new("Ada", "555-0100", "ada@example.com"))
            .unwrap();
        ledger.register_student(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let ledger = ledger(AdminPolicy::OwnerOnly);
        let a = ledger.create_book(&ctx(ORG1), "A", "a", "1").await.unwrap();
        let b = ledger.create_book(&ctx(ORG2), "B", "b", "2").await.unwrap();
        assert_eq!(a.as_str(), "book_1");
        assert_eq!(b.as_str(), "book_2");
    }

    #[tokio::test]
    async fn test_missing_book() {
        let ledger = ledger(AdminPolicy::OwnerOnly);
        let id = BookId::from_seq(9);
        assert!(matches!(
            ledger.get_book(&ctx(ORG1), &id).await,
            Err(LedgerError::BookNotFound(_))
        ));
        assert!(!ledger.book_exists(&ctx(ORG1), &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_requires_owner_and_registered_student() {
        let ledger = ledger(AdminPolicy::OwnerOnly);
        let id = ledger.create_book(&ctx(ORG1), "Dune", "Herbert", "1").await.unwrap();
        let student = register(&ledger, ORG2).await;

        let err = ledger
            .grant_book(&ctx(ORG2), &id, &ident(ORG2), &student)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotOwner { .. }));

        let ghost = StudentId::from_seq(99, "org2.example.com");
        let err = ledger
            .grant_book(&ctx(ORG1), &id, &ident(ORG2), &ghost)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::StudentNotFound { .. }));

        ledger
            .grant_book(&ctx(ORG1), &id, &ident(ORG2), &student)
            .await
            .unwrap();
        ledger
            .grant_book(&ctx(ORG1), &id, &ident(ORG2), &student)
            .await
            .unwrap();

        let book = ledger.get_book(&ctx(ORG2), &id).await.unwrap();
        assert_eq!(book.entitle_list(), &[ident(ORG1), ident(ORG2)]);
        assert_eq!(book.reader_list().len(), 1);
    }

    #[tokio::test]
    async fn test_borrow_unvetted_student_is_not_entitled() {
        let ledger = ledger(AdminPolicy::OwnerOnly);
        let id = ledger.create_book(&ctx(ORG1), "Dune", "Herbert", "1").await.unwrap();
        let vetted = register(&ledger, ORG2).await;
        let other = register(&ledger, ORG2).await;
        ledger
            .grant_book(&ctx(ORG1), &id, &ident(ORG2), &vetted)
            .await
            .unwrap();

        for student in [other, StudentId::from_seq(42, "org2.example.com")] {
            let err = ledger.borrow_book(&ctx(ORG2), &id, &student).await.unwrap_err();
            assert!(matches!(err, LedgerError::NotEntitled { .. }));
        }
        assert!(!ledger.get_book(&ctx(ORG1), &id).await.unwrap().is_borrowed());
    }

    #[tokio::test]
    async fn test_request_free_book_fails() {
        let ledger = ledger(AdminPolicy::OwnerOnly);
        let id = ledger.create_book(&ctx(ORG1), "Dune", "Herbert", "1").await.unwrap();
        let student = register(&ledger, ORG1).await;
        let err = ledger.request_book(&ctx(ORG1), &id, &student).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotBorrowed(_)));
    }

    #[tokio::test]
    async fn test_owner_only_admin_ops() {
        let ledger = ledger(AdminPolicy::OwnerOnly);
        let id = ledger.create_book(&ctx(ORG1), "Dune", "Herbert", "1").await.unwrap();
        let student = register(&ledger, ORG2).await;
        ledger
            .grant_book(&ctx(ORG1), &id, &ident(ORG2), &student)
            .await
            .unwrap();

        assert!(matches!(
            ledger.transfer_book(&ctx(ORG2), &id, &ident(ORG2)).await,
            Err(LedgerError::NotOwner { .. })
        ));
        assert!(matches!(
            ledger.delete_book(&ctx(ORG2), &id).await,
            Err(LedgerError::NotOwner { .. })
        ));

        ledger
            .update_book(&ctx(ORG1), &id, "Dune Messiah", "Herbert", "2", &ident(ORG1))
            .await
            .unwrap();
        let book = ledger.get_book(&ctx(ORG2), &id).await.unwrap();
        assert_eq!(book.title, "Dune Messiah");
        assert_eq!(book.reader_list().len(), 1);

        ledger.delete_book(&ctx(ORG1), &id).await.unwrap();
        assert!(!ledger.book_exists(&ctx(ORG1), &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_legacy_admin_ops() {
        let ledger = ledger(AdminPolicy::Legacy);
        let id = ledger.create_book(&ctx(ORG1), "Dune", "Herbert", "1").await.unwrap();
        let student = register(&ledger, ORG2).await;
        ledger
            .grant_book(&ctx(ORG1), &id, &ident(ORG2), &student)
            .await
            .unwrap();

        // Any entitled reader may transfer.
        ledger
            .transfer_book(&ctx(ORG2), &id, &ident(ORG2))
            .await
            .unwrap();
        assert_eq!(ledger.get_book(&ctx(ORG2), &id).await.unwrap().owner, ident(ORG2));

        // Update replaces the record wholesale, entitlements included.
        ledger
            .update_book(&ctx(ORG1), &id, "T", "A", "I", &ident(ORG1))
            .await
            .unwrap();
        assert!(matches!(
            ledger.get_book(&ctx(ORG1), &id).await,
            Err(LedgerError::NotEntitled { .. })
        ));

        ledger.delete_book(&ctx(ORG2), &id).await.unwrap();
        assert!(matches!(
            ledger.delete_book(&ctx(ORG2), &id).await,
            Err(LedgerError::BookNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_counter_key_is_not_a_book() {
        let ledger = ledger(AdminPolicy::OwnerOnly);
        ledger.create_book(&ctx(ORG1), "Dune", "Herbert", "1").await.unwrap();

        let id = BookId::from(BOOK_COUNTER_KEY);
        assert!(matches!(
            ledger.get_book(&ctx(ORG1), &id).await,
            Err(LedgerError::BookNotFound(_))
        ));
        assert!(matches!(
            ledger.delete_book(&ctx(ORG1), &id).await,
            Err(LedgerError::BookNotFound(_))
        ));
        assert!(!ledger.book_exists(&ctx(ORG1), &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_new_owner_must_grant_itself() {
        let ledger = ledger(AdminPolicy::OwnerOnly);
        let id = ledger.create_book(&ctx(ORG1), "Dune", "Herbert", "1").await.unwrap();
        ledger
            .transfer_book(&ctx(ORG1), &id, &ident(ORG2))
            .await
            .unwrap();

        assert!(matches!(
            ledger.get_book(&ctx(ORG2), &id).await,
            Err(LedgerError::NotEntitled { .. })
        ));
        assert!(ledger.list_books(&ctx(ORG2)).await.unwrap().is_empty());
        assert!(ledger.get_book(&ctx(ORG1), &id).await.is_ok());

        let student = register(&ledger, ORG2).await;
        ledger
            .grant_book(&ctx(ORG2), &id, &ident(ORG2), &student)
            .await
            .unwrap();
        let book = ledger.get_book(&ctx(ORG2), &id).await.unwrap();
        assert!(book.is_owned_by(&ident(ORG2)));
        assert_eq!(ledger.list_books(&ctx(ORG2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_traced_reader_hashes_do_not_change_outcomes() {
        let ledger = Ledger::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SubjectOracle),
            LedgerConfig {
                trace_reader_hashes: true,
                ..LedgerConfig::default()
            },
        );
        assert!(ledger.config().trace_reader_hashes);

        let id = ledger.create_book(&ctx(ORG1), "Dune", "Herbert", "1").await.unwrap();
        let student = register(&ledger, ORG2).await;
        ledger
            .grant_book(&ctx(ORG1), &id, &ident(ORG2), &student)
            .await
            .unwrap();
        ledger.borrow_book(&ctx(ORG2), &id, &student).await.unwrap();
        assert!(ledger.get_book(&ctx(ORG1), &id).await.unwrap().is_borrowed());
    }

    #[tokio::test]
    async fn test_list_books_filters_by_entitlement() {
        let ledger = ledger(AdminPolicy::OwnerOnly);
        ledger.create_book(&ctx(ORG1), "A", "a", "1").await.unwrap();
        ledger.create_book(&ctx(ORG2), "B", "b", "2").await.unwrap();
        ledger.create_book(&ctx(ORG1), "C", "c", "3").await.unwrap();

        let titles: Vec<String> = ledger
            .list_books(&ctx(ORG1))
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["A", "C"]);
    }
}
