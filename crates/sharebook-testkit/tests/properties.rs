//! Lending invariants over random operation sequences.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use sharebook::core::{decode_record, Book, BookId, Namespace};
use sharebook::store::Store;
use sharebook::{LedgerError, Release};
use sharebook_testkit::generators::student_input;
use sharebook_testkit::{ops, Consortium, Op};

const ORGS: usize = 3;
const BOOKS: u64 = 3;
const STUDENTS: u64 = 3;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

/// Every book currently on the ledger, read straight from the store.
async fn all_books(consortium: &Consortium) -> Vec<Book> {
    consortium
        .ledger()
        .store()
        .scan(&Namespace::Public, "book_", "book`")
        .await
        .unwrap()
        .into_iter()
        .filter_map(|(_, versioned)| versioned.value)
        .map(|bytes| decode_record(&bytes).unwrap())
        .collect()
}

async fn book(consortium: &Consortium, seq: u64) -> Option<Book> {
    all_books(consortium)
        .await
        .into_iter()
        .find(|b| b.id == BookId::from_seq(seq))
}

/// Whether `org`'s `student` is eligible for `book` right now.
async fn eligible(consortium: &Consortium, book: &Book, org: usize, student: u64) -> bool {
    let member = consortium.member(org);
    if !book.is_entitled(&member.identity) {
        return false;
    }
    match consortium
        .ledger()
        .student_hash(member.ctx(), &member.identity, &member.student(student))
        .await
    {
        Ok(hash) => book.is_vetted(&hash),
        Err(_) => false,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn free_books_have_no_holder_or_queue(script in ops(ORGS, BOOKS, STUDENTS, 48)) {
        let result: Result<(), TestCaseError> = runtime().block_on(async {
            let consortium = Consortium::new(ORGS).unwrap();
            for op in &script {
                let _ = consortium.apply(op).await;
                for book in all_books(&consortium).await {
                    prop_assert!(book.invariants_hold(), "{:?} after {:?}", book.id, op);
                    if !book.is_borrowed() {
                        prop_assert!(book.holder().is_none());
                        prop_assert_eq!(book.request_queue().len(), 0);
                    }
                }
            }
            Ok(())
        });
        result?;
    }

    #[test]
    fn borrow_succeeds_iff_entitled_and_vetted(script in ops(ORGS, BOOKS, STUDENTS, 48)) {
        let result: Result<(), TestCaseError> = runtime().block_on(async {
            let consortium = Consortium::new(ORGS).unwrap();
            for op in &script {
                let Op::Borrow { org, book: seq, student } = *op else {
                    let _ = consortium.apply(op).await;
                    continue;
                };

                let before = book(&consortium, seq).await;
                let outcome = consortium.apply(op).await;
                match before {
                    None => prop_assert!(matches!(outcome, Err(LedgerError::BookNotFound(_))), "{:?}", outcome),
                    Some(b) if !b.is_entitled(&consortium.member(org).identity) => {
                        prop_assert!(matches!(outcome, Err(LedgerError::NotEntitled { .. })), "{:?}", outcome)
                    }
                    Some(b) if b.is_borrowed() => {
                        prop_assert!(matches!(outcome, Err(LedgerError::NotBorrowable(_))), "{:?}", outcome)
                    }
                    Some(b) => {
                        let expect_ok = eligible(&consortium, &b, org, student).await;
                        prop_assert_eq!(outcome.is_ok(), expect_ok, "{:?}", outcome);
                        if !expect_ok {
                            prop_assert!(matches!(outcome, Err(LedgerError::NotEntitled { .. })), "{:?}", outcome);
                        }
                    }
                }
            }
            Ok(())
        });
        result?;
    }

    #[test]
    fn return_by_non_holder_always_fails(script in ops(ORGS, BOOKS, STUDENTS, 48)) {
        let result: Result<(), TestCaseError> = runtime().block_on(async {
            let consortium = Consortium::new(ORGS).unwrap();
            for op in &script {
                let Op::Return { org, book: seq, student } = *op else {
                    let _ = consortium.apply(op).await;
                    continue;
                };

                let before = book(&consortium, seq).await;
                let outcome = consortium
                    .ledger()
                    .return_book(
                        consortium.member(org).ctx(),
                        &BookId::from_seq(seq),
                        &consortium.member(org).student(student),
                    )
                    .await;

                let Some(b) = before else {
                    prop_assert!(matches!(outcome, Err(LedgerError::BookNotFound(_))), "{:?}", outcome);
                    continue;
                };
                let Some(holder) = b.holder() else {
                    prop_assert!(matches!(outcome, Err(LedgerError::NotBorrowed(_))), "{:?}", outcome);
                    continue;
                };

                let is_holder = holder.org == consortium.member(org).identity
                    && holder.student_id == consortium.member(org).student(student);
                if !is_holder {
                    prop_assert!(matches!(outcome, Err(LedgerError::NotHolder { .. })), "{:?}", outcome);
                    continue;
                }

                // The holder's student was registered, or it could not have borrowed.
                let release = outcome.map_err(|e| TestCaseError::fail(e.to_string()))?;
                let after = book(&consortium, seq).await.unwrap();
                let head = b.request_queue().next().cloned();
                match (head, release) {
                    (Some(next), Release::HandedOff(handed)) => {
                        prop_assert_eq!(&handed, &next);
                        prop_assert_eq!(after.holder(), Some(&next));
                    }
                    (None, Release::Freed) => prop_assert!(!after.is_borrowed()),
                    (queued, release) => {
                        return Err(TestCaseError::fail(format!("{queued:?} but {release:?}")))
                    }
                }
            }
            Ok(())
        });
        result?;
    }

    #[test]
    fn registered_inputs_are_listed_back(inputs in prop::collection::vec(student_input(), 1..5)) {
        let result: Result<(), TestCaseError> = runtime().block_on(async {
            let consortium = Consortium::new(2).unwrap();
            for input in &inputs {
                consortium.register(0, input).await.unwrap();
            }

            let listed = consortium
                .ledger()
                .list_students(consortium.member(0).ctx())
                .await
                .unwrap();
            prop_assert_eq!(listed.len(), inputs.len());
            for (student, input) in listed.iter().zip(&inputs) {
                prop_assert_eq!(&student.name, &input.name);
                prop_assert_eq!(&student.org, &consortium.member(0).identity);
            }

            let other = consortium
                .ledger()
                .list_students(consortium.member(1).ctx())
                .await
                .unwrap();
            prop_assert!(other.is_empty());
            Ok(())
        });
        result?;
    }
}
