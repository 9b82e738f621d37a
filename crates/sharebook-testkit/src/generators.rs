//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sharebook_core::{Identity, Keypair, StudentId, StudentInput};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate an organization-qualified identity, e.g. `Admin@org3.example.com`.
pub fn identity() -> impl Strategy<Value = Identity> {
    ("[A-Z][a-zA-Z0-9]{0,8}", 1u8..=9)
        .prop_filter_map("well-formed identity", |(principal, org)| {
            Identity::parse(&format!("{principal}@org{org}.example.com")).ok()
        })
}

/// Generate a student id within the first `max` minted by `identity`'s
/// organization.
pub fn student_id(identity: Identity, max: u64) -> impl Strategy<Value = StudentId> {
    (1..=max).prop_map(move |seq| StudentId::from_seq(seq, identity.domain()))
}

/// Generate registration fields.
pub fn student_input() -> impl Strategy<Value = StudentInput> {
    ("[A-Z][a-z]{1,12}", "[0-9]{3}-[0-9]{4}", "[a-z]{1,8}@[a-z]{1,8}\\.com")
        .prop_map(|(name, phone, email)| StudentInput::new(name, phone, email))
}

/// One ledger invocation, with organizations, books and students named by
/// index so a sequence can be replayed against any [`Consortium`].
///
/// [`Consortium`]: crate::fixtures::Consortium
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Register { org: usize },
    Create { org: usize },
    Grant { org: usize, book: u64, grantee: usize, student: u64 },
    Borrow { org: usize, book: u64, student: u64 },
    Request { org: usize, book: u64, student: u64 },
    Return { org: usize, book: u64, student: u64 },
    Transfer { org: usize, book: u64, new_owner: usize },
}

impl Op {
    /// Index of the invoking organization.
    pub fn caller(&self) -> usize {
        match *self {
            Op::Register { org }
            | Op::Create { org }
            | Op::Grant { org, .. }
            | Op::Borrow { org, .. }
            | Op::Request { org, .. }
            | Op::Return { org, .. }
            | Op::Transfer { org, .. } => org,
        }
    }
}

/// Generate an operation over `orgs` organizations, `books` books and
/// `students` students per organization.
///
/// Lending operations are weighted up so random sequences actually reach
/// borrowed states.
pub fn op(orgs: usize, books: u64, students: u64) -> impl Strategy<Value = Op> {
    let org = 0..orgs;
    let book = 1..=books;
    let student = 1..=students;
    prop_oneof![
        1 => org.clone().prop_map(|org| Op::Register { org }),
        1 => org.clone().prop_map(|org| Op::Create { org }),
        3 => (org.clone(), book.clone(), org.clone(), student.clone())
            .prop_map(|(org, book, grantee, student)| Op::Grant { org, book, grantee, student }),
        3 => (org.clone(), book.clone(), student.clone())
            .prop_map(|(org, book, student)| Op::Borrow { org, book, student }),
        2 => (org.clone(), book.clone(), student.clone())
            .prop_map(|(org, book, student)| Op::Request { org, book, student }),
        3 => (org.clone(), book.clone(), student.clone())
            .prop_map(|(org, book, student)| Op::Return { org, book, student }),
        1 => (org.clone(), book, org)
            .prop_map(|(org, book, new_owner)| Op::Transfer { org, book, new_owner }),
    ]
}

/// Generate a sequence of up to `max_len` operations.
pub fn ops(
    orgs: usize,
    books: u64,
    students: u64,
    max_len: usize,
) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op(orgs, books, students), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharebook_core::Credential;

    proptest! {
        #[test]
        fn test_credentials_verify_for_any_issuer(id in identity(), issuer in keypair()) {
            let credential = Credential::issue(&id, &issuer);
            let decoded = Credential::from_bytes(&credential.to_bytes().unwrap()).unwrap();
            prop_assert_eq!(decoded.verify().unwrap(), id);
            prop_assert_eq!(decoded.issuer, issuer.public_key());
        }

        #[test]
        fn test_identities_round_trip_through_display(id in identity()) {
            let reparsed = Identity::parse(&id.to_string()).unwrap();
            prop_assert_eq!(&reparsed, &id);
            prop_assert!(id.organization().starts_with("org"));
        }

        #[test]
        fn test_ops_stay_in_bounds(ops in ops(3, 4, 4, 32)) {
            for op in &ops {
                prop_assert!(op.caller() < 3);
                match *op {
                    Op::Grant { book, grantee, student, .. } => {
                        prop_assert!((1..=4).contains(&book));
                        prop_assert!(grantee < 3);
                        prop_assert!((1..=4).contains(&student));
                    }
                    Op::Transfer { new_owner, .. } => prop_assert!(new_owner < 3),
                    _ => {}
                }
            }
        }

        #[test]
        fn test_student_ids_carry_org_domain(id in identity().prop_flat_map(|i| student_id(i, 10))) {
            prop_assert!(id.as_str().starts_with("student_"));
            prop_assert!(id.as_str().ends_with(".example.com"));
        }
    }
}
