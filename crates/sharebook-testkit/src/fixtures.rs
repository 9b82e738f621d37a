//! Test fixtures and helpers.
//!
//! A [`Consortium`] is a ledger over a memory store shared by several
//! organizations, each with its own credential issuer. Callers are
//! authenticated through a [`CertificateOracle`] exactly as in production.

use std::sync::Arc;

use sharebook::{
    CallContext, CertificateOracle, Credential, Ledger, LedgerConfig, Result, Release,
};
use sharebook_core::{BookId, Identity, Keypair, StudentId, StudentInput};
use sharebook_store::MemoryStore;

use crate::generators::Op;

/// One organization's administrator and the key that vouches for them.
pub struct Member {
    pub identity: Identity,
    pub issuer: Keypair,
    ctx: CallContext,
}

impl Member {
    /// Member `index` of a consortium, e.g. `Admin@org1.example.com` for 0.
    pub fn new(index: usize) -> Result<Self> {
        let mut seed = [0u8; 32];
        seed[..8].copy_from_slice(&(index as u64 + 1).to_le_bytes());
        let issuer = Keypair::from_seed(&seed);

        let identity = Identity::parse(&format!("Admin@org{}.example.com", index + 1))?;
        let ctx = CallContext::from_credential(&Credential::issue(&identity, &issuer))?;
        Ok(Self {
            identity,
            issuer,
            ctx,
        })
    }

    /// Invocation context carrying this member's signed credential.
    pub fn ctx(&self) -> &CallContext {
        &self.ctx
    }

    /// The `seq`-th student this member's organization registered.
    pub fn student(&self, seq: u64) -> StudentId {
        StudentId::from_seq(seq, self.identity.domain())
    }
}

/// Several organizations sharing one ledger.
pub struct Consortium {
    members: Vec<Member>,
    ledger: Ledger<MemoryStore>,
}

impl Consortium {
    /// A consortium of `size` organizations with the default configuration.
    pub fn new(size: usize) -> Result<Self> {
        Self::with_config(size, LedgerConfig::default())
    }

    pub fn with_config(size: usize, config: LedgerConfig) -> Result<Self> {
        let members = (0..size).map(Member::new).collect::<Result<Vec<_>>>()?;
        let oracle = members.iter().fold(CertificateOracle::new(), |oracle, m| {
            oracle.trust(m.identity.organization(), m.issuer.public_key())
        });
        let ledger = Ledger::new(Arc::new(MemoryStore::new()), Arc::new(oracle), config);
        Ok(Self { members, ledger })
    }

    pub fn ledger(&self) -> &Ledger<MemoryStore> {
        &self.ledger
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Panics if `index` is out of range.
    pub fn member(&self, index: usize) -> &Member {
        &self.members[index]
    }

    /// Register a student for member `index`.
    pub async fn register(&self, index: usize, input: &StudentInput) -> Result<StudentId> {
        let ctx = self.member(index).ctx().clone().with_student(input)?;
        self.ledger.register_student(&ctx).await
    }

    /// Run one generated operation against the ledger.
    pub async fn apply(&self, op: &Op) -> Result<()> {
        let caller = self.member(op.caller());
        let ctx = caller.ctx();
        match *op {
            Op::Register { org } => {
                let input = StudentInput::new(
                    format!("student of org{}", org + 1),
                    "555-0100",
                    "student@example.com",
                );
                self.register(org, &input).await.map(drop)
            }
            Op::Create { .. } => self
                .ledger
                .create_book(ctx, "Dune", "Frank Herbert", "978-0441013593")
                .await
                .map(drop),
            Op::Grant {
                book,
                grantee,
                student,
                ..
            } => {
                let grantee = self.member(grantee);
                self.ledger
                    .grant_book(
                        ctx,
                        &BookId::from_seq(book),
                        &grantee.identity,
                        &grantee.student(student),
                    )
                    .await
            }
            Op::Borrow { book, student, .. } => {
                self.ledger
                    .borrow_book(ctx, &BookId::from_seq(book), &caller.student(student))
                    .await
            }
            Op::Request { book, student, .. } => {
                self.ledger
                    .request_book(ctx, &BookId::from_seq(book), &caller.student(student))
                    .await
            }
            Op::Return { book, student, .. } => self
                .ledger
                .return_book(ctx, &BookId::from_seq(book), &caller.student(student))
                .await
                .map(|_: Release| ()),
            Op::Transfer {
                book, new_owner, ..
            } => {
                self.ledger
                    .transfer_book(
                        ctx,
                        &BookId::from_seq(book),
                        &self.member(new_owner).identity,
                    )
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_are_distinct_orgs() {
        let consortium = Consortium::new(3).unwrap();
        let orgs: Vec<&str> = consortium
            .members()
            .iter()
            .map(|m| m.identity.organization())
            .collect();
        assert_eq!(orgs, vec!["org1", "org2", "org3"]);
        assert_ne!(
            consortium.member(0).issuer.public_key(),
            consortium.member(1).issuer.public_key()
        );
    }

    #[tokio::test]
    async fn test_apply_scripted_lending() {
        let consortium = Consortium::new(2).unwrap();
        let script = [
            Op::Create { org: 0 },
            Op::Register { org: 1 },
            Op::Grant {
                org: 0,
                book: 1,
                grantee: 1,
                student: 1,
            },
            Op::Borrow {
                org: 1,
                book: 1,
                student: 1,
            },
        ];
        for op in &script {
            consortium.apply(op).await.unwrap();
        }

        let book = consortium
            .ledger()
            .get_book(consortium.member(1).ctx(), &BookId::from_seq(1))
            .await
            .unwrap();
        assert!(book.is_borrowed());
    }
}
