//! Caller identity resolution.
//!
//! Every invocation carries the caller's credential bytes and an optional
//! transient map of private inputs that never reach the ledger. An
//! [`IdentityOracle`] turns the credential into a structured [`Identity`]
//! once, before the operation starts.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use sharebook_core::{Credential, Ed25519PublicKey, Identity, StudentInput};

use crate::error::{LedgerError, Result};

/// Transient key holding a student's registration fields as JSON.
pub const STUDENT_PROPERTIES: &str = "student_properties";

/// An in-flight invocation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    creator: Bytes,
    transient: BTreeMap<String, Bytes>,
}

impl CallContext {
    /// An invocation submitted with the given creator credential bytes.
    pub fn new(creator: impl Into<Bytes>) -> Self {
        Self {
            creator: creator.into(),
            transient: BTreeMap::new(),
        }
    }

    /// An invocation authenticated by a signed credential.
    pub fn from_credential(credential: &Credential) -> Result<Self> {
        Ok(Self::new(credential.to_bytes()?))
    }

    pub fn with_transient(mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.transient.insert(key.into(), value.into());
        self
    }

    /// Attach registration fields under [`STUDENT_PROPERTIES`].
    pub fn with_student(self, input: &StudentInput) -> Result<Self> {
        let json =
            serde_json::to_vec(input).map_err(|e| LedgerError::InvalidPayload(e.to_string()))?;
        Ok(self.with_transient(STUDENT_PROPERTIES, json))
    }

    pub fn creator(&self) -> &[u8] {
        &self.creator
    }

    pub fn transient(&self, key: &str) -> Option<&Bytes> {
        self.transient.get(key)
    }

    /// Decode the registration fields from the transient map.
    pub fn student_input(&self) -> Result<StudentInput> {
        let raw = self.transient(STUDENT_PROPERTIES).ok_or_else(|| {
            LedgerError::InvalidPayload(format!("{STUDENT_PROPERTIES} not found in transient map"))
        })?;
        serde_json::from_slice(raw).map_err(|e| LedgerError::InvalidPayload(e.to_string()))
    }
}

/// Resolves the authenticated caller of an invocation.
pub trait IdentityOracle: Send + Sync {
    /// Returns the caller, or `IdentityParse` if the credential cannot be
    /// decoded or matched.
    fn resolve_caller(&self, ctx: &CallContext) -> Result<Identity>;
}

/// Verifies Ed25519 credentials against each organization's issuer key.
#[derive(Debug, Clone, Default)]
pub struct CertificateOracle {
    issuers: HashMap<String, Ed25519PublicKey>,
}

impl CertificateOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `issuer` to vouch for principals of `organization`.
    pub fn trust(mut self, organization: impl Into<String>, issuer: Ed25519PublicKey) -> Self {
        self.issuers.insert(organization.into(), issuer);
        self
    }
}

impl IdentityOracle for CertificateOracle {
    fn resolve_caller(&self, ctx: &CallContext) -> Result<Identity> {
        let parse_err = |e: &dyn std::fmt::Display| LedgerError::IdentityParse(e.to_string());

        let credential = Credential::from_bytes(ctx.creator()).map_err(|e| parse_err(&e))?;
        let identity = credential.verify().map_err(|e| parse_err(&e))?;

        match self.issuers.get(identity.organization()) {
            Some(issuer) if *issuer == credential.issuer => Ok(identity),
            Some(_) => Err(LedgerError::IdentityParse(format!(
                "{identity} was not issued by {}",
                identity.msp_id()
            ))),
            None => Err(LedgerError::IdentityParse(format!(
                "no trusted issuer for organization {}",
                identity.organization()
            ))),
        }
    }
}

/// Takes the creator bytes as a plain identity string, unverified.
///
/// For tests and local tooling where every caller is trusted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectOracle;

impl IdentityOracle for SubjectOracle {
    fn resolve_caller(&self, ctx: &CallContext) -> Result<Identity> {
        let subject = std::str::from_utf8(ctx.creator())
            .map_err(|e| LedgerError::IdentityParse(e.to_string()))?;
        Identity::parse(subject).map_err(|e| LedgerError::IdentityParse(e.to_string()))
    }
}

/// Resolves every invocation to the same identity.
#[derive(Debug, Clone)]
pub struct StaticOracle(pub Identity);

impl IdentityOracle for StaticOracle {
    fn resolve_caller(&self, _ctx: &CallContext) -> Result<Identity> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharebook_core::Keypair;

    fn ident(s: &str) -> Identity {
        Identity::parse(s).unwrap()
    }

    #[test]
    fn test_certificate_oracle_accepts_trusted_issuer() {
        let org1 = Keypair::from_seed(&[1u8; 32]);
        let oracle = CertificateOracle::new().trust("org1", org1.public_key());

        let admin = ident("Admin@org1.example.com");
        let ctx = CallContext::from_credential(&Credential::issue(&admin, &org1)).unwrap();
        assert_eq!(oracle.resolve_caller(&ctx).unwrap(), admin);
    }

    #[test]
    fn test_certificate_oracle_rejects_cross_org_issuer() {
        let org1 = Keypair::from_seed(&[1u8; 32]);
        let org2 = Keypair::from_seed(&[2u8; 32]);
        let oracle = CertificateOracle::new()
            .trust("org1", org1.public_key())
            .trust("org2", org2.public_key());

        // org1's issuer cannot mint identities for org2.
        let forged = Credential::issue(&ident("Admin@org2.example.com"), &org1);
        let ctx = CallContext::from_credential(&forged).unwrap();
        assert!(matches!(
            oracle.resolve_caller(&ctx),
            Err(LedgerError::IdentityParse(_))
        ));
    }

    #[test]
    fn test_certificate_oracle_rejects_unknown_org_and_garbage() {
        let org3 = Keypair::from_seed(&[3u8; 32]);
        let oracle = CertificateOracle::new();
        let cred = Credential::issue(&ident("Admin@org3.example.com"), &org3);

        assert!(oracle
            .resolve_caller(&CallContext::from_credential(&cred).unwrap())
            .is_err());
        assert!(oracle.resolve_caller(&CallContext::new(&b"\x00\x01"[..])).is_err());
    }

    #[test]
    fn test_subject_oracle() {
        let ctx = CallContext::new("Admin@org2.example.com");
        assert_eq!(
            SubjectOracle.resolve_caller(&ctx).unwrap(),
            ident("Admin@org2.example.com")
        );
        assert!(SubjectOracle.resolve_caller(&CallContext::new("admin")).is_err());
    }

    #[test]
    fn test_static_oracle_ignores_context() {
        let admin = ident("Admin@org1.example.com");
        let oracle = StaticOracle(admin.clone());
        assert_eq!(oracle.resolve_caller(&CallContext::default()).unwrap(), admin);
    }

    #[test]
    fn test_student_input_from_transient() {
        let input = StudentInput::new("Ada", "555-0100", "ada@example.com");
        let ctx = CallContext::new("Admin@org1.example.com")
            .with_student(&input)
            .unwrap();
        assert_eq!(ctx.student_input().unwrap(), input);

        let missing = CallContext::new("Admin@org1.example.com");
        assert!(matches!(
            missing.student_input(),
            Err(LedgerError::InvalidPayload(_))
        ));

        let malformed = CallContext::new("Admin@org1.example.com")
            .with_transient(STUDENT_PROPERTIES, &b"{\"name\":1}"[..]);
        assert!(matches!(
            malformed.student_input(),
            Err(LedgerError::InvalidPayload(_))
        ));
    }
}
