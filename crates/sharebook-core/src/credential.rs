//! Signed caller credentials.
//!
//! An organization's issuer key signs the identity string of each of its
//! principals. The resulting credential travels with every invocation and
//! is checked by the ledger's identity oracle before any state is touched.

use serde::{Deserialize, Serialize};

use crate::canonical::{decode_record, encode_record};
use crate::crypto::{Ed25519PublicKey, Ed25519Signature, Keypair};
use crate::error::CoreError;
use crate::identity::Identity;

/// Domain separator for credential signatures.
pub const CREDENTIAL_DOMAIN: &[u8] = b"sharebook.credential/v1\0";

/// A principal's identity string signed by its organization's issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub subject: String,
    pub issuer: Ed25519PublicKey,
    pub signature: Ed25519Signature,
}

impl Credential {
    /// Issue a credential for `subject`, signed by `issuer`.
    pub fn issue(subject: &Identity, issuer: &Keypair) -> Self {
        let subject = subject.to_string();
        let signature = issuer.sign(&signed_message(&subject));
        Self {
            subject,
            issuer: issuer.public_key(),
            signature,
        }
    }

    /// Check the signature and parse the subject.
    pub fn verify(&self) -> Result<Identity, CoreError> {
        self.issuer
            .verify(&signed_message(&self.subject), &self.signature)?;
        Identity::parse(&self.subject)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        encode_record(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        decode_record(bytes).map_err(|e| CoreError::MalformedCredential(e.to_string()))
    }
}

fn signed_message(subject: &str) -> Vec<u8> {
    let mut msg = Vec::with_capacity(CREDENTIAL_DOMAIN.len() + subject.len());
    msg.extend_from_slice(CREDENTIAL_DOMAIN);
    msg.extend_from_slice(subject.as_bytes());
    msg
}
