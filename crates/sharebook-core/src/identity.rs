//! Organization-qualified caller identities.
//!
//! An identity is parsed exactly once, at the boundary where a credential is
//! resolved. Everything downstream works with the structured value and
//! never pattern-matches raw strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Namespace;

/// Prefix of every organization's private namespace.
pub const PRIVATE_NAMESPACE_PREFIX: &str = "_implicit_org_";

/// An authenticated principal of a specific organization.
///
/// Written as `principal@domain`, e.g. `Admin@org1.example.com`. The
/// organization is the first label of the domain (`org1`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity {
    principal: String,
    domain: String,
}

impl Identity {
    /// Parse an identity string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidIdentity(s.to_string());

        let (principal, domain) = s.split_once('@').ok_or_else(invalid)?;
        if principal.is_empty() || principal.chars().any(|c| c.is_whitespace() || c == '@') {
            return Err(invalid());
        }

        let mut labels = domain.split('.');
        let org = labels.next().unwrap_or_default();
        if org.is_empty() || labels.clone().next().is_none() {
            return Err(invalid());
        }
        let label_ok = |label: &str| {
            !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        };
        if !label_ok(org) || !labels.all(label_ok) {
            return Err(invalid());
        }

        Ok(Self {
            principal: principal.to_string(),
            domain: domain.to_ascii_lowercase(),
        })
    }

    /// The principal name, e.g. `Admin`.
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// The full domain, e.g. `org1.example.com`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The organization label, e.g. `org1`.
    pub fn organization(&self) -> &str {
        self.domain.split('.').next().unwrap_or_default()
    }

    /// The membership service provider name, e.g. `Org1MSP`.
    pub fn msp_id(&self) -> String {
        msp_id(self.organization())
    }

    /// The organization's private namespace, e.g. `_implicit_org_Org1MSP`.
    pub fn private_namespace(&self) -> Namespace {
        Namespace::Private(format!("{PRIVATE_NAMESPACE_PREFIX}{}", self.msp_id()))
    }
}

/// Membership service provider name for an organization label.
pub fn msp_id(organization: &str) -> String {
    let mut chars = organization.chars();
    match chars.next() {
        Some(first) => format!("{}{}MSP", first.to_ascii_uppercase(), chars.as_str()),
        None => "MSP".to_string(),
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.principal, self.domain)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl FromStr for Identity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.to_string()
    }
}
