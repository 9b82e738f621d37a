//! Ledger configuration.

use serde::{Deserialize, Serialize};

/// Who may run the administrative book operations (transfer, update,
/// delete).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPolicy {
    /// Only the current owner. `update` rewrites the descriptive fields and
    /// owner and keeps the lending state.
    #[default]
    OwnerOnly,

    /// Behavior compatible with ledgers written by the first deployment:
    /// any entitled reader may transfer, anyone may delete, and `update`
    /// replaces the whole record, dropping entitlements, readers, holder
    /// and queue.
    Legacy,
}

/// Configuration for the Ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Gate for transfer, update and delete.
    pub admin_policy: AdminPolicy,

    /// Emit computed reader hashes at debug level.
    pub trace_reader_hashes: bool,
}

impl LedgerConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_admin_policy(mut self, policy: AdminPolicy) -> Self {
        self.admin_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.admin_policy, AdminPolicy::OwnerOnly);
        assert!(!config.trace_reader_hashes);
    }

    #[test]
    fn test_from_json() {
        let config = LedgerConfig::from_json(r#"{"admin_policy":"legacy"}"#).unwrap();
        assert_eq!(config.admin_policy, AdminPolicy::Legacy);
        assert_eq!(LedgerConfig::from_json("{}").unwrap(), LedgerConfig::default());
        assert!(LedgerConfig::from_json(r#"{"admin_policy":"anyone"}"#).is_err());
    }
}
