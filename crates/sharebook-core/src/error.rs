//! Error types for Sharebook Core.

use thiserror::Error;

/// Core errors that can occur while parsing or encoding ledger values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid identity {0:?}: expected principal@org.domain")]
    InvalidIdentity(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
