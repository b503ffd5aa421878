//! Error types for trust-store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading the keyring or encrypting to a key.
#[derive(Debug, Error)]
pub enum PgpError {
    /// The keyring file could not be read or contained no parseable certs.
    #[error("failed to load keyring {path}: {reason}")]
    KeyringLoad { path: PathBuf, reason: String },

    /// The requested key is not present in the store.
    #[error("key {0} not found in the trust store")]
    UnknownKey(String),

    /// The cert exists but carries no usable encryption subkey.
    #[error("key {0} has no valid encryption subkey")]
    NoEncryptionSubkey(String),

    /// The OpenPGP backend failed mid-operation.
    #[error("encryption backend error: {0}")]
    Backend(String),
}

impl From<anyhow::Error> for PgpError {
    fn from(err: anyhow::Error) -> Self {
        Self::Backend(format!("{err:#}"))
    }
}
