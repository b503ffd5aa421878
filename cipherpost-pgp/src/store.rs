//! The trust-store abstraction the delivery pipeline resolves keys against.

use std::fmt::{self, Display};

use crate::error::PgpError;

/// An opaque key identifier, the hex fingerprint of the cert it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One key in the store, with the identity strings attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub key_id: KeyId,
    /// User IDs as text, in cert order.
    pub identities: Vec<String>,
}

/// A read-only collection of public encryption keys.
///
/// Iteration order of [`TrustStore::list_keys`] is store-native and
/// deterministic for a given store state; the delivery pipeline's
/// first-match tie-break depends on that.
pub trait TrustStore: Send + Sync {
    /// Every key in the store, in store-native order.
    fn list_keys(&self) -> Vec<KeyEntry>;

    /// Encrypts `plaintext` to the named key, returning ASCII-armored
    /// ciphertext suitable for use as an email body.
    fn encrypt(&self, plaintext: &str, key_id: &KeyId) -> Result<String, PgpError>;
}
