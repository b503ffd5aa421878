//! A keyring file as a [`TrustStore`].
//!
//! The keyring is a single file of (optionally armored) concatenated OpenPGP
//! certs; store-native order is file order.

use std::io::Write;
use std::path::Path;

use sequoia_openpgp as openpgp;

use openpgp::Cert;
use openpgp::cert::CertParser;
use openpgp::parse::Parse;
use openpgp::policy::StandardPolicy;
use openpgp::serialize::stream::{Armorer, Encryptor2, LiteralWriter, Message};
use tracing::debug;

use crate::error::PgpError;
use crate::store::{KeyEntry, KeyId, TrustStore};

/// A trust store backed by parsed OpenPGP certs.
#[derive(Debug)]
pub struct Keyring {
    certs: Vec<Cert>,
}

impl Keyring {
    /// Loads every cert from the keyring file at `path`, preserving file
    /// order. Unparseable packets fail the load rather than being skipped:
    /// a partially read keyring would silently change key resolution.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PgpError> {
        let path = path.as_ref();
        let parser = CertParser::from_file(path).map_err(|err| PgpError::KeyringLoad {
            path: path.to_path_buf(),
            reason: format!("{err:#}"),
        })?;

        let certs = parser
            .collect::<openpgp::Result<Vec<Cert>>>()
            .map_err(|err| PgpError::KeyringLoad {
                path: path.to_path_buf(),
                reason: format!("{err:#}"),
            })?;

        debug!(path = %path.display(), certs = certs.len(), "loaded keyring");

        Ok(Self { certs })
    }

    /// Builds a store from certs already in memory, in the given order.
    pub fn from_certs(certs: Vec<Cert>) -> Self {
        Self { certs }
    }

    fn cert_for(&self, key_id: &KeyId) -> Option<&Cert> {
        self.certs
            .iter()
            .find(|cert| cert.fingerprint().to_hex() == key_id.as_str())
    }
}

impl TrustStore for Keyring {
    fn list_keys(&self) -> Vec<KeyEntry> {
        self.certs
            .iter()
            .map(|cert| KeyEntry {
                key_id: KeyId::new(cert.fingerprint().to_hex()),
                identities: cert
                    .userids()
                    .map(|uid| String::from_utf8_lossy(uid.userid().value()).into_owned())
                    .collect(),
            })
            .collect()
    }

    fn encrypt(&self, plaintext: &str, key_id: &KeyId) -> Result<String, PgpError> {
        let cert = self
            .cert_for(key_id)
            .ok_or_else(|| PgpError::UnknownKey(key_id.to_string()))?;

        let policy = StandardPolicy::new();
        let recipients = cert
            .keys()
            .with_policy(&policy, None)
            .supported()
            .alive()
            .revoked(false)
            .for_transport_encryption()
            .collect::<Vec<_>>();

        if recipients.is_empty() {
            return Err(PgpError::NoEncryptionSubkey(key_id.to_string()));
        }

        let mut sink = Vec::new();

        // Armorer -> Encryptor -> LiteralWriter, torn down innermost-first.
        let message = Message::new(&mut sink);
        let message = Armorer::new(message).build().map_err(PgpError::from)?;
        let message = Encryptor2::for_recipients(message, recipients)
            .build()
            .map_err(PgpError::from)?;
        let mut literal = LiteralWriter::new(message)
            .build()
            .map_err(PgpError::from)?;

        literal
            .write_all(plaintext.as_bytes())
            .map_err(|err| PgpError::Backend(err.to_string()))?;
        literal.finalize().map_err(PgpError::from)?;

        String::from_utf8(sink).map_err(|err| PgpError::Backend(err.to_string()))
    }
}
