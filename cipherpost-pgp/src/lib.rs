//! The OpenPGP side of cipherpost: a read-only trust store of public certs
//! and armored encryption of a message body to one of them.

mod error;
mod keyring;
mod store;

pub use error::PgpError;
pub use keyring::Keyring;
pub use store::{KeyEntry, KeyId, TrustStore};
