//! Top-level crate tying the cipherpost workspace together.
//!
//! The interesting parts live in the member crates:
//! [`cipherpost_delivery`] (the encrypt-then-deliver core),
//! [`cipherpost_pgp`] (the trust store), [`cipherpost_smtp`] (the SMTP
//! client), and [`cipherpost_common`] (configuration and message types).

pub use cipherpost_common::{config, envelope, logging, message};
pub use cipherpost_delivery::{BatchResult, DeliveryOutcome, TransportError, deliver, run};
pub use cipherpost_pgp::{KeyEntry, KeyId, Keyring, PgpError, TrustStore};
pub use cipherpost_smtp::SmtpClient;
