//! Recipient-local failure taxonomy.
//!
//! Every variant here is non-fatal to the batch: it is caught at the
//! pipeline boundary and recorded as that recipient's outcome. Only
//! configuration-load errors (handled in the binary) abort a run.

use thiserror::Error;

use cipherpost_pgp::PgpError;

/// Why a single recipient's delivery failed after key resolution succeeded.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Key material was unusable or the encryption backend failed.
    ///
    /// Grouped with the transport failures because both are recipient-local
    /// hard stops that must not abort the batch.
    #[error("encryption error: {0}")]
    Encryption(#[from] PgpError),

    /// Could not reach the server, the proxy, or complete session setup.
    #[error("connection error: {0}")]
    Connect(String),

    /// STARTTLS was rejected or the TLS upgrade failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The server rejected our credentials.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The mail transaction itself was rejected.
    #[error("send error: {0}")]
    Send(String),
}
