//! Error types for the SMTP client.

use std::io;

use thiserror::Error;

/// Errors that can occur while talking to the SMTP server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// IO error during network operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The SOCKS5 proxy could not be reached or refused the tunnel.
    #[error("SOCKS5 proxy error: {0}")]
    Proxy(String),

    /// Failed to parse an SMTP response from the server.
    #[error("failed to parse SMTP response: {0}")]
    ParseError(String),

    /// The server returned an error status code (4xx or 5xx).
    #[error("SMTP error: {code} - {message}")]
    SmtpError { code: u16, message: String },

    /// TLS negotiation or certificate error.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Connection was closed unexpectedly.
    #[error("connection closed unexpectedly")]
    ConnectionClosed,

    /// UTF-8 decoding error in a response.
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

/// Specialized `Result` type for SMTP client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
