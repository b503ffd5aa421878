//! Run configuration for a cipherpost batch.
//!
//! The configuration file (RON) never contains the authentication secret;
//! that is prompted for interactively and merged in with
//! [`Config::with_secret`] before the batch starts. From that point on the
//! value is immutable and shared by reference with every delivery.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// TLS negotiation policy for the SMTP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TlsPolicy {
    /// Require STARTTLS; fail the delivery if the upgrade cannot be
    /// negotiated. This is the default: the message body is ciphertext, but
    /// the envelope headers and credentials still deserve transport
    /// encryption.
    #[default]
    Required,

    /// Attempt STARTTLS, continue in plaintext if the server rejects it.
    Opportunistic,

    /// Never attempt STARTTLS. Testing only.
    Disabled,
}

/// TLS settings for the SMTP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub struct TlsConfig {
    #[serde(default)]
    pub policy: TlsPolicy,

    /// Accept invalid (self-signed, expired) certificates.
    ///
    /// Only set to `true` for testing against a local server.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Per-operation timeouts, in seconds.
///
/// Every network operation in the delivery pipeline is bounded by one of
/// these; nothing blocks indefinitely.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpTimeouts {
    #[serde(default = "default_connect_timeout")]
    pub connect_secs: u64,

    #[serde(default = "default_command_timeout")]
    pub ehlo_secs: u64,

    #[serde(default = "default_command_timeout")]
    pub starttls_secs: u64,

    #[serde(default = "default_command_timeout")]
    pub auth_secs: u64,

    #[serde(default = "default_command_timeout")]
    pub mail_from_secs: u64,

    #[serde(default = "default_command_timeout")]
    pub rcpt_to_secs: u64,

    /// Longer than the rest to accommodate large armored bodies.
    #[serde(default = "default_data_timeout")]
    pub data_secs: u64,

    #[serde(default = "default_quit_timeout")]
    pub quit_secs: u64,
}

impl Default for SmtpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect_timeout(),
            ehlo_secs: default_command_timeout(),
            starttls_secs: default_command_timeout(),
            auth_secs: default_command_timeout(),
            mail_from_secs: default_command_timeout(),
            rcpt_to_secs: default_command_timeout(),
            data_secs: default_data_timeout(),
            quit_secs: default_quit_timeout(),
        }
    }
}

const fn default_connect_timeout() -> u64 {
    30
}

const fn default_command_timeout() -> u64 {
    30
}

const fn default_data_timeout() -> u64 {
    120
}

const fn default_quit_timeout() -> u64 {
    10
}

fn default_proxy_addr() -> String {
    "127.0.0.1:9050".to_string()
}

/// The fully loaded, immutable run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// SMTP server hostname.
    pub host: String,

    /// SMTP server port.
    pub port: u16,

    /// Username for SMTP authentication.
    pub user: String,

    /// Envelope and header sender address.
    pub sender: String,

    /// Recipient addresses, delivered to in this order.
    pub recipients: Vec<String>,

    /// Path to the OpenPGP keyring holding the recipients' public certs.
    pub keyring: PathBuf,

    /// Route the SMTP connection through a local SOCKS5 proxy (Tor).
    #[serde(default)]
    pub tor: bool,

    /// SOCKS5 endpoint used when `tor` is enabled.
    #[serde(default = "default_proxy_addr")]
    pub proxy_addr: String,

    #[serde(default)]
    pub tls: TlsConfig,

    #[serde(default)]
    pub timeouts: SmtpTimeouts,

    /// Authentication secret, supplied interactively rather than stored.
    #[serde(skip)]
    secret: String,
}

/// Errors encountered while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

impl Config {
    /// Parses a configuration from RON text. The secret is left empty; merge
    /// it with [`Config::with_secret`].
    pub fn from_ron(input: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let contents =
            std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
        Self::from_ron(&contents)
    }

    /// Merges the interactively supplied authentication secret, consuming
    /// and returning the configuration so the result can be treated as
    /// immutable from here on.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The `host:port` pair to connect to.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
