//! The on-disk message file: a header block exposing at least `Subject`,
//! a blank line, then the plaintext body.

use std::path::{Path, PathBuf};

use mailparse::MailHeaderMap;
use thiserror::Error;

/// The parsed message, immutable for the duration of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("failed to read message from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid message file: {0}")]
    Parse(#[from] mailparse::MailParseError),

    #[error("message file has no Subject header")]
    MissingSubject,
}

impl MailMessage {
    /// Reads and parses the message file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MessageError> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| MessageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parses a message from its raw bytes.
    pub fn parse(raw: &[u8]) -> Result<Self, MessageError> {
        let parsed = mailparse::parse_mail(raw)?;

        let subject = parsed
            .headers
            .get_first_value("Subject")
            .ok_or(MessageError::MissingSubject)?;
        let body = parsed.get_body()?;

        Ok(Self { subject, body })
    }
}
