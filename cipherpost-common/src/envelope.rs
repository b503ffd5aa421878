//! The outgoing transport unit: one recipient, one armored ciphertext.
//!
//! An [`OutgoingEnvelope`] can only be constructed from ciphertext; there is
//! deliberately no field that could carry the plaintext body.

use chrono::{DateTime, Utc};

/// A single-recipient message ready for transmission.
#[derive(Debug, Clone)]
pub struct OutgoingEnvelope {
    sender: String,
    recipient: String,
    subject: String,
    ciphertext: String,
    date: DateTime<Utc>,
}

impl OutgoingEnvelope {
    /// Assembles an envelope, capturing the `Date` header timestamp now.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        ciphertext: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            subject: subject.into(),
            ciphertext: ciphertext.into(),
            date: Utc::now(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The single recipient of this envelope.
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    /// Renders the envelope as an RFC 5322 message with CRLF line endings,
    /// the armored ciphertext being the entire body.
    pub fn to_rfc5322(&self) -> String {
        let mut message = String::with_capacity(self.ciphertext.len() + 256);

        message.push_str(&format!("From: {}\r\n", self.sender));
        message.push_str(&format!("To: {}\r\n", self.recipient));
        message.push_str(&format!("Subject: {}\r\n", self.subject));
        message.push_str(&format!("Date: {}\r\n", self.date.to_rfc2822()));
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("\r\n");

        // Normalise the armored body to CRLF for the wire.
        for line in self.ciphertext.lines() {
            message.push_str(line);
            message.push_str("\r\n");
        }

        message
    }
}
