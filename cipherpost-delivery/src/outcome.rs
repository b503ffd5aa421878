//! Per-recipient and per-batch delivery results.

use std::fmt::{self, Display};

use crate::error::TransportError;

/// The outcome of one recipient's delivery attempt.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The encrypted envelope was accepted by the server.
    Sent,

    /// No trust-store key matched the recipient; nothing was sent. This is
    /// the absolute-refusal gate: there is no unencrypted fallback.
    NoKeyFound,

    /// Encryption or transport failed after a key was resolved.
    TransportFailed(TransportError),
}

impl DeliveryOutcome {
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

impl Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => f.write_str("sent"),
            Self::NoKeyFound => f.write_str("no key found"),
            Self::TransportFailed(err) => write!(f, "{err}"),
        }
    }
}

/// The ordered outcomes of a whole batch, one entry per configured
/// recipient.
#[derive(Debug, Default)]
pub struct BatchResult {
    outcomes: Vec<(String, DeliveryOutcome)>,
}

impl BatchResult {
    pub(crate) fn record(&mut self, recipient: impl Into<String>, outcome: DeliveryOutcome) {
        self.outcomes.push((recipient.into(), outcome));
    }

    /// Iterates `(recipient, outcome)` in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeliveryOutcome)> {
        self.outcomes
            .iter()
            .map(|(recipient, outcome)| (recipient.as_str(), outcome))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of recipients whose envelope was accepted.
    pub fn sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_sent())
            .count()
    }

    /// The recipients that received nothing, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DeliveryOutcome)> {
        self.iter().filter(|(_, outcome)| !outcome.is_sent())
    }

    /// `true` when every recipient was sent to. An empty batch counts as
    /// success: delivering to nobody is a valid no-op.
    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_sent())
    }

    /// The recorded outcome for `recipient`, if it was in the batch.
    pub fn outcome_for(&self, recipient: &str) -> Option<&DeliveryOutcome> {
        self.outcomes
            .iter()
            .find(|(r, _)| r == recipient)
            .map(|(_, outcome)| outcome)
    }
}
