//! The batch dispatcher: one delivery pipeline invocation per recipient,
//! in list order, continuing past per-recipient failures.

use cipherpost_common::config::Config;
use cipherpost_common::internal;
use cipherpost_common::message::MailMessage;
use cipherpost_pgp::TrustStore;

use crate::outcome::{BatchResult, DeliveryOutcome};
use crate::pipeline;

/// Runs the whole batch.
///
/// Recipients are processed sequentially in configuration order; no
/// recipient's outcome (including transport failure) halts the loop. The
/// caller gets every outcome back in the [`BatchResult`].
pub async fn run(config: &Config, message: &MailMessage, store: &dyn TrustStore) -> BatchResult {
    let mut result = BatchResult::default();

    for recipient in &config.recipients {
        internal!(level = INFO, "sending to {recipient}");

        let outcome = pipeline::deliver(recipient, config, message, store).await;

        match &outcome {
            DeliveryOutcome::Sent => {
                internal!(level = INFO, "delivered to {recipient}");
            }
            DeliveryOutcome::NoKeyFound => {
                internal!(level = WARN, "no key found for {recipient}, not sending");
            }
            DeliveryOutcome::TransportFailed(err) => {
                internal!(level = ERROR, "delivery to {recipient} failed: {err}");
            }
        }

        result.record(recipient.clone(), outcome);
    }

    result
}
