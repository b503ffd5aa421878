//! The per-recipient delivery pipeline: resolve a key, encrypt, assemble
//! the envelope, open the transport session, transmit.

use std::time::Duration;

use tokio::time::timeout;

use cipherpost_common::config::{Config, TlsPolicy};
use cipherpost_common::envelope::OutgoingEnvelope;
use cipherpost_common::message::MailMessage;
use cipherpost_common::{internal, outgoing};
use cipherpost_pgp::{KeyId, TrustStore};
use cipherpost_smtp::{Response, SmtpClient};

use crate::error::TransportError;
use crate::outcome::DeliveryOutcome;

/// Resolves the encryption key for `recipient`.
///
/// Keys are walked in store-native order, each key's identity strings in
/// key order; the first identity containing the recipient address as a
/// case-sensitive substring wins. The tie-break when several keys match is
/// therefore "first in store order" - documented behavior, not a ranking.
pub(crate) fn resolve_key(store: &dyn TrustStore, recipient: &str) -> Option<KeyId> {
    store.list_keys().into_iter().find_map(|entry| {
        entry
            .identities
            .iter()
            .any(|identity| identity.contains(recipient))
            .then_some(entry.key_id)
    })
}

/// Delivers one encrypted copy of `message` to `recipient`.
///
/// Never returns an error: every failure is converted into a
/// [`DeliveryOutcome`] at this boundary so the dispatcher can carry on with
/// the rest of the batch.
pub async fn deliver(
    recipient: &str,
    config: &Config,
    message: &MailMessage,
    store: &dyn TrustStore,
) -> DeliveryOutcome {
    // Step 1: key resolution. No key, no mail - there is deliberately no
    // plaintext fallback anywhere below this point.
    let Some(key_id) = resolve_key(store, recipient) else {
        return DeliveryOutcome::NoKeyFound;
    };

    internal!(level = DEBUG, "resolved key {key_id} for {recipient}");

    // Step 2: encrypt the body to the resolved key. The ciphertext is
    // recipient-specific and never reused for anyone else.
    let ciphertext = match store.encrypt(&message.body, &key_id) {
        Ok(ciphertext) => ciphertext,
        Err(err) => return DeliveryOutcome::TransportFailed(TransportError::Encryption(err)),
    };

    // Step 3: assemble the single-recipient envelope around the ciphertext.
    let envelope = OutgoingEnvelope::new(&config.sender, recipient, &message.subject, ciphertext);

    // Steps 4 and 5: session and transmission.
    match transmit(&envelope, config).await {
        Ok(()) => DeliveryOutcome::Sent,
        Err(err) => DeliveryOutcome::TransportFailed(err),
    }
}

/// Opens a fresh session, authenticates, and transmits the envelope.
///
/// The session is owned by this call and dropped on return, so a failure
/// here cannot corrupt any other recipient's delivery.
async fn transmit(envelope: &OutgoingEnvelope, config: &Config) -> Result<(), TransportError> {
    let timeouts = &config.timeouts;
    let addr = config.server_addr();
    let proxy = config.tor.then(|| config.proxy_addr.as_str());

    if let Some(proxy_addr) = proxy {
        outgoing!(level = DEBUG, "tunneling through SOCKS5 proxy {proxy_addr}");
    }

    let mut client = match timeout(
        Duration::from_secs(timeouts.connect_secs),
        SmtpClient::connect(&addr, config.host.clone(), proxy),
    )
    .await
    {
        Ok(Ok(client)) => client.accept_invalid_certs(config.tls.accept_invalid_certs),
        Ok(Err(err)) => return Err(TransportError::Connect(err.to_string())),
        Err(_) => {
            return Err(TransportError::Connect(format!(
                "connection to {addr} timed out"
            )));
        }
    };

    checked(timeouts.connect_secs, "greeting", client.read_greeting())
        .await
        .map_err(TransportError::Connect)?;

    checked(timeouts.ehlo_secs, "EHLO", client.ehlo(&config.host))
        .await
        .map_err(TransportError::Connect)?;

    if config.tls.policy != TlsPolicy::Disabled {
        match timeout(Duration::from_secs(timeouts.starttls_secs), client.starttls()).await {
            Ok(Ok(response)) if response.is_success() => {
                // The server forgets its EHLO state across the upgrade.
                checked(timeouts.ehlo_secs, "EHLO", client.ehlo(&config.host))
                    .await
                    .map_err(TransportError::Tls)?;
            }
            Ok(Ok(response)) => {
                if config.tls.policy == TlsPolicy::Required {
                    return Err(TransportError::Tls(format!(
                        "STARTTLS rejected: {} {}",
                        response.code,
                        response.message()
                    )));
                }
                outgoing!(level = WARN, "server rejected STARTTLS, continuing in plaintext");
            }
            Ok(Err(err)) => return Err(TransportError::Tls(err.to_string())),
            Err(_) => return Err(TransportError::Tls("STARTTLS timed out".to_string())),
        }
    }

    if !config.user.is_empty() {
        checked(
            timeouts.auth_secs,
            "AUTH",
            client.auth_plain(&config.user, config.secret()),
        )
        .await
        .map_err(TransportError::Auth)?;
    }

    checked(
        timeouts.mail_from_secs,
        "MAIL FROM",
        client.mail_from(envelope.sender()),
    )
    .await
    .map_err(TransportError::Send)?;

    // Exactly one recipient per envelope: the body is ciphertext for this
    // recipient's key and nobody else's.
    checked(
        timeouts.rcpt_to_secs,
        "RCPT TO",
        client.rcpt_to(envelope.recipient()),
    )
    .await
    .map_err(TransportError::Send)?;

    // DATA is the one command answered with an intermediate 354 go-ahead
    // rather than a 2xx.
    match timeout(Duration::from_secs(timeouts.data_secs), client.data()).await {
        Ok(Ok(response)) if (300..400).contains(&response.code) => {}
        Ok(Ok(response)) => {
            return Err(TransportError::Send(format!(
                "DATA rejected: {} {}",
                response.code,
                response.message()
            )));
        }
        Ok(Err(err)) => return Err(TransportError::Send(format!("DATA failed: {err}"))),
        Err(_) => {
            return Err(TransportError::Send(format!(
                "DATA timed out after {}s",
                timeouts.data_secs
            )));
        }
    }

    checked(
        timeouts.data_secs,
        "message content",
        client.send_data(&envelope.to_rfc5322()),
    )
    .await
    .map_err(TransportError::Send)?;

    outgoing!(level = DEBUG, "envelope for {} accepted", envelope.recipient());

    // Best-effort; the message is already accepted.
    let _ = timeout(Duration::from_secs(timeouts.quit_secs), client.quit()).await;

    Ok(())
}

/// Runs one SMTP exchange under a timeout and requires a 2xx reply.
async fn checked<F>(secs: u64, what: &str, exchange: F) -> Result<Response, String>
where
    F: Future<Output = cipherpost_smtp::Result<Response>>,
{
    match timeout(Duration::from_secs(secs), exchange).await {
        Ok(Ok(response)) if response.is_success() => Ok(response),
        Ok(Ok(response)) => Err(format!(
            "{what} rejected: {} {}",
            response.code,
            response.message()
        )),
        Ok(Err(err)) => Err(format!("{what} failed: {err}")),
        Err(_) => Err(format!("{what} timed out after {secs}s")),
    }
}

#[cfg(test)]
mod tests {
    use cipherpost_pgp::{KeyEntry, PgpError};

    use super::*;

    struct StubStore {
        entries: Vec<KeyEntry>,
    }

    impl StubStore {
        fn with_identities(identities: &[(&str, &[&str])]) -> Self {
            Self {
                entries: identities
                    .iter()
                    .map(|(id, uids)| KeyEntry {
                        key_id: KeyId::new(*id),
                        identities: uids.iter().map(ToString::to_string).collect(),
                    })
                    .collect(),
            }
        }
    }

    impl TrustStore for StubStore {
        fn list_keys(&self) -> Vec<KeyEntry> {
            self.entries.clone()
        }

        fn encrypt(&self, _plaintext: &str, key_id: &KeyId) -> Result<String, PgpError> {
            Err(PgpError::UnknownKey(key_id.to_string()))
        }
    }

    #[test]
    fn no_matching_identity_resolves_nothing() {
        let store = StubStore::with_identities(&[("K1", &["Alice <alice@example.com>"])]);
        assert_eq!(resolve_key(&store, "bob@example.com"), None);
    }

    #[test]
    fn first_key_in_store_order_wins() {
        // Both keys carry an identity containing the address; resolution
        // must deterministically pick the first in store order.
        let store = StubStore::with_identities(&[
            ("K1", &["alice@example.com"]),
            ("K2", &["alice@example.com, work"]),
        ]);

        for _ in 0..3 {
            assert_eq!(
                resolve_key(&store, "alice@example.com"),
                Some(KeyId::new("K1"))
            );
        }
    }

    #[test]
    fn matching_is_substring_containment() {
        // Documented over-match: the address only has to appear inside the
        // identity string.
        let store = StubStore::with_identities(&[("K1", &["Bob <bob@example.com.evil.org>"])]);
        assert_eq!(
            resolve_key(&store, "bob@example.com"),
            Some(KeyId::new("K1"))
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        let store = StubStore::with_identities(&[("K1", &["Alice <ALICE@EXAMPLE.COM>"])]);
        assert_eq!(resolve_key(&store, "alice@example.com"), None);
    }

    #[test]
    fn later_identity_on_earlier_key_still_wins() {
        let store = StubStore::with_identities(&[
            ("K1", &["work <w@other.org>", "Alice <alice@example.com>"]),
            ("K2", &["alice@example.com"]),
        ]);
        assert_eq!(
            resolve_key(&store, "alice@example.com"),
            Some(KeyId::new("K1"))
        );
    }
}
