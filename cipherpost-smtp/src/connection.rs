//! The underlying client connection: plain TCP, SOCKS5-tunneled TCP, and
//! in-place TLS upgrade of either.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_socks::tcp::Socks5Stream;
use tracing::warn;

use crate::error::{ClientError, Result};

/// Object-safe alias for the byte streams we can speak SMTP over.
pub(crate) trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Stream for T {}

/// A client connection that is either plaintext or TLS-wrapped.
pub(crate) enum ClientConnection {
    Plain(Box<dyn Stream>),
    Tls(tokio_rustls::client::TlsStream<Box<dyn Stream>>),
}

impl ClientConnection {
    /// Opens a plaintext connection to `addr`, tunneled through the SOCKS5
    /// endpoint at `proxy` when one is given.
    pub(crate) async fn open(addr: &str, proxy: Option<&str>) -> Result<Self> {
        let stream: Box<dyn Stream> = match proxy {
            Some(proxy_addr) => Box::new(
                Socks5Stream::connect(proxy_addr, addr)
                    .await
                    .map_err(|err| ClientError::Proxy(err.to_string()))?,
            ),
            None => Box::new(TcpStream::connect(addr).await?),
        };

        Ok(Self::Plain(stream))
    }

    pub(crate) async fn send(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(stream) => stream.write_all(data).await?,
            Self::Tls(stream) => stream.write_all(data).await?,
        }
        Ok(())
    }

    pub(crate) async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = match self {
            Self::Plain(stream) => stream.read(buf).await?,
            Self::Tls(stream) => stream.read(buf).await?,
        };
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        Ok(n)
    }

    /// Upgrades the existing plaintext stream to TLS. The same connection is
    /// reused; STARTTLS semantics, not a reconnect.
    pub(crate) async fn upgrade_to_tls(
        self,
        domain: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        match self {
            Self::Plain(stream) => {
                let mut root_store = RootCertStore::empty();

                let certs = rustls_native_certs::load_native_certs();
                for cert in certs.certs {
                    root_store.add(cert).map_err(|err| {
                        ClientError::TlsError(format!("failed to add certificate: {err}"))
                    })?;
                }
                if !certs.errors.is_empty() {
                    warn!(?certs.errors, "some system certificates could not be loaded");
                }

                let mut config = ClientConfig::builder()
                    .with_root_certificates(root_store)
                    .with_no_client_auth();

                // Testing against self-signed servers only.
                if accept_invalid_certs {
                    config
                        .dangerous()
                        .set_certificate_verifier(Arc::new(NoVerifier));
                }

                let connector = TlsConnector::from(Arc::new(config));
                let server_name = ServerName::try_from(domain.to_string())
                    .map_err(|err| ClientError::TlsError(format!("invalid domain: {err}")))?;

                let tls_stream = connector
                    .connect(server_name, stream)
                    .await
                    .map_err(|err| ClientError::TlsError(err.to_string()))?;

                Ok(Self::Tls(tls_stream))
            }
            Self::Tls(_) => Err(ClientError::TlsError(
                "connection is already TLS".to_string(),
            )),
        }
    }
}

/// A certificate verifier that accepts everything (testing only).
#[derive(Debug)]
struct NoVerifier;

impl tokio_rustls::rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &tokio_rustls::rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[tokio_rustls::rustls::pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: tokio_rustls::rustls::pki_types::UnixTime,
    ) -> std::result::Result<
        tokio_rustls::rustls::client::danger::ServerCertVerified,
        tokio_rustls::rustls::Error,
    > {
        Ok(tokio_rustls::rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &tokio_rustls::rustls::pki_types::CertificateDer<'_>,
        _dss: &tokio_rustls::rustls::DigitallySignedStruct,
    ) -> std::result::Result<
        tokio_rustls::rustls::client::danger::HandshakeSignatureValid,
        tokio_rustls::rustls::Error,
    > {
        Ok(tokio_rustls::rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &tokio_rustls::rustls::pki_types::CertificateDer<'_>,
        _dss: &tokio_rustls::rustls::DigitallySignedStruct,
    ) -> std::result::Result<
        tokio_rustls::rustls::client::danger::HandshakeSignatureValid,
        tokio_rustls::rustls::Error,
    > {
        Ok(tokio_rustls::rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<tokio_rustls::rustls::SignatureScheme> {
        vec![
            tokio_rustls::rustls::SignatureScheme::RSA_PKCS1_SHA256,
            tokio_rustls::rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            tokio_rustls::rustls::SignatureScheme::ED25519,
        ]
    }
}
