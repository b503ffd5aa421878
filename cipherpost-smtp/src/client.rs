//! The SMTP client proper: command sequencing over a [`ClientConnection`].

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::connection::ClientConnection;
use crate::error::{ClientError, Result};
use crate::response::Response;

/// Initial size of the read buffer for SMTP responses.
const BUFFER_SIZE: usize = 8192;

/// Maximum size of the read buffer to prevent unbounded growth (1MB).
const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// An SMTP client session.
///
/// The session owns its connection; dropping the client tears the
/// connection down.
pub struct SmtpClient {
    connection: Option<ClientConnection>,
    buffer: Vec<u8>,
    buffer_pos: usize,
    server_domain: String,
    accept_invalid_certs: bool,
}

impl SmtpClient {
    /// Connects to `addr`, optionally tunneling through the SOCKS5 proxy at
    /// `proxy`. `server_domain` is the name used for TLS verification on a
    /// later STARTTLS upgrade.
    pub async fn connect(addr: &str, server_domain: String, proxy: Option<&str>) -> Result<Self> {
        let connection = ClientConnection::open(addr, proxy).await?;

        Ok(Self {
            connection: Some(connection),
            buffer: vec![0u8; BUFFER_SIZE],
            buffer_pos: 0,
            server_domain,
            accept_invalid_certs: false,
        })
    }

    /// Accept invalid TLS certificates on STARTTLS. Testing only.
    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Reads the initial server greeting (220 response).
    pub async fn read_greeting(&mut self) -> Result<Response> {
        self.read_response().await
    }

    /// Sends a command line and reads the response.
    pub async fn command(&mut self, command: &str) -> Result<Response> {
        let data = format!("{command}\r\n");
        self.connection
            .as_mut()
            .ok_or(ClientError::ConnectionClosed)?
            .send(data.as_bytes())
            .await?;
        self.read_response().await
    }

    pub async fn ehlo(&mut self, domain: &str) -> Result<Response> {
        self.command(&format!("EHLO {domain}")).await
    }

    /// Sends STARTTLS and, on a 2xx response, upgrades the existing
    /// connection in place.
    pub async fn starttls(&mut self) -> Result<Response> {
        let response = self.command("STARTTLS").await?;

        if response.is_success() {
            let domain = self.server_domain.clone();
            let accept_invalid = self.accept_invalid_certs;

            let Some(connection) = self.connection.take() else {
                return Err(ClientError::ConnectionClosed);
            };
            self.connection = Some(connection.upgrade_to_tls(&domain, accept_invalid).await?);
        }

        Ok(response)
    }

    /// Authenticates with AUTH PLAIN (RFC 4616 initial response).
    pub async fn auth_plain(&mut self, user: &str, secret: &str) -> Result<Response> {
        let token = BASE64.encode(format!("\0{user}\0{secret}"));
        self.command(&format!("AUTH PLAIN {token}")).await
    }

    pub async fn mail_from(&mut self, from: &str) -> Result<Response> {
        self.command(&format!("MAIL FROM:<{from}>")).await
    }

    pub async fn rcpt_to(&mut self, to: &str) -> Result<Response> {
        self.command(&format!("RCPT TO:<{to}>")).await
    }

    pub async fn data(&mut self) -> Result<Response> {
        self.command("DATA").await
    }

    /// Sends the message content followed by the end-of-data marker, and
    /// reads the final response.
    pub async fn send_data(&mut self, data: &str) -> Result<Response> {
        let connection = self
            .connection
            .as_mut()
            .ok_or(ClientError::ConnectionClosed)?;

        connection.send(data.as_bytes()).await?;
        connection.send(end_of_data_marker(data)).await?;

        self.read_response().await
    }

    pub async fn quit(&mut self) -> Result<Response> {
        self.command("QUIT").await
    }

    /// Reads one complete (possibly multi-line) SMTP response.
    async fn read_response(&mut self) -> Result<Response> {
        loop {
            if let Some((response, consumed)) = Response::parse(&self.buffer[..self.buffer_pos])? {
                self.buffer.copy_within(consumed..self.buffer_pos, 0);
                self.buffer_pos -= consumed;

                return Ok(response);
            }

            if self.buffer_pos >= self.buffer.len() {
                let new_size = self.buffer.len() * 2;
                if new_size > MAX_BUFFER_SIZE {
                    return Err(ClientError::ParseError(format!(
                        "response too large (exceeds {MAX_BUFFER_SIZE} bytes)"
                    )));
                }
                self.buffer.resize(new_size, 0);
            }

            let connection = self
                .connection
                .as_mut()
                .ok_or(ClientError::ConnectionClosed)?;
            let n = connection.read(&mut self.buffer[self.buffer_pos..]).await?;
            self.buffer_pos += n;
        }
    }
}

/// The bytes to append after the content so the wire always carries a
/// `CRLF . CRLF` end-of-data sequence.
fn end_of_data_marker(data: &str) -> &'static [u8] {
    if data.ends_with("\r\n") {
        b".\r\n"
    } else {
        b"\r\n.\r\n"
    }
}
