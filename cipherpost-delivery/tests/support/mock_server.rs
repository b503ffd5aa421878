//! Mock SMTP server for exercising the delivery pipeline end to end.
//!
//! Records every command line and every DATA payload it receives, counts
//! accepted connections, and lets a test inject rejections for individual
//! commands (failed AUTH, rejected RCPT, and so on).
#![allow(dead_code)] // Test utility module - not every test uses every knob

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
    task::JoinHandle,
    time::timeout,
};

/// A canned `code message` reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub code: u16,
    pub message: String,
}

impl Reply {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn line(&self) -> String {
        format!("{} {}\r\n", self.code, self.message)
    }
}

#[derive(Debug, Clone)]
struct Replies {
    greeting: Reply,
    starttls: Reply,
    auth: Reply,
    mail_from: Reply,
    rcpt_to: Reply,
    data: Reply,
    data_end: Reply,
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            greeting: Reply::new(220, "mock.example.com ESMTP"),
            // The mock cannot complete a handshake, so STARTTLS is
            // rejected by default.
            starttls: Reply::new(454, "TLS not available"),
            auth: Reply::new(235, "Authentication successful"),
            mail_from: Reply::new(250, "OK"),
            rcpt_to: Reply::new(250, "OK"),
            data: Reply::new(354, "End data with <CRLF>.<CRLF>"),
            data_end: Reply::new(250, "OK: queued"),
        }
    }
}

/// Builder for a [`MockSmtpServer`].
#[derive(Debug, Default)]
pub struct MockSmtpServerBuilder {
    replies: Replies,
}

impl MockSmtpServerBuilder {
    #[must_use]
    pub fn with_starttls_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.replies.starttls = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_auth_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.replies.auth = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_mail_from_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.replies.mail_from = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_rcpt_to_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.replies.rcpt_to = Reply::new(code, message);
        self
    }

    /// Reply to the `DATA` command itself (the 354 go-ahead by default).
    #[must_use]
    pub fn with_data_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.replies.data = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_data_end_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.replies.data_end = Reply::new(code, message);
        self
    }

    /// Binds to an ephemeral port and starts serving.
    pub async fn build(self) -> std::io::Result<MockSmtpServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(ServerState {
            replies: self.replies,
            commands: RwLock::new(Vec::new()),
            messages: RwLock::new(Vec::new()),
            connections: AtomicUsize::new(0),
        });

        let accept_state = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _peer)) = listener.accept().await {
                accept_state.connections.fetch_add(1, Ordering::Relaxed);
                let session_state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    let _ = handle_session(stream, session_state).await;
                });
            }
        });

        Ok(MockSmtpServer {
            addr,
            state,
            handle,
        })
    }
}

struct ServerState {
    replies: Replies,
    commands: RwLock<Vec<String>>,
    messages: RwLock<Vec<String>>,
    connections: AtomicUsize,
}

/// The running mock server.
pub struct MockSmtpServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl MockSmtpServer {
    #[must_use]
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder::default()
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every command line received, across all sessions, in arrival order.
    pub async fn commands(&self) -> Vec<String> {
        self.state.commands.read().await.clone()
    }

    /// Every DATA payload received, in arrival order.
    pub async fn messages(&self) -> Vec<String> {
        self.state.messages.read().await.clone()
    }

    /// Number of TCP connections accepted so far.
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::Relaxed)
    }
}

impl Drop for MockSmtpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_session(
    mut stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    writer
        .write_all(state.replies.greeting.line().as_bytes())
        .await?;
    writer.flush().await?;

    loop {
        line.clear();
        let read = timeout(Duration::from_secs(10), reader.read_line(&mut line)).await;
        let Ok(Ok(n)) = read else { return Ok(()) };
        if n == 0 {
            return Ok(());
        }

        let command = line.trim_end().to_string();
        state.commands.write().await.push(command.clone());

        let verb = command
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();

        let reply = match verb.as_str() {
            "EHLO" | "HELO" => "250-mock.example.com\r\n250 AUTH PLAIN\r\n".to_string(),
            "STARTTLS" => state.replies.starttls.line(),
            "AUTH" => state.replies.auth.line(),
            "MAIL" => state.replies.mail_from.line(),
            "RCPT" => state.replies.rcpt_to.line(),
            // A non-go-ahead DATA reply ends the exchange without content.
            "DATA" if !(300..400).contains(&state.replies.data.code) => {
                state.replies.data.line()
            }
            "DATA" => {
                writer.write_all(state.replies.data.line().as_bytes()).await?;
                writer.flush().await?;

                let mut content = String::new();
                loop {
                    line.clear();
                    let Ok(Ok(n)) =
                        timeout(Duration::from_secs(10), reader.read_line(&mut line)).await
                    else {
                        return Ok(());
                    };
                    if n == 0 {
                        return Ok(());
                    }
                    if line.trim_end() == "." {
                        break;
                    }
                    content.push_str(&line);
                }
                state.messages.write().await.push(content);

                state.replies.data_end.line()
            }
            "QUIT" => {
                writer.write_all(b"221 Bye\r\n").await?;
                writer.flush().await?;
                return Ok(());
            }
            _ => "250 OK\r\n".to_string(),
        };

        writer.write_all(reply.as_bytes()).await?;
        writer.flush().await?;
    }
}
