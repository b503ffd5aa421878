//! A small asynchronous SMTP client.
//!
//! Supports plain TCP and SOCKS5-proxied connections, STARTTLS upgrade of
//! the existing stream, AUTH PLAIN, and the usual mail transaction commands
//! (MAIL FROM / RCPT TO / DATA / QUIT). Responses are parsed into
//! [`Response`] values so callers can distinguish rejection from transport
//! failure.

mod client;
mod connection;
mod error;
mod response;

pub use client::SmtpClient;
pub use error::{ClientError, Result};
pub use response::{Response, ResponseLine};
