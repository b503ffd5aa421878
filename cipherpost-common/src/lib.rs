//! Shared types for the cipherpost mailer: configuration, the parsed
//! message file, the outgoing envelope, and logging setup.

pub mod config;
pub mod envelope;
pub mod logging;
pub mod message;

pub use tracing;
