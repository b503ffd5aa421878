//! The core of cipherpost: the per-recipient encrypt-then-deliver pipeline
//! and the batch dispatcher that drives it.
//!
//! The one invariant everything here serves: nothing is ever transmitted
//! unless a key was first resolved for the exact recipient address, and the
//! only body that ever reaches the wire is the armored ciphertext.

mod dispatcher;
mod error;
mod outcome;
mod pipeline;

pub use dispatcher::run;
pub use error::TransportError;
pub use outcome::{BatchResult, DeliveryOutcome};
pub use pipeline::deliver;
