//! Infrastructure layer for sluice-adapter.
//!
//! Everything that touches the async runtime or the logging backend lives
//! here: the message channel, completion signals, runtime construction and
//! subscriber setup.
//!
//! # What does NOT belong here?
//!
//! - Message ordering rules (that is `sluice_core::domain`)
//! - Driving an application through an exchange (that is the application layer)

pub mod channel;
pub mod logging;
pub mod runtime;
pub mod signal;

pub use channel::{ChannelError, MessageChannel};
pub use signal::Signal;
