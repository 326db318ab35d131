//! Domain layer for sluice-adapter.
//!
//! Plain data with no dependency on the async runtime: adapter configuration
//! and the host-facing request/response records.

pub mod config;
pub mod host;

pub use config::{AdapterConfig, ConfigError, ShutdownPolicy};
pub use host::{HostRequest, HostResponse};
