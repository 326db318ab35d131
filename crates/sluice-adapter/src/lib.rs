//! sluice-adapter library crate.
//!
//! Runs an asynchronous, message-passing web application behind a
//! synchronous function host: each host invocation becomes one request
//! cycle on a private runtime, and a process-long lifespan task carries the
//! application's startup and shutdown handshake.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Function host (HostRequest / HostResponse)
//!         ↕
//! [sluice-adapter]
//!   ├── domain/           Host records, AdapterConfig
//!   ├── application/      Adapter, RequestCycle, LifespanManager, Entrypoint
//!   └── infrastructure/   MessageChannel, Signal, runtimes, logging
//!         ↕
//! Application (Scope + receive/send handles, sluice-core messages)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no async or runtime dependencies.
//! - `application` depends on `domain`, `infrastructure` and `sluice-core`.
//! - `infrastructure` depends on `tokio` and `tracing-subscriber` only.
//!
//! # Example
//!
//! ```rust,no_run
//! use sluice_adapter::application::{app_fn, Adapter, Entrypoint};
//! use sluice_adapter::domain::{AdapterConfig, HostRequest};
//! use sluice_core::Message;
//!
//! let app = Entrypoint::v3(app_fn(|_scope, _receive, send| async move {
//!     send.send(Message::response_start(200, vec![])).await?;
//!     send.send(Message::response_body(b"hello".to_vec(), false)).await?;
//!     anyhow::Ok(())
//! }));
//! let config = AdapterConfig { lifespan: false, ..AdapterConfig::default() };
//! let adapter = Adapter::new(app, config)?;
//! let response = adapter.handle(&HostRequest::new("GET", "/"))?;
//! assert_eq!(response.body, b"hello");
//! # Ok::<(), sluice_adapter::application::AdapterError>(())
//! ```

/// Domain layer: host records and configuration (no I/O beyond config files).
pub mod domain;

/// Application layer: the adapter facade and the exchange drivers.
pub mod application;

/// Infrastructure layer: channel, signals, runtimes and logging.
pub mod infrastructure;
