//! Application layer for sluice-adapter.
//!
//! Drives applications through exchanges:
//!
//! - [`app`] – the application traits, the [`Entrypoint`] calling-convention
//!   strategy and the receive/send handles.
//! - [`request_cycle`] – one HTTP exchange on a fresh runtime.
//! - [`lifespan`] – the process-long startup/shutdown exchange.
//! - [`translate`] – host records to scopes and back.
//! - [`adapter`] – the facade a host calls.

pub mod adapter;
pub mod app;
pub mod lifespan;
pub mod request_cycle;
pub mod translate;

pub use adapter::{Adapter, AdapterBuilder, AdapterError};
pub use app::{
    app_fn, factory_fn, AppFn, Application, ApplicationFactory, ApplicationInstance, Entrypoint,
    FactoryFn, Receiver, Sender,
};
pub use lifespan::LifespanManager;
pub use request_cycle::{CycleError, RequestCycle};
