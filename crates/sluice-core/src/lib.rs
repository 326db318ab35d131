//! # sluice-core
//!
//! Shared library for Sluice containing the application protocol message
//! types, connection scopes, header decoding and the request-cycle state
//! machine.
//!
//! This crate has zero dependencies on async runtimes, sockets or threads.
//! Everything here is plain data plus pure functions, which keeps the
//! ordering rules of the protocol testable without spinning up a runtime.
//!
//! # Architecture overview
//!
//! Sluice lets an asynchronous, message-passing web application run behind a
//! synchronous, single-shot invocation model (a serverless function host).
//! The application never sees the host: it only sees a [`Scope`] describing
//! the connection and two message streams, one inbound and one outbound.
//!
//! - **`protocol`** – What travels between the host side and the application:
//!   the tagged [`Message`] enum, the [`Scope`] descriptors handed to the
//!   application, header decoding and the [`ProtocolError`] type.
//!
//! - **`domain`** – The request-cycle state machine.  [`CycleState`] decides
//!   which outbound message is valid next, and [`ResponseAccumulator`] folds
//!   the accepted messages into a single buffered [`CycleResponse`].

pub mod domain;
pub mod protocol;

pub use domain::cycle::{CycleResponse, CycleState, ResponseAccumulator, Step};
pub use protocol::error::ProtocolError;
pub use protocol::messages::{header, HeaderPair, Message, MessageType};
pub use protocol::scope::{AsgiInfo, HttpScope, LifespanScope, ProtocolVersion, Scope};
