//! Application entry points and the receive/send handles given to them.
//!
//! # Calling conventions
//!
//! Applications come in two shapes, chosen at configuration time:
//!
//! ```text
//! V3:  app.call(scope, receive, send).await
//! V2:  app.instantiate(scope)            → instance
//!      instance.run(receive, send).await
//! ```
//!
//! [`Entrypoint`] is the enumerated strategy that holds one or the other.
//! The drivers only ever call [`Entrypoint::invoke`], so both shapes produce
//! identical exchanges for identical message sequences.
//!
//! # Closures
//!
//! [`app_fn`] and [`factory_fn`] turn plain closures into applications, which
//! is what most tests and small handlers want:
//!
//! ```rust
//! use sluice_adapter::application::{app_fn, Entrypoint};
//! use sluice_core::Message;
//!
//! let hello = Entrypoint::v3(app_fn(|_scope, _receive, send| async move {
//!     send.send(Message::response_start(200, vec![])).await?;
//!     send.send(Message::response_body(b"hi".to_vec(), false)).await?;
//!     anyhow::Ok(())
//! }));
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use sluice_core::{Message, ProtocolError, ProtocolVersion, Scope};

use crate::infrastructure::channel::{ChannelError, MessageChannel};

// ── Receive / send handles ────────────────────────────────────────────────────

/// Where outbound messages go.  Implemented by the request cycle and by the
/// lifespan manager, each with its own ordering rules.
pub(crate) trait Outbound: Send + Sync {
    fn deliver(&self, message: Message) -> Result<(), ProtocolError>;
}

/// The application's inbound handle.
#[derive(Clone)]
pub struct Receiver {
    channel: Arc<MessageChannel>,
}

impl Receiver {
    pub(crate) fn new(channel: Arc<MessageChannel>) -> Self {
        Self { channel }
    }

    /// Waits for the next inbound message.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the driver side is gone.
    pub async fn receive(&self) -> Result<Message, ChannelError> {
        self.channel.get().await
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver").finish_non_exhaustive()
    }
}

/// The application's outbound handle.
#[derive(Clone)]
pub struct Sender {
    outbound: Arc<dyn Outbound>,
}

impl Sender {
    pub(crate) fn new(outbound: Arc<dyn Outbound>) -> Self {
        Self { outbound }
    }

    /// Hands `message` to the driver.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the message is not valid at this point of
    /// the exchange.  The driver remembers the violation even if the
    /// application ignores this error.
    pub async fn send(&self, message: Message) -> Result<(), ProtocolError> {
        self.outbound.deliver(message)
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}

// ── Application traits ────────────────────────────────────────────────────────

/// A V3 application: called once per scope with both handles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Application: Send + Sync {
    async fn call(&self, scope: Scope, receive: Receiver, send: Sender) -> anyhow::Result<()>;
}

/// A V2 application instance, bound to one scope.
#[async_trait]
pub trait ApplicationInstance: Send {
    async fn run(self: Box<Self>, receive: Receiver, send: Sender) -> anyhow::Result<()>;
}

/// A V2 application: builds one instance per scope.
pub trait ApplicationFactory: Send + Sync {
    fn instantiate(&self, scope: Scope) -> Box<dyn ApplicationInstance>;
}

// ── Entrypoint strategy ───────────────────────────────────────────────────────

/// An application together with its calling convention.
#[derive(Clone)]
pub enum Entrypoint {
    V2(Arc<dyn ApplicationFactory>),
    V3(Arc<dyn Application>),
}

impl Entrypoint {
    pub fn v2(factory: impl ApplicationFactory + 'static) -> Self {
        Entrypoint::V2(Arc::new(factory))
    }

    pub fn v3(app: impl Application + 'static) -> Self {
        Entrypoint::V3(Arc::new(app))
    }

    /// The calling convention this entrypoint uses.
    pub fn version(&self) -> ProtocolVersion {
        match self {
            Entrypoint::V2(_) => ProtocolVersion::V2,
            Entrypoint::V3(_) => ProtocolVersion::V3,
        }
    }

    /// Runs the application for `scope` until it returns.
    pub async fn invoke(self, scope: Scope, receive: Receiver, send: Sender) -> anyhow::Result<()> {
        match self {
            Entrypoint::V3(app) => app.call(scope, receive, send).await,
            Entrypoint::V2(factory) => factory.instantiate(scope).run(receive, send).await,
        }
    }
}

impl fmt::Debug for Entrypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entrypoint::{:?}", self.version())
    }
}

// ── Closure adapters ──────────────────────────────────────────────────────────

/// A V3 [`Application`] backed by a closure.  Build with [`app_fn`].
pub struct AppFn<F> {
    f: F,
}

/// Wraps `f(scope, receive, send) -> Future` as a V3 application.
pub fn app_fn<F, Fut>(f: F) -> AppFn<F>
where
    F: Fn(Scope, Receiver, Sender) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    AppFn { f }
}

#[async_trait]
impl<F, Fut> Application for AppFn<F>
where
    F: Fn(Scope, Receiver, Sender) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn call(&self, scope: Scope, receive: Receiver, send: Sender) -> anyhow::Result<()> {
        (self.f)(scope, receive, send).await
    }
}

/// A V2 [`ApplicationFactory`] backed by a closure.  Build with [`factory_fn`].
pub struct FactoryFn<F> {
    f: F,
}

/// Wraps `f(scope) -> (|receive, send| Future)` as a V2 application.
pub fn factory_fn<F, I, Fut>(f: F) -> FactoryFn<F>
where
    F: Fn(Scope) -> I + Send + Sync,
    I: FnOnce(Receiver, Sender) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FactoryFn { f }
}

impl<F, I, Fut> ApplicationFactory for FactoryFn<F>
where
    F: Fn(Scope) -> I + Send + Sync,
    I: FnOnce(Receiver, Sender) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn instantiate(&self, scope: Scope) -> Box<dyn ApplicationInstance> {
        Box::new(InstanceFn {
            run: (self.f)(scope),
        })
    }
}

struct InstanceFn<I> {
    run: I,
}

#[async_trait]
impl<I, Fut> ApplicationInstance for InstanceFn<I>
where
    I: FnOnce(Receiver, Sender) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(self: Box<Self>, receive: Receiver, send: Sender) -> anyhow::Result<()> {
        (self.run)(receive, send).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
