//! Startup/shutdown handshake with a long-lived application task.
//!
//! The lifespan exchange outlives any single request: the application is
//! started once, answers `lifespan.startup`, then sits in `receive()` until
//! `lifespan.shutdown` arrives, possibly many invocations later.  The task
//! therefore runs on a runtime owned by the [`LifespanManager`], and the
//! blocking callers only wait on the two completion [`Signal`]s.
//!
//! If the application ends the exchange early, whether by returning, failing
//! or panicking, both signals are set so that no waiter can hang.  Failures
//! are logged and otherwise ignored: many applications simply do not support
//! lifespan.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Runtime;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, warn, Dispatch};

use sluice_core::{AsgiInfo, LifespanScope, Message, ProtocolError, Scope};

use crate::application::app::{Entrypoint, Outbound, Receiver, Sender};
use crate::infrastructure::channel::MessageChannel;
use crate::infrastructure::runtime;
use crate::infrastructure::signal::Signal;

/// The two completion flags, which double as the lifespan send handle.
///
/// A message that does not belong to the lifespan exchange ends it: the
/// first one is recorded and both flags are released.
#[derive(Debug, Default)]
struct LifespanSignals {
    startup: Signal,
    shutdown: Signal,
    violation: Mutex<Option<ProtocolError>>,
}

impl LifespanSignals {
    /// Sets both flags; used when the lifespan task ends.  Shutdown goes
    /// first so a woken startup waiter already sees both set.
    fn release(&self) {
        self.shutdown.set();
        self.startup.set();
    }

    fn violation(&self) -> MutexGuard<'_, Option<ProtocolError>> {
        self.violation.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Outbound for LifespanSignals {
    fn deliver(&self, message: Message) -> Result<(), ProtocolError> {
        if let Some(violation) = &*self.violation() {
            return Err(violation.clone());
        }

        match message {
            Message::LifespanStartupComplete => {
                if self.startup.set() {
                    info!("lifespan startup complete");
                }
                Ok(())
            }
            Message::LifespanShutdownComplete => {
                if self.shutdown.set() {
                    info!("lifespan shutdown complete");
                }
                Ok(())
            }
            other => {
                let err = ProtocolError::UnexpectedLifespanMessage {
                    received: other.message_type(),
                };
                warn!(error = %err, label = err.as_label(), "lifespan protocol violation");
                *self.violation() = Some(err.clone());
                self.release();
                Err(err)
            }
        }
    }
}

/// Owns the lifespan task, its inbound channel and its completion signals.
pub struct LifespanManager {
    runtime: Runtime,
    channel: Arc<MessageChannel>,
    signals: Arc<LifespanSignals>,
    startup_requested: AtomicBool,
    shutdown_requested: AtomicBool,
    dispatch: Dispatch,
}

impl LifespanManager {
    /// Creates a manager whose task and logs run under `dispatch`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the lifespan runtime cannot be built.
    pub fn new(dispatch: Dispatch) -> io::Result<Self> {
        Ok(Self {
            runtime: runtime::lifespan_runtime()?,
            channel: Arc::new(MessageChannel::new()),
            signals: Arc::new(LifespanSignals::default()),
            startup_requested: AtomicBool::new(false),
            shutdown_requested: AtomicBool::new(false),
            dispatch,
        })
    }

    /// Spawns the application with a lifespan scope.  Returns immediately.
    pub fn run(&self, entrypoint: &Entrypoint) {
        let scope = Scope::Lifespan(LifespanScope {
            asgi: AsgiInfo::new(entrypoint.version()),
        });
        let receive = Receiver::new(Arc::clone(&self.channel));
        let send = Sender::new(self.signals.clone());
        let app = entrypoint
            .clone()
            .invoke(scope, receive, send)
            .with_subscriber(self.dispatch.clone());

        let signals = Arc::clone(&self.signals);
        let supervisor = async move {
            match tokio::spawn(app).await {
                Ok(Ok(())) => debug!("lifespan task finished"),
                Ok(Err(err)) => warn!(
                    error = %format!("{err:#}"),
                    "lifespan task failed, continuing without lifespan"
                ),
                Err(join_error) => error!(error = %join_error, "lifespan task aborted"),
            }
            signals.release();
        };
        self.runtime
            .spawn(supervisor.with_subscriber(self.dispatch.clone()));
    }

    /// Posts `lifespan.startup` and blocks until startup is complete.
    ///
    /// Startup is requested at most once; later calls only wait.
    pub fn await_startup(&self) {
        if self.signals.startup.is_set() {
            return;
        }
        if !self.startup_requested.swap(true, Ordering::SeqCst) {
            tracing::dispatcher::with_default(&self.dispatch, || {
                debug!("requesting lifespan startup");
            });
            self.channel.put(Message::LifespanStartup);
        }
        self.runtime.block_on(self.signals.startup.wait());
    }

    /// Posts `lifespan.shutdown` and blocks until shutdown is complete.
    ///
    /// Returns immediately if shutdown already completed, without posting a
    /// second request.
    pub fn await_shutdown(&self) {
        if self.signals.shutdown.is_set() {
            return;
        }
        if !self.shutdown_requested.swap(true, Ordering::SeqCst) {
            tracing::dispatcher::with_default(&self.dispatch, || {
                debug!("requesting lifespan shutdown");
            });
            self.channel.put(Message::LifespanShutdown);
        }
        self.runtime.block_on(self.signals.shutdown.wait());
    }

    pub fn is_startup_complete(&self) -> bool {
        self.signals.startup.is_set()
    }

    pub fn is_shutdown_complete(&self) -> bool {
        self.signals.shutdown.is_set()
    }

    /// The protocol violation that ended the exchange, if any.
    pub fn violation(&self) -> Option<ProtocolError> {
        self.signals.violation().clone()
    }
}

impl fmt::Debug for LifespanManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifespanManager")
            .field("startup_complete", &self.is_startup_complete())
            .field("shutdown_complete", &self.is_shutdown_complete())
            .field("violation", &self.violation())
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
