//! Drives one HTTP exchange from a blocking caller.
//!
//! # Flow
//!
//! ```text
//! caller thread                        cycle runtime (current-thread)
//! ─────────────                        ──────────────────────────────
//! build runtime
//! seed http.request ─────────────────► MessageChannel
//! spawn application ─────────────────► app.receive()  ◄── http.request
//! block_on(join) ·····················  app.send(start) ──► CycleOutbox
//!                                       app.send(body)  ──► CycleOutbox ──► http.disconnect
//! ◄──────────────────────────────────── app returns
//! resolve outcome
//! ```
//!
//! Outcomes are resolved in a fixed order: a recorded protocol violation
//! wins over a panic, a panic over an application error, and an application
//! error over an unfinished response.  A violation is recorded by the outbox
//! itself, so it surfaces even if the application discards the error `send`
//! returned.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use sluice_core::{
    CycleResponse, CycleState, HttpScope, Message, ProtocolError, ResponseAccumulator, Scope,
    Step,
};

use crate::application::app::{Entrypoint, Outbound, Receiver, Sender};
use crate::infrastructure::channel::MessageChannel;
use crate::infrastructure::runtime;

/// Errors that end a request cycle without a response.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The application sent a message that is invalid for the cycle state.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// The application returned an error of its own.
    #[error("application failed: {0:#}")]
    Application(anyhow::Error),

    /// The application returned successfully but never sent the final body
    /// chunk.
    #[error("application returned before completing the response (state: {state:?})")]
    IncompleteResponse { state: CycleState },

    /// The application task panicked.
    #[error("application panicked: {0}")]
    ApplicationPanicked(String),

    /// The per-cycle runtime could not be built.
    #[error("failed to build cycle runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl CycleError {
    /// Stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CycleError::Protocol(err) => err.as_label(),
            CycleError::Application(_) => "cycle_application_error",
            CycleError::IncompleteResponse { .. } => "cycle_incomplete_response",
            CycleError::ApplicationPanicked(_) => "cycle_application_panicked",
            CycleError::Runtime(_) => "cycle_runtime",
        }
    }
}

/// One request/response exchange with an application.
#[derive(Debug)]
pub struct RequestCycle {
    scope: HttpScope,
    invocation_id: Uuid,
}

impl RequestCycle {
    pub fn new(scope: HttpScope) -> Self {
        Self {
            scope,
            invocation_id: Uuid::new_v4(),
        }
    }

    /// Identifier carried by every log line of this cycle.
    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// Runs `entrypoint` against this cycle's scope with `body` as the only
    /// inbound request message, and blocks until the application returns.
    ///
    /// Must be called from outside an async context: the cycle enters a
    /// runtime of its own.
    ///
    /// # Errors
    ///
    /// See [`CycleError`] for the failure modes and the order in which they
    /// take precedence.
    pub fn run(self, entrypoint: &Entrypoint, body: Vec<u8>) -> Result<CycleResponse, CycleError> {
        let span = info_span!(
            "cycle",
            invocation_id = %self.invocation_id,
            method = %self.scope.method,
            path = %self.scope.path,
        );
        let _entered = span.enter();

        let runtime = runtime::cycle_runtime().map_err(CycleError::Runtime)?;

        let channel = Arc::new(MessageChannel::new());
        channel.put(Message::request(body));
        let outbox = Arc::new(CycleOutbox::new(Arc::clone(&channel)));

        let receive = Receiver::new(channel);
        let send = Sender::new(outbox.clone());
        let app = entrypoint
            .clone()
            .invoke(Scope::Http(self.scope), receive, send)
            .in_current_span();

        debug!("starting application");
        let joined = runtime.block_on(async move { tokio::spawn(app).await });
        drop(runtime);

        let state = outbox.take();
        let result = resolve(joined, state);
        match &result {
            Ok(response) => debug!(
                status = response.status,
                body_len = response.body.len(),
                "cycle complete"
            ),
            Err(err) => warn!(error = %err, label = err.as_label(), "cycle failed"),
        }
        result
    }
}

/// Applies the outcome precedence described in the module docs.
fn resolve(
    joined: Result<anyhow::Result<()>, tokio::task::JoinError>,
    state: OutboxState,
) -> Result<CycleResponse, CycleError> {
    if let Some(violation) = state.violation {
        return Err(CycleError::Protocol(violation));
    }

    match joined {
        Err(join_error) if join_error.is_panic() => {
            return Err(CycleError::ApplicationPanicked(panic_message(
                join_error.into_panic(),
            )))
        }
        Err(join_error) => return Err(CycleError::Application(join_error.into())),
        Ok(Err(app_error)) => return Err(CycleError::Application(app_error)),
        Ok(Ok(())) => {}
    }

    let reached = state.accumulator.state();
    state
        .accumulator
        .finish()
        .ok_or(CycleError::IncompleteResponse { state: reached })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ── Outbox ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct OutboxState {
    accumulator: ResponseAccumulator,
    violation: Option<ProtocolError>,
}

/// The cycle's outbound side: validates each message, builds the response
/// and posts `http.disconnect` once the final chunk is accepted.
struct CycleOutbox {
    channel: Arc<MessageChannel>,
    state: Mutex<OutboxState>,
}

impl CycleOutbox {
    fn new(channel: Arc<MessageChannel>) -> Self {
        Self {
            channel,
            state: Mutex::new(OutboxState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OutboxState> {
        // A panicking application cannot leave the accumulator half-updated:
        // `apply` only commits after validation.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self) -> OutboxState {
        std::mem::take(&mut *self.lock())
    }
}

impl Outbound for CycleOutbox {
    fn deliver(&self, message: Message) -> Result<(), ProtocolError> {
        let mut state = self.lock();
        if let Some(violation) = &state.violation {
            return Err(violation.clone());
        }

        match state.accumulator.apply(message) {
            Ok(Step::Completed) => {
                debug!("response complete, posting disconnect");
                self.channel.put(Message::HttpDisconnect);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(error = %err, label = err.as_label(), "protocol violation");
                state.violation = Some(err.clone());
                Err(err)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
