//! The host-facing facade.
//!
//! An [`Adapter`] is built once per process around an application and then
//! handles any number of invocations:
//!
//! ```text
//! build ── lifespan enabled? ──► spawn lifespan task, await startup
//!   │
//! handle(request) ──► build scope ──► RequestCycle::run ──► HostResponse
//!   │                                        │
//!   │                  AfterEachRequest ─────┴──► await shutdown
//!   │
//! shutdown() / drop ── OnDrop ──► await shutdown
//! ```
//!
//! Every step runs under the adapter's `tracing::Dispatch`, so logs go
//! wherever the embedding code pointed them.

use std::fmt;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::{info, Dispatch};

use sluice_core::ProtocolVersion;

use crate::application::app::Entrypoint;
use crate::application::lifespan::LifespanManager;
use crate::application::request_cycle::{CycleError, RequestCycle};
use crate::application::translate;
use crate::domain::config::{AdapterConfig, ConfigError, ShutdownPolicy};
use crate::domain::host::{HostRequest, HostResponse};
use crate::infrastructure::logging::current_dispatch;

/// Errors surfaced to the host.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The request cycle failed.
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// The configured calling convention differs from the entrypoint's.
    #[error("configured protocol version {configured} does not match the supplied {supplied} entrypoint")]
    ProtocolVersionMismatch {
        configured: ProtocolVersion,
        supplied: ProtocolVersion,
    },

    /// The host request URL could not be parsed.
    #[error("invalid request URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The lifespan runtime could not be built.
    #[error("failed to build lifespan runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AdapterError {
    /// Stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            AdapterError::Cycle(err) => err.as_label(),
            AdapterError::ProtocolVersionMismatch { .. } => "adapter_version_mismatch",
            AdapterError::InvalidUrl { .. } => "adapter_invalid_url",
            AdapterError::Runtime(_) => "adapter_runtime",
            AdapterError::Config(_) => "adapter_config",
        }
    }
}

/// Builder for [`Adapter`].
#[derive(Debug)]
pub struct AdapterBuilder {
    entrypoint: Entrypoint,
    config: AdapterConfig,
    dispatch: Option<Dispatch>,
}

impl AdapterBuilder {
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the logging sink.  Defaults to the dispatch current at
    /// [`build`](Self::build) time.
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Validates the configuration and, when lifespan is enabled, blocks until
    /// the application has finished starting up.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::ProtocolVersionMismatch`] if the configured version
    ///   is not the entrypoint's.
    /// - [`AdapterError::Runtime`] if the lifespan runtime cannot be built.
    pub fn build(self) -> Result<Adapter, AdapterError> {
        let AdapterBuilder {
            entrypoint,
            config,
            dispatch,
        } = self;

        let supplied = entrypoint.version();
        if config.protocol_version != supplied {
            return Err(AdapterError::ProtocolVersionMismatch {
                configured: config.protocol_version,
                supplied,
            });
        }

        let dispatch = dispatch.unwrap_or_else(current_dispatch);

        let lifespan = if config.lifespan {
            let manager = LifespanManager::new(dispatch.clone()).map_err(AdapterError::Runtime)?;
            manager.run(&entrypoint);
            manager.await_startup();
            Some(manager)
        } else {
            None
        };

        tracing::dispatcher::with_default(&dispatch, || {
            info!(
                protocol_version = %config.protocol_version,
                lifespan = config.lifespan,
                shutdown_policy = ?config.shutdown_policy,
                "adapter ready"
            );
        });

        Ok(Adapter {
            entrypoint,
            config,
            lifespan,
            dispatch,
        })
    }
}

/// Runs an application behind synchronous host invocations.
pub struct Adapter {
    entrypoint: Entrypoint,
    config: AdapterConfig,
    lifespan: Option<LifespanManager>,
    dispatch: Dispatch,
}

impl Adapter {
    pub fn builder(entrypoint: Entrypoint) -> AdapterBuilder {
        AdapterBuilder {
            entrypoint,
            config: AdapterConfig::default(),
            dispatch: None,
        }
    }

    /// Builds an adapter with `config` and the caller's current dispatch.
    ///
    /// # Errors
    ///
    /// See [`AdapterBuilder::build`].
    pub fn new(entrypoint: Entrypoint, config: AdapterConfig) -> Result<Self, AdapterError> {
        Self::builder(entrypoint).config(config).build()
    }

    /// Builds an adapter from a TOML config file.
    ///
    /// # Errors
    ///
    /// [`AdapterError::Config`] if the file cannot be loaded, otherwise see
    /// [`AdapterBuilder::build`].
    pub fn from_config_file(entrypoint: Entrypoint, path: &Path) -> Result<Self, AdapterError> {
        let config = AdapterConfig::load(path)?;
        Self::new(entrypoint, config)
    }

    /// Handles one host request.  Blocks until the application has finished
    /// the response and, under [`ShutdownPolicy::AfterEachRequest`], until
    /// lifespan shutdown has completed.
    ///
    /// Must be called from outside an async context.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidUrl`] for an unparseable URL and
    /// [`AdapterError::Cycle`] when the exchange fails.  Shutdown is not
    /// requested after a failed exchange.
    pub fn handle(&self, request: &HostRequest) -> Result<HostResponse, AdapterError> {
        tracing::dispatcher::with_default(&self.dispatch, || {
            let scope = translate::build_scope(request, self.config.protocol_version)?;
            let body = request.body.clone().unwrap_or_default();
            let response = RequestCycle::new(scope).run(&self.entrypoint, body)?;

            if self.config.shutdown_policy == ShutdownPolicy::AfterEachRequest {
                if let Some(lifespan) = &self.lifespan {
                    lifespan.await_shutdown();
                }
            }
            Ok(translate::into_host_response(response))
        })
    }

    /// Runs the lifespan shutdown handshake if it has not completed yet.
    pub fn shutdown(&self) {
        if let Some(lifespan) = &self.lifespan {
            lifespan.await_shutdown();
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// The lifespan manager, if lifespan is enabled.
    pub fn lifespan(&self) -> Option<&LifespanManager> {
        self.lifespan.as_ref()
    }
}

impl Drop for Adapter {
    fn drop(&mut self) {
        if self.config.shutdown_policy == ShutdownPolicy::OnDrop {
            self.shutdown();
        }
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("entrypoint", &self.entrypoint)
            .field("config", &self.config)
            .field("lifespan", &self.lifespan)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
