//! Logging setup.
//!
//! The library never installs a global subscriber.  The [`Adapter`] and the
//! [`LifespanManager`] take a `tracing::Dispatch` at construction and run all
//! of their work under it, so embedding code decides where logs go.
//!
//! [`Adapter`]: crate::application::Adapter
//! [`LifespanManager`]: crate::application::LifespanManager

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// Builds an injectable dispatch that formats to stderr.
///
/// `RUST_LOG` takes precedence; `default_level` (e.g. `"info"`) applies when
/// it is absent or invalid.
pub fn build_dispatch(default_level: &str) -> Dispatch {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .finish();
    Dispatch::new(subscriber)
}

/// Returns the dispatch currently in effect for the calling thread.
pub fn current_dispatch() -> Dispatch {
    tracing::dispatcher::get_default(Dispatch::clone)
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
