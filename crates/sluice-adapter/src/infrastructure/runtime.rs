//! Tokio runtime construction.
//!
//! # Two kinds of runtime
//!
//! - **Cycle runtime** – a fresh current-thread runtime per request cycle.
//!   The cycle's application task is polled on the calling thread inside
//!   `block_on`, so nothing from one invocation can leak into another and no
//!   locks are shared between cycles.
//!
//! - **Lifespan runtime** – one small multi-thread runtime per process.  The
//!   lifespan task must keep running *between* invocations (it is parked in
//!   `receive()` waiting for the shutdown message), so it needs a worker
//!   thread of its own rather than the caller's thread.
//!
//! Both constructors return plain `io::Result`s; building a runtime only fails
//! when the OS refuses to create threads or an I/O driver.

use std::io;

use tokio::runtime::{Builder, Runtime};

/// Builds the isolated single-threaded scheduler for one request cycle.
pub fn cycle_runtime() -> io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Builds the process-lifetime runtime that hosts the lifespan task.
pub fn lifespan_runtime() -> io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("sluice-lifespan")
        .enable_all()
        .build()
}
