//! Domain layer: the request-cycle state machine.
//!
//! Pure logic, no I/O and no async runtime.  The adapter crate feeds outbound
//! application messages into [`cycle::ResponseAccumulator`] and acts on the
//! [`cycle::Step`] it gets back.

pub mod cycle;

pub use cycle::{CycleResponse, CycleState, ResponseAccumulator, Step};
