//! Runtime core: attempts, supervision and shutdown.
//!
//! The public API from this module is [`Supervisor`] and [`SupervisorBuilder`].
//!
//! Internal modules:
//! - [`race`]: client completion vs readiness vs deadline;
//! - [`attempt`]: one attempt with classification, events and cleanup;
//! - [`supervisor`]: the retry loop, diagnostics, subscribers and shutdown;
//! - [`shutdown`]: cross-platform signal handling.

mod attempt;
mod builder;
mod race;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use shutdown::wait_for_shutdown_signal;
pub use supervisor::Supervisor;
