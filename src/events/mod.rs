//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (attempt loop, backoff, shutdown),
//!   `core::attempt::run_attempt` (ready/failure classification, cleanup),
//!   diagnostics reports.
//! - **Consumers**: the supervisor's listener (fans out to `SubscriberSet`) and any
//!   receiver obtained from `Supervisor::subscribe()`.

mod bus;
mod event;

pub(crate) use bus::Bus;
pub use event::{Event, EventKind};
