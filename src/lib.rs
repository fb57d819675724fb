//! # gatevisor
//!
//! **Gatevisor** keeps a long-lived gateway client (a Discord bot connection or
//! anything with the same shape) connected.
//!
//! It starts the client, waits for it to report readiness within a deadline,
//! classifies failures as fatal (bad credential, missing permission) or
//! retryable (network trouble, timeouts, early stops), and retries retryable
//! failures with capped exponential backoff. Before each attempt it can run
//! network diagnostics so an operator sees *why* the gateway is unreachable.
//!
//! ## Architecture
//! ```text
//!     ┌───────────────────┐      ┌──────────────────────┐
//!     │ Config (from_env) │      │ GatewayClient (user) │
//!     └─────────┬─────────┘      └──────────┬───────────┘
//!               ▼                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                 │
//! │  - Resolve       (system or IPv4-only, shared with client)  │
//! │  - Probe         (DNS / TCP / HTTP diagnostics)             │
//! │  - Bus           (broadcast events)                         │
//! │  - shutdown      (CancellationToken, OS signals)            │
//! └──────┬──────────────────────────────────────────────────────┘
//!        ▼
//!   attempt loop:
//!     AttemptStarting ─► diagnostics ─► run_attempt()
//!        ├─ client task:  start(credential)
//!        ├─ watchdog:     wait_until_ready()
//!        └─ first of (client, watchdog, deadline):
//!             ready            ─► ClientReady ─► wait for client exit
//!             credential/perm  ─► fatal, return Err
//!             timeout/failure  ─► cleanup ─► BackoffScheduled ─► sleep ─► loop
//!        │
//!        ▼ publish(Event)
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Bus (broadcast channel)                    │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                ▼
//!                          SubscriberSet
//!                       ┌────────┼────────┐
//!                       ▼        ▼        ▼
//!                   LogWriter  custom   custom
//!                   (tracing)
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Readiness deadline, classification, retry loop.          | [`Supervisor`], [`SupervisorBuilder`]       |
//! | **Client seam**   | What the supervisor drives.                              | [`GatewayClient`], [`Credential`]           |
//! | **Policies**      | Retry limit, backoff, jitter.                            | [`RetryPolicy`], [`BackoffPolicy`], [`JitterPolicy`] |
//! | **Diagnostics**   | DNS, TCP and HTTP probes; IPv4-only resolution.          | [`NetworkProbe`], [`Resolve`], [`Ipv4Only`] |
//! | **Events**        | Structured lifecycle events and subscribers.             | [`Event`], [`Subscribe`], [`LogWriter`]     |
//! | **Errors**        | Typed client, supervisor and config errors.              | [`ClientError`], [`SupervisorError`]        |
//! | **Configuration** | Defaults plus `GATEWAY_*` environment variables.         | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::{sync::Arc, time::Duration};
//! use async_trait::async_trait;
//! use gatevisor::{ClientError, Config, Credential, GatewayClient, RetryPolicy, Supervisor};
//!
//! /// Becomes ready at once and exits after a short session.
//! struct Quick;
//!
//! #[async_trait]
//! impl GatewayClient for Quick {
//!     async fn start(&self, _credential: Credential) -> Result<(), ClientError> {
//!         tokio::time::sleep(Duration::from_millis(20)).await;
//!         Ok(())
//!     }
//!     async fn wait_until_ready(&self) {}
//!     async fn close(&self) -> Result<(), ClientError> { Ok(()) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.retry = RetryPolicy::limited(3);
//!     cfg.diagnostics = false;
//!     cfg.handle_signals = false;
//!
//!     let sup = Supervisor::builder(cfg).with_subscribers(Vec::new()).build();
//!     sup.run(Arc::new(Quick), Credential::new("token")).await?;
//!     Ok(())
//! }
//! ```
mod client;
mod config;
mod core;
mod diagnostics;
mod error;
mod events;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use client::{ClientRef, Credential, GatewayClient};
pub use config::{
    Config, ENV_BACKOFF_BASE, ENV_BACKOFF_MAX, ENV_CONNECT_RETRIES, ENV_DIAGNOSTICS,
    ENV_FORCE_IPV4, ENV_JITTER, ENV_PROBE_HOSTS, ENV_PROBE_TCP, ENV_PROBE_URL, ENV_READY_TIMEOUT,
};
pub use core::{Supervisor, SupervisorBuilder, wait_for_shutdown_signal};
pub use diagnostics::{
    Ipv4Only, NetworkProbe, Probe, ProbeRef, ProbeReport, ProbeResult, ProbeTargets, Resolve,
    ResolverRef, SystemResolver, resolver_for,
};
pub use error::{ClientError, ConfigError, FailureClass, SupervisorError};
pub use events::{Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
