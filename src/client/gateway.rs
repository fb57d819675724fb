//! # The wrapped gateway client.
//!
//! [`GatewayClient`] is the seam between the supervisor and whatever actually
//! speaks the gateway protocol. The supervisor never looks inside; it only
//! starts the client, waits for readiness, and closes it.
//!
//! The common handle type is [`ClientRef`], an `Arc<dyn GatewayClient>` that the
//! supervisor clones into the connection task and the readiness watchdog.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{client::Credential, error::ClientError};

/// # Long-lived gateway connection.
///
/// ## Contract
/// - [`start`](GatewayClient::start) runs the connection until it ends. It should
///   not return before readiness unless something went wrong; a clean return
///   before readiness is treated as an unexpected early stop and retried.
/// - [`wait_until_ready`](GatewayClient::wait_until_ready) completes once the
///   handshake is done. It may be called before `start` has made progress, and
///   the returned future may be dropped at any time.
/// - [`close`](GatewayClient::close) is idempotent and safe on a client that was
///   never started. After `close`, a new `start` must be possible.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use gatevisor::{ClientError, Credential, GatewayClient};
///
/// struct Noop;
///
/// #[async_trait]
/// impl GatewayClient for Noop {
///     async fn start(&self, _credential: Credential) -> Result<(), ClientError> {
///         std::future::pending().await
///     }
///     async fn wait_until_ready(&self) {}
///     async fn close(&self) -> Result<(), ClientError> { Ok(()) }
/// }
/// ```
#[async_trait]
pub trait GatewayClient: Send + Sync + 'static {
    /// Stable, human-readable client name (used in events).
    fn name(&self) -> &str {
        "gateway"
    }

    /// Connects with `credential` and runs until the connection ends.
    async fn start(&self, credential: Credential) -> Result<(), ClientError>;

    /// Completes once the client has signaled readiness.
    async fn wait_until_ready(&self);

    /// Closes the connection (idempotent).
    async fn close(&self) -> Result<(), ClientError>;
}

/// Shared handle to a gateway client.
pub type ClientRef = Arc<dyn GatewayClient>;
