//! # LogWriter: events to `tracing`
//!
//! Renders every [`Event`] as one `tracing` record under the `gatevisor` target,
//! with structured fields an operator can grep without reading source.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO  gatevisor: starting gateway client attempt=1 ready_timeout_ms=180000
//! INFO  gatevisor: [net] dns resolved host="gateway.discord.gg" addrs="162.159.135.234"
//! ERROR gatevisor: [net] tcp probe failed endpoint="gateway.discord.gg:443" error="timed out after 8s"
//! ERROR gatevisor: client not ready before deadline; almost always network/websocket trouble between this host and the gateway attempt=1 timeout_ms=180000
//! INFO  gatevisor: retry scheduled attempt=1 delay_ms=2000
//! ERROR gatevisor: CREDENTIAL REJECTED: the token is invalid or revoked; fix it, not retrying attempt=2
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber backed by `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let attempt = e.attempt.unwrap_or_default();
        let target = e.target.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::AttemptStarting => {
                info!(target: "gatevisor", attempt, ready_timeout_ms = ?e.timeout_ms, "starting gateway client");
            }
            EventKind::ClientReady => {
                info!(target: "gatevisor", attempt, client = target, elapsed_ms = ?e.elapsed_ms, "gateway client READY");
            }
            EventKind::ReadyTimeout => {
                error!(
                    target: "gatevisor",
                    attempt,
                    timeout_ms = ?e.timeout_ms,
                    "client not ready before deadline; almost always network/websocket trouble between this host and the gateway"
                );
            }
            EventKind::ClientStoppedEarly => {
                warn!(target: "gatevisor", attempt, elapsed_ms = ?e.elapsed_ms, "client stopped before READY without an error");
            }
            EventKind::ClientFailed => {
                error!(target: "gatevisor", attempt, elapsed_ms = ?e.elapsed_ms, error = reason, "client failed to start");
            }
            EventKind::CredentialRejected => {
                error!(target: "gatevisor", attempt, error = reason, "CREDENTIAL REJECTED: the token is invalid or revoked; fix it, not retrying");
            }
            EventKind::PermissionMissing => {
                error!(
                    target: "gatevisor",
                    attempt,
                    error = reason,
                    "PERMISSION MISSING: enable the required privileged intent/permission for this application, not retrying"
                );
            }
            EventKind::CloseFailed => {
                debug!(target: "gatevisor", attempt, client = target, error = reason, "close during cleanup failed");
            }
            EventKind::BackoffScheduled => {
                info!(target: "gatevisor", attempt, delay_ms = ?e.delay_ms, after = reason, "retry scheduled");
            }
            EventKind::ClientStopped => {
                info!(target: "gatevisor", attempt, elapsed_ms = ?e.elapsed_ms, "gateway client stopped");
            }
            EventKind::ClientCrashed => {
                error!(target: "gatevisor", attempt, elapsed_ms = ?e.elapsed_ms, error = reason, "gateway client exited with an error after READY");
            }
            EventKind::DnsResolved => {
                info!(target: "gatevisor", host = target, addrs = reason, "[net] dns resolved");
            }
            EventKind::DnsFailed => {
                error!(target: "gatevisor", host = target, error = reason, "[net] dns failed");
            }
            EventKind::TcpProbeSucceeded => {
                info!(target: "gatevisor", endpoint = target, elapsed_ms = ?e.elapsed_ms, "[net] tcp probe ok");
            }
            EventKind::TcpProbeFailed => {
                error!(target: "gatevisor", endpoint = target, error = reason, "[net] tcp probe failed");
            }
            EventKind::HttpProbeCompleted => {
                info!(target: "gatevisor", url = target, status = ?e.status, "[net] http probe");
            }
            EventKind::HttpProbeFailed => {
                error!(target: "gatevisor", url = target, error = reason, "[net] http probe failed");
            }
            EventKind::RetriesExhausted => {
                error!(target: "gatevisor", attempt, last = reason, "retry limit reached, giving up");
            }
            EventKind::ShutdownRequested => {
                info!(target: "gatevisor", "shutdown requested");
            }
            EventKind::SupervisorStopped => {
                debug!(target: "gatevisor", outcome = reason, "supervisor stopped");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
