//! # Runtime events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Attempt lifecycle**: starting, ready, classified failures, backoff
//! - **Diagnostics**: DNS / TCP / HTTP probe results
//! - **Terminal**: retries exhausted, shutdown, supervisor stopped
//!
//! The [`Event`] struct carries optional metadata: attempt number, durations,
//! probe target, HTTP status, and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use gatevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ReadyTimeout)
//!     .with_attempt(3)
//!     .with_timeout(Duration::from_secs(180));
//!
//! assert_eq!(ev.kind, EventKind::ReadyTimeout);
//! assert_eq!(ev.attempt, Some(3));
//! assert_eq!(ev.timeout_ms, Some(180_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Attempt lifecycle ===
    /// A connection attempt is starting.
    ///
    /// Sets: `attempt`, `timeout_ms` (ready deadline)
    AttemptStarting,

    /// The readiness watchdog fired first.
    ///
    /// Sets: `attempt`, `elapsed_ms`, `target` (client name)
    ClientReady,

    /// Neither readiness nor client exit within the deadline (retryable).
    ///
    /// Sets: `attempt`, `timeout_ms`, `elapsed_ms`
    ReadyTimeout,

    /// The client returned cleanly before signaling readiness (retryable).
    ///
    /// Sets: `attempt`, `elapsed_ms`
    ClientStoppedEarly,

    /// The client (or watchdog) failed before readiness (retryable).
    ///
    /// Sets: `attempt`, `elapsed_ms`, `reason`
    ClientFailed,

    /// The gateway rejected the credential (fatal).
    ///
    /// Sets: `attempt`, `reason`
    CredentialRejected,

    /// A required permission/intent is not granted (fatal).
    ///
    /// Sets: `attempt`, `reason`
    PermissionMissing,

    /// `close()` failed or exceeded the grace period during cleanup.
    ///
    /// Sets: `attempt`, `target`, `reason`
    CloseFailed,

    /// Next attempt scheduled after a retryable failure.
    ///
    /// Sets: `attempt` (the failed one), `delay_ms`, `reason`
    BackoffScheduled,

    /// After readiness, the client ended normally.
    ///
    /// Sets: `attempt`, `elapsed_ms`
    ClientStopped,

    /// After readiness, the client ended with a non-fatal error or panicked.
    ///
    /// Sets: `attempt`, `elapsed_ms`, `reason`
    ClientCrashed,

    // === Diagnostics ===
    /// A probe hostname resolved.
    ///
    /// Sets: `attempt`, `target` (hostname), `reason` (comma-separated addresses)
    DnsResolved,

    /// A probe hostname did not resolve.
    ///
    /// Sets: `attempt`, `target`, `reason`
    DnsFailed,

    /// TCP connect to the probe endpoint succeeded.
    ///
    /// Sets: `attempt`, `target` (`host:port`), `elapsed_ms`
    TcpProbeSucceeded,

    /// TCP connect to the probe endpoint failed or timed out.
    ///
    /// Sets: `attempt`, `target`, `reason`
    TcpProbeFailed,

    /// The HTTP probe got a response (any status).
    ///
    /// Sets: `attempt`, `target` (URL), `status`
    HttpProbeCompleted,

    /// The HTTP probe did not get a response.
    ///
    /// Sets: `attempt`, `target`, `reason`
    HttpProbeFailed,

    // === Terminal ===
    /// The retry limit was reached.
    ///
    /// Sets: `attempt`, `reason` (last failure)
    RetriesExhausted,

    /// Shutdown requested (OS signal or token).
    ShutdownRequested,

    /// Last event of every run.
    ///
    /// Sets: `reason` (`ok` or the error message)
    SupervisorStopped,
}

impl EventKind {
    /// True for the diagnostic probe results.
    pub fn is_diagnostic(self) -> bool {
        matches!(
            self,
            EventKind::DnsResolved
                | EventKind::DnsFailed
                | EventKind::TcpProbeSucceeded
                | EventKind::TcpProbeFailed
                | EventKind::HttpProbeCompleted
                | EventKind::HttpProbeFailed
        )
    }

    /// True for events that end a run with an operator-actionable failure.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            EventKind::CredentialRejected | EventKind::PermissionMissing
        )
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Ready deadline in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Backoff delay before the next attempt in milliseconds.
    pub delay_ms: Option<u64>,
    /// Time since the attempt (or probe) started, in milliseconds.
    pub elapsed_ms: Option<u64>,
    /// Client name, hostname, `host:port` or URL.
    pub target: Option<Arc<str>>,
    /// HTTP status of the diagnostic request.
    pub status: Option<u16>,
    /// Human-readable reason (errors, addresses, outcome labels).
    pub reason: Option<Arc<str>>,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            attempt: None,
            timeout_ms: None,
            delay_ms: None,
            elapsed_ms: None,
            target: None,
            status: None,
            reason: None,
        }
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches the ready deadline.
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Attaches a backoff delay.
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis(d));
        self
    }

    /// Attaches an elapsed duration.
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(millis(d));
        self
    }

    /// Attaches a target (client, host, endpoint or URL).
    #[inline]
    pub fn with_target(mut self, target: impl Into<Arc<str>>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attaches an HTTP status code.
    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Delay as a [`Duration`], if set.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }

    /// Ready deadline as a [`Duration`], if set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
