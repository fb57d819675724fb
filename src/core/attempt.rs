//! # One connection attempt.
//!
//! [`run_attempt`] spawns two tasks sharing the client and races them against
//! the readiness deadline:
//!
//! ```text
//! run_attempt()
//!   ├─ spawn client task:  client.start(credential)
//!   ├─ spawn watchdog:     client.wait_until_ready()
//!   └─ select (biased):
//!        shutdown token    → ShutdownRequested, cleanup         → Shutdown
//!        first_of(client, watchdog, deadline):
//!          Ready           → ClientReady, drop watchdog         → Ready(ReadyClient)
//!          Client Ok       → ClientStoppedEarly, cleanup        → Failed(StoppedEarly)
//!          Client Err      → classified event, cleanup          → Failed(Client(e))
//!          Client panicked → ClientFailed, cleanup              → Failed(Panicked)
//!          Elapsed         → ReadyTimeout, cleanup              → Failed(Timeout)
//! ```
//!
//! ## Rules
//! - Exactly one first completion is acted on; the other task is inspected
//!   only through cleanup.
//! - Cleanup always closes the client (bounded by the grace period), aborts and
//!   awaits the client task, then aborts and awaits the watchdog.
//! - After readiness the attempt hands the still-running client task to
//!   [`follow_ready`], which waits for it or for shutdown.

use std::{fmt, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use tokio::{
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::{
    client::{ClientRef, Credential},
    core::race::{First, first_of},
    error::{ClientError, FailureClass, SupervisorError, secs},
    events::{Bus, Event, EventKind},
    policies::BackoffPolicy,
    subscribers::panic_message,
};

/// Per-run attempt bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct AttemptState {
    attempt: u32,
    failures: u32,
    backoff: Duration,
    deadline: Duration,
}

impl AttemptState {
    pub(crate) fn new(deadline: Duration, policy: &BackoffPolicy) -> Self {
        Self {
            attempt: 0,
            failures: 0,
            backoff: policy.delay_for(0),
            deadline,
        }
    }

    /// Starts the next attempt and returns its 1-based number.
    pub(crate) fn begin(&mut self) -> u32 {
        self.attempt = self.attempt.saturating_add(1);
        self.attempt
    }

    /// Records a retryable failure; returns the sleep before the next attempt.
    pub(crate) fn fail(&mut self, policy: &BackoffPolicy) -> Duration {
        let delay = self.backoff;
        self.failures = self.failures.saturating_add(1);
        self.backoff = policy.delay_for(self.failures);
        delay
    }

    pub(crate) fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Borrowed collaborators of one run.
pub(crate) struct AttemptContext<'a> {
    pub(crate) client: &'a ClientRef,
    pub(crate) credential: &'a Credential,
    pub(crate) bus: &'a Bus,
    pub(crate) shutdown: &'a CancellationToken,
    pub(crate) deadline: Duration,
    pub(crate) grace: Duration,
}

/// A client that reported READY and is still running.
pub(crate) struct ReadyClient {
    pub(crate) attempt: u32,
    pub(crate) task: JoinHandle<Result<(), ClientError>>,
    pub(crate) started: Instant,
}

pub(crate) enum AttemptOutcome {
    Ready(ReadyClient),
    Failed(AttemptFailure),
    Shutdown,
}

/// Why an attempt did not reach readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptFailure {
    Timeout { deadline: Duration },
    StoppedEarly,
    Client(ClientError),
    Panicked(String),
    Watchdog(String),
}

impl AttemptFailure {
    /// The terminal error for fatal failures; `None` means retryable.
    pub(crate) fn into_fatal(self) -> Option<SupervisorError> {
        match self {
            AttemptFailure::Client(e) if e.class() == FailureClass::Fatal => Some(e.into()),
            _ => None,
        }
    }

    fn to_event(&self, attempt: u32, elapsed: Duration) -> Event {
        let ev = match self {
            AttemptFailure::Timeout { deadline } => {
                Event::new(EventKind::ReadyTimeout).with_timeout(*deadline)
            }
            AttemptFailure::StoppedEarly => Event::new(EventKind::ClientStoppedEarly),
            AttemptFailure::Client(e) => Event::new(client_error_kind(e, EventKind::ClientFailed)),
            AttemptFailure::Panicked(_) | AttemptFailure::Watchdog(_) => {
                Event::new(EventKind::ClientFailed)
            }
        };
        ev.with_attempt(attempt)
            .with_elapsed(elapsed)
            .with_reason(self.to_string())
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Timeout { deadline } => {
                write!(f, "not ready within {}", secs(*deadline))
            }
            AttemptFailure::StoppedEarly => f.write_str("client stopped before ready"),
            AttemptFailure::Client(e) => write!(f, "{e}"),
            AttemptFailure::Panicked(r) => write!(f, "client task panicked: {r}"),
            AttemptFailure::Watchdog(r) => write!(f, "readiness watchdog failed: {r}"),
        }
    }
}

/// Fatal client errors get their own event kind; everything else uses `other`.
fn client_error_kind(e: &ClientError, other: EventKind) -> EventKind {
    match e {
        ClientError::AuthenticationRejected { .. } => EventKind::CredentialRejected,
        ClientError::PermissionRequired { .. } => EventKind::PermissionMissing,
        _ => other,
    }
}

/// Runs one attempt up to readiness, failure or shutdown.
pub(crate) async fn run_attempt(ctx: &AttemptContext<'_>, attempt: u32) -> AttemptOutcome {
    let started = Instant::now();

    let mut client_task = {
        let client = Arc::clone(ctx.client);
        let credential = ctx.credential.clone();
        tokio::spawn(async move { client.start(credential).await })
    };
    let mut watchdog = {
        let client = Arc::clone(ctx.client);
        tokio::spawn(async move { client.wait_until_ready().await })
    };

    let first = tokio::select! {
        biased;
        _ = ctx.shutdown.cancelled() => None,
        first = first_of(&mut client_task, &mut watchdog, ctx.deadline) => Some(first),
    };

    let failure = match first {
        None => {
            ctx.bus
                .publish(Event::new(EventKind::ShutdownRequested).with_attempt(attempt));
            cleanup(ctx, attempt, client_task, watchdog).await;
            return AttemptOutcome::Shutdown;
        }
        Some(First::Ready(Ok(()))) => {
            finish(watchdog).await;
            ctx.bus.publish(
                Event::new(EventKind::ClientReady)
                    .with_attempt(attempt)
                    .with_elapsed(started.elapsed())
                    .with_target(ctx.client.name()),
            );
            return AttemptOutcome::Ready(ReadyClient {
                attempt,
                task: client_task,
                started,
            });
        }
        Some(First::Ready(Err(join))) => AttemptFailure::Watchdog(join.to_string()),
        Some(First::Client(Ok(Ok(())))) => AttemptFailure::StoppedEarly,
        Some(First::Client(Ok(Err(e)))) => AttemptFailure::Client(e),
        Some(First::Client(Err(join))) => AttemptFailure::Panicked(join.to_string()),
        Some(First::Elapsed) => AttemptFailure::Timeout {
            deadline: ctx.deadline,
        },
    };

    ctx.bus.publish(failure.to_event(attempt, started.elapsed()));
    cleanup(ctx, attempt, client_task, watchdog).await;
    AttemptOutcome::Failed(failure)
}

/// Waits for a ready client to end, or closes it on shutdown.
///
/// A clean exit is `Ok(())`; an error or panic after readiness is terminal.
pub(crate) async fn follow_ready(
    ctx: &AttemptContext<'_>,
    ready: ReadyClient,
) -> Result<(), SupervisorError> {
    let ReadyClient {
        attempt,
        mut task,
        started,
    } = ready;

    let joined = tokio::select! {
        biased;
        _ = ctx.shutdown.cancelled() => None,
        res = &mut task => Some(res),
    };
    let Some(joined) = joined else {
        ctx.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_attempt(attempt));
        close_client(ctx, attempt).await;
        finish(task).await;
        return Ok(());
    };

    let elapsed = started.elapsed();
    match joined {
        Ok(Ok(())) => {
            ctx.bus.publish(
                Event::new(EventKind::ClientStopped)
                    .with_attempt(attempt)
                    .with_elapsed(elapsed),
            );
            Ok(())
        }
        Ok(Err(err)) => {
            ctx.bus.publish(
                Event::new(client_error_kind(&err, EventKind::ClientCrashed))
                    .with_attempt(attempt)
                    .with_elapsed(elapsed)
                    .with_reason(err.to_string()),
            );
            Err(err.into())
        }
        Err(join) => {
            let reason = join.to_string();
            ctx.bus.publish(
                Event::new(EventKind::ClientCrashed)
                    .with_attempt(attempt)
                    .with_elapsed(elapsed)
                    .with_reason(reason.as_str()),
            );
            Err(SupervisorError::ClientPanicked { reason })
        }
    }
}

async fn cleanup(
    ctx: &AttemptContext<'_>,
    attempt: u32,
    client_task: JoinHandle<Result<(), ClientError>>,
    watchdog: JoinHandle<()>,
) {
    close_client(ctx, attempt).await;
    finish(client_task).await;
    finish(watchdog).await;
}

/// Calls `close()` within the grace period; failures become `CloseFailed`.
async fn close_client(ctx: &AttemptContext<'_>, attempt: u32) {
    let closing = AssertUnwindSafe(ctx.client.close()).catch_unwind();
    let reason = match time::timeout(ctx.grace, closing).await {
        Ok(Ok(Ok(()))) => return,
        Ok(Ok(Err(e))) => e.to_string(),
        Ok(Err(panic)) => format!("close panicked: {}", panic_message(panic.as_ref())),
        Err(_) => format!("close did not finish within {}", secs(ctx.grace)),
    };
    ctx.bus.publish(
        Event::new(EventKind::CloseFailed)
            .with_attempt(attempt)
            .with_target(ctx.client.name())
            .with_reason(reason),
    );
}

/// Aborts a task and waits until it is gone.
async fn finish<T>(handle: JoinHandle<T>) {
    handle.abort();
    let _ = handle.await;
}
