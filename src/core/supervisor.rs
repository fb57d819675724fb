//! # Supervisor: keeps one gateway client connected.
//!
//! The [`Supervisor`] owns the event bus, the subscribers, the optional network
//! probe, the resolver strategy and the shutdown token. [`Supervisor::run`]
//! drives the wrapped client through attempts until it is ready, then stays
//! with it until it exits.
//!
//! ## High-level flow
//! ```text
//! run(client, credential)
//!   ├─ listener:  Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   ├─ signals:   SIGINT/SIGTERM/SIGQUIT ─► shutdown.cancel()    (if cfg.handle_signals)
//!   └─ loop:
//!        AttemptStarting
//!        diagnostics (probe ─► DnsResolved/TcpProbe*/HttpProbe* events)
//!        run_attempt():
//!          Ready    ─► follow_ready(): ClientStopped → Ok | ClientCrashed → Err
//!          Shutdown ─► Ok
//!          Failed:
//!            fatal (credential/permission)       ─► Err
//!            retry limit reached                 ─► RetriesExhausted ─► Err
//!            otherwise                           ─► BackoffScheduled, sleep, loop
//!   SupervisorStopped (always last) ─► listener drains subscribers ─► return
//! ```
//!
//! ## Rules
//! - Retryable failures never leave the loop while the retry limit allows another attempt.
//! - No sleep follows the last allowed attempt.
//! - The k-th sleep is `min(base × 2^(k-1), ceiling)` (before jitter).
//! - Shutdown interrupts diagnostics, the readiness race, the post-ready wait and
//!   backoff sleeps, and makes `run` return `Ok(())`.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    client::{ClientRef, Credential},
    config::Config,
    core::{
        attempt::{AttemptContext, AttemptOutcome, AttemptState, follow_ready, run_attempt},
        builder::SupervisorBuilder,
        shutdown,
    },
    diagnostics::{ProbeRef, ResolverRef},
    error::{SupervisorError, secs},
    events::{Bus, Event, EventKind},
    subscribers::{Subscribe, SubscriberSet, panic_message},
};

/// Supervises one long-lived gateway connection.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use gatevisor::{Config, Credential, GatewayClient, Supervisor};
/// # use async_trait::async_trait;
/// # use gatevisor::ClientError;
/// # struct MyClient;
/// # #[async_trait]
/// # impl GatewayClient for MyClient {
/// #     async fn start(&self, _: Credential) -> Result<(), ClientError> { Ok(()) }
/// #     async fn wait_until_ready(&self) {}
/// #     async fn close(&self) -> Result<(), ClientError> { Ok(()) }
/// # }
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cfg = Config::from_env()?;
///     let sup = Supervisor::builder(cfg).build();
///     let token = Credential::new(std::env::var("DISCORD_TOKEN")?);
///
///     sup.run(Arc::new(MyClient), token).await?;
///     Ok(())
/// }
/// ```
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    probe: Option<ProbeRef>,
    resolver: ResolverRef,
    shutdown: CancellationToken,
}

impl Supervisor {
    /// Starts a builder with the given configuration.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    /// Supervisor with default subscribers, probe and resolver.
    pub fn new(cfg: Config) -> Self {
        Self::builder(cfg).build()
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subscribers: Vec<Arc<dyn Subscribe>>,
        probe: Option<ProbeRef>,
        resolver: ResolverRef,
    ) -> Self {
        Self {
            cfg,
            bus,
            subscribers,
            probe,
            resolver,
            shutdown: CancellationToken::new(),
        }
    }

    /// Raw receiver of every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Token that stops the supervisor when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Resolver selected by the configuration.
    ///
    /// Hand this to the client so it connects to the addresses the probes checked.
    pub fn resolver(&self) -> ResolverRef {
        Arc::clone(&self.resolver)
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs `client` until it exits, a fatal failure occurs, retries run out, or
    /// shutdown is requested.
    ///
    /// Returns `Ok(())` on a clean client exit or on shutdown.
    pub async fn run(
        mut self,
        client: ClientRef,
        credential: Credential,
    ) -> Result<(), SupervisorError> {
        let subs = SubscriberSet::new(std::mem::take(&mut self.subscribers));
        let listener = self.subscriber_listener(subs);
        let signals = self
            .cfg
            .handle_signals
            .then(|| shutdown::spawn_signal_watcher(self.shutdown.clone()));

        let res = self.drive(&client, &credential).await;

        if let Some(h) = signals {
            h.abort();
        }
        let outcome = match &res {
            Ok(()) => "ok".to_string(),
            Err(e) => e.as_message(),
        };
        self.bus
            .publish(Event::new(EventKind::SupervisorStopped).with_reason(outcome));
        let _ = listener.await;
        res
    }

    async fn drive(
        &self,
        client: &ClientRef,
        credential: &Credential,
    ) -> Result<(), SupervisorError> {
        let ctx = AttemptContext {
            client,
            credential,
            bus: &self.bus,
            shutdown: &self.shutdown,
            deadline: self.cfg.ready_timeout,
            grace: self.cfg.grace,
        };
        let mut state = AttemptState::new(self.cfg.ready_timeout, &self.cfg.backoff);

        loop {
            let attempt = state.begin();
            self.bus.publish(
                Event::new(EventKind::AttemptStarting)
                    .with_attempt(attempt)
                    .with_timeout(state.deadline())
                    .with_target(client.name()),
            );

            if !self.diagnose(attempt).await {
                self.publish_shutdown(attempt);
                return Ok(());
            }

            let failure = match run_attempt(&ctx, attempt).await {
                AttemptOutcome::Ready(ready) => return follow_ready(&ctx, ready).await,
                AttemptOutcome::Shutdown => return Ok(()),
                AttemptOutcome::Failed(failure) => failure,
            };

            let last = failure.to_string();
            if let Some(fatal) = failure.into_fatal() {
                return Err(fatal);
            }
            if !self.cfg.retry.allows_another(attempt) {
                self.bus.publish(
                    Event::new(EventKind::RetriesExhausted)
                        .with_attempt(attempt)
                        .with_reason(last.as_str()),
                );
                return Err(SupervisorError::RetriesExhausted {
                    attempts: attempt,
                    last,
                });
            }

            let delay = state.fail(&self.cfg.backoff);
            self.bus.publish(
                Event::new(EventKind::BackoffScheduled)
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_reason(last),
            );
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    self.publish_shutdown(attempt);
                    return Ok(());
                }
                _ = time::sleep(delay) => {}
            }
        }
    }

    /// Runs the probe (if any) and publishes one event per result.
    ///
    /// The round is bounded by [`ProbeTargets::budget`](crate::ProbeTargets::budget);
    /// a probe that overruns it is abandoned and the attempt goes ahead.
    /// Returns `false` if shutdown was requested meanwhile.
    async fn diagnose(&self, attempt: u32) -> bool {
        let Some(probe) = &self.probe else {
            return true;
        };
        let budget = self.cfg.probe.budget();
        let run = time::timeout(budget, AssertUnwindSafe(probe.probe()).catch_unwind());
        let report = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return false,
            report = run => report,
        };
        match report {
            Ok(Ok(report)) => {
                for ev in report.events() {
                    self.bus.publish(ev.with_attempt(attempt));
                }
            }
            Ok(Err(panic)) => {
                let info = panic_message(panic.as_ref());
                warn!(target: "gatevisor", attempt, %info, "network probe panicked");
            }
            Err(_) => {
                let budget = secs(budget);
                warn!(target: "gatevisor", attempt, %budget, "network probe overran its budget");
            }
        }
        true
    }

    fn publish_shutdown(&self, attempt: u32) {
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_attempt(attempt));
    }

    /// Forwards bus events to subscribers until `SupervisorStopped`, then drains them.
    fn subscriber_listener(&self, subs: SubscriberSet) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let last = ev.kind == EventKind::SupervisorStopped;
                        subs.emit(&ev);
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "gatevisor", skipped, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            subs.shutdown().await;
        })
    }
}
