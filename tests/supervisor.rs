use std::{
    collections::VecDeque,
    io,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use gatevisor::{
    BackoffPolicy, ClientError, Config, Credential, Event, EventKind, GatewayClient, Probe,
    ProbeReport, ProbeResult, ProbeTargets, Resolve, RetryPolicy, Subscribe, Supervisor,
    SupervisorError,
};
use tokio::{
    sync::{broadcast, watch},
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

/// What the stub does on one `start` call.
enum Script {
    /// Becomes ready after 10ms, then runs for `run_for` and exits cleanly.
    Ready { run_for: Duration },
    /// Becomes ready, then fails 10ms later.
    ReadyThenFail(ClientError),
    /// Fails after 10ms without becoming ready.
    Fail(ClientError),
    /// Returns `Ok` after 10ms without becoming ready.
    StopEarly,
    /// Never returns, never becomes ready.
    Hang,
}

struct StubClient {
    script: Mutex<VecDeque<Script>>,
    ready: watch::Sender<bool>,
    starts: AtomicU32,
    closes: AtomicU32,
    watchdogs_dropped: Arc<AtomicU32>,
    cancel_after: Option<(u32, CancellationToken)>,
}

impl StubClient {
    fn new(script: impl IntoIterator<Item = Script>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ready: watch::Sender::new(false),
            starts: AtomicU32::new(0),
            closes: AtomicU32::new(0),
            watchdogs_dropped: Arc::new(AtomicU32::new(0)),
            cancel_after: None,
        }
    }

    /// Cancels `token` when the `n`-th start begins.
    fn cancel_after(mut self, n: u32, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    fn watchdogs_dropped(&self) -> u32 {
        self.watchdogs_dropped.load(Ordering::SeqCst)
    }
}

struct DropCounter(Arc<AtomicU32>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GatewayClient for StubClient {
    fn name(&self) -> &str {
        "stub"
    }

    async fn start(&self, credential: Credential) -> Result<(), ClientError> {
        assert_eq!(credential.expose(), "token");
        let n = self.starts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, token)) = &self.cancel_after {
            if n >= *limit {
                token.cancel();
            }
        }

        let step = self.script.lock().unwrap().pop_front().unwrap_or(Script::Hang);
        match step {
            Script::Ready { run_for } => {
                time::sleep(Duration::from_millis(10)).await;
                self.ready.send_replace(true);
                time::sleep(run_for).await;
                Ok(())
            }
            Script::ReadyThenFail(err) => {
                time::sleep(Duration::from_millis(10)).await;
                self.ready.send_replace(true);
                time::sleep(Duration::from_millis(10)).await;
                Err(err)
            }
            Script::Fail(err) => {
                time::sleep(Duration::from_millis(10)).await;
                Err(err)
            }
            Script::StopEarly => {
                time::sleep(Duration::from_millis(10)).await;
                Ok(())
            }
            Script::Hang => std::future::pending().await,
        }
    }

    async fn wait_until_ready(&self) {
        let _guard = DropCounter(Arc::clone(&self.watchdogs_dropped));
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.ready.send_replace(false);
        Ok(())
    }
}

fn offline(cfg: Config) -> Config {
    Config {
        diagnostics: false,
        handle_signals: false,
        ..cfg
    }
}

fn supervisor(cfg: Config) -> Supervisor {
    Supervisor::builder(offline(cfg))
        .with_subscribers(Vec::new())
        .build()
}

fn token() -> Credential {
    Credential::new("token")
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

fn delays(events: &[Event]) -> Vec<u64> {
    events
        .iter()
        .filter(|e| e.kind == EventKind::BackoffScheduled)
        .filter_map(|e| e.delay())
        .map(|d| d.as_secs())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn ready_client_is_followed_until_it_exits() {
    let stub = Arc::new(StubClient::new([Script::Ready {
        run_for: Duration::from_secs(30),
    }]));
    let sup = supervisor(Config::default());
    let mut rx = sup.subscribe();

    let started = Instant::now();
    sup.run(stub.clone(), token()).await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(30));
    assert_eq!(stub.starts(), 1);
    assert_eq!(stub.watchdogs_dropped(), 1);
    assert_eq!(
        kinds(&drain(&mut rx)),
        vec![
            EventKind::AttemptStarting,
            EventKind::ClientReady,
            EventKind::ClientStopped,
            EventKind::SupervisorStopped,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn rejected_credential_is_fatal_on_first_attempt() {
    let stub = Arc::new(StubClient::new([Script::Fail(
        ClientError::AuthenticationRejected {
            reason: "4004 authentication failed".into(),
        },
    )]));
    let sup = supervisor(Config::default());
    let mut rx = sup.subscribe();

    let err = sup.run(stub.clone(), token()).await.unwrap_err();

    assert!(matches!(err, SupervisorError::AuthenticationRejected { .. }));
    assert!(err.is_operator_actionable());
    assert_eq!(stub.starts(), 1);
    assert_eq!(stub.closes(), 1);

    let events = drain(&mut rx);
    assert!(delays(&events).is_empty());
    assert_eq!(
        kinds(&events),
        vec![
            EventKind::AttemptStarting,
            EventKind::CredentialRejected,
            EventKind::SupervisorStopped,
        ]
    );
    assert_eq!(
        events.last().and_then(|e| e.reason.as_deref()),
        Some("supervisor_auth_rejected")
    );
}

#[tokio::test(start_paused = true)]
async fn missing_permission_is_fatal() {
    let stub = Arc::new(StubClient::new([Script::Fail(
        ClientError::PermissionRequired {
            reason: "message content intent".into(),
        },
    )]));
    let sup = supervisor(Config::default());
    let mut rx = sup.subscribe();

    let err = sup.run(stub.clone(), token()).await.unwrap_err();

    assert!(matches!(err, SupervisorError::PermissionRequired { .. }));
    assert_eq!(stub.starts(), 1);
    assert!(kinds(&drain(&mut rx)).contains(&EventKind::PermissionMissing));
}

#[tokio::test(start_paused = true)]
async fn ready_timeout_starts_a_new_attempt() {
    let stub = Arc::new(StubClient::new([
        Script::Hang,
        Script::Ready {
            run_for: Duration::from_secs(1),
        },
    ]));
    let cfg = Config {
        ready_timeout: Duration::from_secs(1),
        ..Config::default()
    };
    let sup = supervisor(cfg);
    let mut rx = sup.subscribe();

    sup.run(stub.clone(), token()).await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(stub.starts(), 2);
    assert_eq!(stub.closes(), 1);
    assert_eq!(stub.watchdogs_dropped(), 2);
    assert_eq!(
        kinds(&events),
        vec![
            EventKind::AttemptStarting,
            EventKind::ReadyTimeout,
            EventKind::BackoffScheduled,
            EventKind::AttemptStarting,
            EventKind::ClientReady,
            EventKind::ClientStopped,
            EventKind::SupervisorStopped,
        ]
    );
    assert_eq!(events[1].timeout(), Some(Duration::from_secs(1)));
    assert_eq!(events[3].attempt, Some(2));
    assert_eq!(delays(&events), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn backoff_grows_to_the_ceiling_and_retries_run_out() {
    let stub = Arc::new(StubClient::new(
        (0..7).map(|_| Script::Fail(ClientError::fail("connection reset"))),
    ));
    let cfg = Config {
        retry: RetryPolicy::limited(7),
        backoff: BackoffPolicy::default().with_ceiling(Duration::from_secs(20)),
        ..Config::default()
    };
    let sup = supervisor(cfg);
    let mut rx = sup.subscribe();

    let err = sup.run(stub.clone(), token()).await.unwrap_err();
    let message = err.as_message();
    assert!(message.starts_with("retries exhausted after 7 attempt(s)"));

    match err {
        SupervisorError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 7);
            assert!(last.contains("connection reset"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stub.starts(), 7);

    let events = drain(&mut rx);
    assert_eq!(delays(&events), vec![2, 4, 8, 16, 20, 20]);
    assert_eq!(
        events.last().and_then(|e| e.reason.as_deref()),
        Some(message.as_str())
    );
    let tail: Vec<EventKind> = kinds(&events).into_iter().rev().take(3).collect();
    assert_eq!(
        tail,
        vec![
            EventKind::SupervisorStopped,
            EventKind::RetriesExhausted,
            EventKind::ClientFailed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn unbounded_retries_keep_going_until_shutdown() {
    let sup = supervisor(Config::default());
    let stub = Arc::new(
        StubClient::new((0..30).map(|_| Script::Fail(ClientError::fail("gateway unavailable"))))
            .cancel_after(16, sup.shutdown_token()),
    );
    let mut rx = sup.subscribe();

    sup.run(stub.clone(), token()).await.unwrap();

    assert_eq!(stub.starts(), 16);
    let events = drain(&mut rx);
    let ks = kinds(&events);
    assert!(!ks.contains(&EventKind::RetriesExhausted));
    assert_eq!(
        &ks[ks.len() - 2..],
        &[EventKind::ShutdownRequested, EventKind::SupervisorStopped]
    );
    assert!(delays(&events).iter().all(|d| *d <= 60));
}

#[tokio::test(start_paused = true)]
async fn early_clean_stop_is_retried() {
    let stub = Arc::new(StubClient::new([
        Script::StopEarly,
        Script::Ready {
            run_for: Duration::from_secs(1),
        },
    ]));
    let sup = supervisor(Config::default());
    let mut rx = sup.subscribe();

    sup.run(stub.clone(), token()).await.unwrap();

    assert_eq!(stub.starts(), 2);
    let ks = kinds(&drain(&mut rx));
    assert!(ks.contains(&EventKind::ClientStoppedEarly));
    assert!(ks.contains(&EventKind::ClientReady));
}

#[tokio::test(start_paused = true)]
async fn error_after_ready_ends_the_run() {
    let stub = Arc::new(StubClient::new([
        Script::ReadyThenFail(ClientError::fail("socket closed")),
        Script::Ready {
            run_for: Duration::from_secs(1),
        },
    ]));
    let sup = supervisor(Config::default());
    let mut rx = sup.subscribe();

    let err = sup.run(stub.clone(), token()).await.unwrap_err();

    assert!(matches!(err, SupervisorError::ClientExited { .. }));
    assert_eq!(stub.starts(), 1);
    assert!(kinds(&drain(&mut rx)).contains(&EventKind::ClientCrashed));
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_backoff_returns_ok() {
    let stub = Arc::new(StubClient::new([Script::Fail(ClientError::fail("refused"))]));
    let cfg = Config {
        backoff: BackoffPolicy::default().with_base(Duration::from_secs(30)),
        ..Config::default()
    };
    let sup = supervisor(cfg);
    let mut rx = sup.subscribe();
    let stop = sup.shutdown_token();
    tokio::spawn(async move {
        time::sleep(Duration::from_secs(5)).await;
        stop.cancel();
    });

    let started = Instant::now();
    sup.run(stub.clone(), token()).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(stub.starts(), 1);
    let ks = kinds(&drain(&mut rx));
    assert_eq!(
        &ks[ks.len() - 3..],
        &[
            EventKind::BackoffScheduled,
            EventKind::ShutdownRequested,
            EventKind::SupervisorStopped,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_after_ready_closes_the_client() {
    let stub = Arc::new(StubClient::new([Script::Ready {
        run_for: Duration::from_secs(3600),
    }]));
    let sup = supervisor(Config::default());
    let stop = sup.shutdown_token();
    tokio::spawn(async move {
        time::sleep(Duration::from_secs(10)).await;
        stop.cancel();
    });

    sup.run(stub.clone(), token()).await.unwrap();

    assert_eq!(stub.closes(), 1);
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.seen.lock().unwrap().push(ev.kind);
    }
}

#[tokio::test(start_paused = true)]
async fn subscribers_are_drained_before_run_returns() {
    let recorder = Arc::new(Recorder::default());
    let stub = Arc::new(StubClient::new([Script::Ready {
        run_for: Duration::from_secs(1),
    }]));
    let sup = Supervisor::builder(offline(Config::default()))
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .build();

    sup.run(stub, token()).await.unwrap();

    let seen = recorder.seen.lock().unwrap().clone();
    assert_eq!(seen.first(), Some(&EventKind::AttemptStarting));
    assert_eq!(seen.last(), Some(&EventKind::SupervisorStopped));
}

struct CannedProbe;

#[async_trait]
impl Probe for CannedProbe {
    async fn probe(&self) -> ProbeReport {
        ProbeReport {
            results: vec![ProbeResult::Http {
                url: "https://gateway.test/api".into(),
                outcome: Ok(503),
            }],
        }
    }
}

#[tokio::test(start_paused = true)]
async fn probe_results_are_published_per_attempt() {
    let stub = Arc::new(StubClient::new([
        Script::StopEarly,
        Script::Ready {
            run_for: Duration::from_secs(1),
        },
    ]));
    let cfg = Config {
        diagnostics: true,
        handle_signals: false,
        ..Config::default()
    };
    let sup = Supervisor::builder(cfg)
        .with_subscribers(Vec::new())
        .with_probe(Arc::new(CannedProbe))
        .build();
    let mut rx = sup.subscribe();

    sup.run(stub, token()).await.unwrap();

    let http: Vec<Event> = drain(&mut rx)
        .into_iter()
        .filter(|e| e.kind == EventKind::HttpProbeCompleted)
        .collect();
    assert_eq!(http.len(), 2);
    assert_eq!(http[0].attempt, Some(1));
    assert_eq!(http[1].attempt, Some(2));
    assert_eq!(http[1].status, Some(503));
}

struct StalledProbe;

#[async_trait]
impl Probe for StalledProbe {
    async fn probe(&self) -> ProbeReport {
        std::future::pending().await
    }
}

struct ExplodingProbe;

#[async_trait]
impl Probe for ExplodingProbe {
    async fn probe(&self) -> ProbeReport {
        panic!("probe exploded");
    }
}

fn with_probe(probe: Arc<dyn Probe>) -> Supervisor {
    let cfg = Config {
        diagnostics: true,
        handle_signals: false,
        ..Config::default()
    };
    Supervisor::builder(cfg)
        .with_subscribers(Vec::new())
        .with_probe(probe)
        .build()
}

#[tokio::test(start_paused = true)]
async fn stalled_diagnostics_are_abandoned_after_their_budget() {
    let stub = Arc::new(StubClient::new([Script::Ready {
        run_for: Duration::from_secs(1),
    }]));
    let sup = with_probe(Arc::new(StalledProbe));
    let mut rx = sup.subscribe();

    let started = Instant::now();
    sup.run(stub.clone(), token()).await.unwrap();

    assert!(started.elapsed() >= ProbeTargets::default().budget());
    assert_eq!(stub.starts(), 1);
    assert_eq!(
        kinds(&drain(&mut rx)),
        vec![
            EventKind::AttemptStarting,
            EventKind::ClientReady,
            EventKind::ClientStopped,
            EventKind::SupervisorStopped,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn panicking_diagnostics_do_not_block_the_attempt() {
    let stub = Arc::new(StubClient::new([Script::Ready {
        run_for: Duration::from_secs(1),
    }]));
    let sup = with_probe(Arc::new(ExplodingProbe));

    sup.run(stub.clone(), token()).await.unwrap();

    assert_eq!(stub.starts(), 1);
}

struct NoDns;

#[async_trait]
impl Resolve for NoDns {
    async fn resolve(&self, host: &str, _port: u16) -> io::Result<Vec<SocketAddr>> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{host}: name does not resolve"),
        ))
    }
}

#[tokio::test]
async fn failing_diagnostics_do_not_change_the_outcome() {
    let stub = Arc::new(StubClient::new([Script::Ready {
        run_for: Duration::from_millis(50),
    }]));
    let cfg = Config {
        ready_timeout: Duration::from_secs(5),
        diagnostics: true,
        handle_signals: false,
        probe: ProbeTargets {
            dns_hosts: vec!["gateway.invalid".into()],
            tcp_host: "gateway.invalid".into(),
            tcp_port: 443,
            http_url: "http://127.0.0.1:1/".into(),
            dns_timeout: Duration::from_secs(2),
            tcp_timeout: Duration::from_secs(2),
            http_timeout: Duration::from_secs(2),
        },
        ..Config::default()
    };
    let sup = Supervisor::builder(cfg)
        .with_subscribers(Vec::new())
        .with_resolver(Arc::new(NoDns))
        .build();
    let mut rx = sup.subscribe();

    sup.run(stub.clone(), token()).await.unwrap();

    assert_eq!(stub.starts(), 1);
    assert_eq!(
        kinds(&drain(&mut rx)),
        vec![
            EventKind::AttemptStarting,
            EventKind::DnsFailed,
            EventKind::TcpProbeFailed,
            EventKind::HttpProbeFailed,
            EventKind::ClientReady,
            EventKind::ClientStopped,
            EventKind::SupervisorStopped,
        ]
    );
}
