//! # Demo: flaky_gateway
//!
//! Supervises a simulated gateway client that hangs on its first attempt, drops
//! its connection before READY on the second, and becomes ready on the third.
//!
//! ## Flow
//! ```text
//! attempt 1: start() hangs            → ReadyTimeout (2s)  → BackoffScheduled(500ms)
//! attempt 2: start() returns Err      → ClientFailed       → BackoffScheduled(1s)
//! attempt 3: ready after 200ms        → ClientReady
//!            session runs 2s, exits   → ClientStopped      → Ok(())
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=gatevisor=debug cargo run --example flaky_gateway
//! ```

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use gatevisor::{
    BackoffPolicy, ClientError, Config, Credential, GatewayClient, JitterPolicy, RetryPolicy,
    Supervisor,
};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

struct FlakyGateway {
    attempts: AtomicU32,
    ready: watch::Sender<bool>,
}

impl FlakyGateway {
    fn new() -> Self {
        Self {
            attempts: AtomicU32::new(0),
            ready: watch::Sender::new(false),
        }
    }
}

#[async_trait]
impl GatewayClient for FlakyGateway {
    fn name(&self) -> &str {
        "flaky-gateway"
    }

    async fn start(&self, _credential: Credential) -> Result<(), ClientError> {
        match self.attempts.fetch_add(1, Ordering::SeqCst) + 1 {
            1 => std::future::pending().await,
            2 => {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Err(ClientError::fail("websocket closed with 1006 before HELLO"))
            }
            _ => {
                tokio::time::sleep(Duration::from_millis(200)).await;
                self.ready.send_replace(true);
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(())
            }
        }
    }

    async fn wait_until_ready(&self) {
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.ready.send_replace(false);
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gatevisor=info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut cfg = Config::from_env()?;
    cfg.ready_timeout = Duration::from_secs(2);
    cfg.retry = RetryPolicy::limited(5);
    cfg.backoff = BackoffPolicy::default()
        .with_base(Duration::from_millis(500))
        .with_ceiling(Duration::from_secs(5))
        .with_jitter(JitterPolicy::None);
    cfg.diagnostics = false;

    let sup = Supervisor::new(cfg);
    sup.run(Arc::new(FlakyGateway::new()), Credential::new("demo-token"))
        .await?;

    println!("[main] client session finished");
    Ok(())
}
