//! # Network probe.
//!
//! [`NetworkProbe`] runs three checks in order, each bounded and isolated:
//!
//! ```text
//! probe()
//!   ├─ DNS   resolve every dns_hosts entry          → ProbeResult::Dns  (≤ dns_timeout each)
//!   ├─ TCP   resolve + connect tcp_host:tcp_port    → ProbeResult::Tcp  (≤ tcp_timeout)
//!   └─ HTTP  GET http_url, any status is success    → ProbeResult::Http (≤ http_timeout)
//! ```
//!
//! All three use the injected [`Resolve`](super::Resolve) strategy, so a forced
//! IPv4 run probes the same addresses the client will dial. Failures are
//! recorded in the report and never returned as errors.

use std::{collections::BTreeSet, io, net::IpAddr, sync::Arc, time::Instant};

use async_trait::async_trait;
use tokio::{net::TcpStream, time};

use crate::error::secs;

use super::{ProbeReport, ProbeResult, ProbeTargets, ResolverRef, resolver::HttpResolver};

/// Runs one round of connectivity checks.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// Performs every check and reports per-check outcomes.
    async fn probe(&self) -> ProbeReport;
}

/// Shared handle to a probe.
pub type ProbeRef = Arc<dyn Probe>;

/// DNS, TCP and HTTP checks against fixed targets.
pub struct NetworkProbe {
    targets: ProbeTargets,
    resolver: ResolverRef,
    http: Result<reqwest::Client, String>,
}

impl NetworkProbe {
    /// Creates a probe for `targets`, resolving through `resolver`.
    pub fn new(targets: ProbeTargets, resolver: ResolverRef) -> Self {
        let http = reqwest::Client::builder()
            .timeout(targets.http_timeout)
            .no_proxy()
            .dns_resolver(Arc::new(HttpResolver(Arc::clone(&resolver))))
            .build()
            .map_err(|e| error_chain(&e));
        Self {
            targets,
            resolver,
            http,
        }
    }

    /// Targets this probe checks.
    pub fn targets(&self) -> &ProbeTargets {
        &self.targets
    }

    async fn resolve_host(&self, host: &str) -> ProbeResult {
        let lookup = self.resolver.resolve(host, 0);
        let outcome = match time::timeout(self.targets.dns_timeout, lookup).await {
            Ok(Ok(addrs)) => {
                let unique: BTreeSet<IpAddr> = addrs.iter().map(|a| a.ip()).collect();
                Ok(unique.into_iter().collect())
            }
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {}", secs(self.targets.dns_timeout))),
        };
        ProbeResult::Dns {
            host: host.to_string(),
            outcome,
        }
    }

    async fn connect_tcp(&self) -> ProbeResult {
        let started = Instant::now();
        let connect = async {
            let addrs = self
                .resolver
                .resolve(&self.targets.tcp_host, self.targets.tcp_port)
                .await?;
            let mut last = io::Error::new(io::ErrorKind::NotFound, "no addresses to connect to");
            for addr in addrs {
                match TcpStream::connect(addr).await {
                    Ok(_stream) => return Ok(()),
                    Err(e) => last = e,
                }
            }
            Err::<(), io::Error>(last)
        };

        let outcome = match time::timeout(self.targets.tcp_timeout, connect).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {}", secs(self.targets.tcp_timeout))),
        };
        ProbeResult::Tcp {
            endpoint: self.targets.tcp_endpoint(),
            elapsed: started.elapsed(),
            outcome,
        }
    }

    async fn fetch_http(&self) -> ProbeResult {
        let url = self.targets.http_url.clone();
        let outcome = match &self.http {
            Err(e) => Err(format!("http client unavailable: {e}")),
            Ok(client) => match client.get(url.as_str()).send().await {
                Ok(resp) => Ok(resp.status().as_u16()),
                Err(e) => Err(error_chain(&e)),
            },
        };
        ProbeResult::Http { url, outcome }
    }
}

#[async_trait]
impl Probe for NetworkProbe {
    async fn probe(&self) -> ProbeReport {
        let mut results = Vec::with_capacity(self.targets.dns_hosts.len() + 2);
        for host in &self.targets.dns_hosts {
            results.push(self.resolve_host(host).await);
        }
        results.push(self.connect_tcp().await);
        results.push(self.fetch_http().await);
        ProbeReport { results }
    }
}

/// Joins an error with its sources: `outer: inner: root`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
