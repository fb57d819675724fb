//! # Name resolution strategy.
//!
//! Forcing IPv4 is a per-process choice made once from [`Config`](crate::Config).
//! Instead of patching a global lookup function, the choice is expressed as a
//! [`Resolve`] implementation that is handed to everything that connects:
//! diagnostics (DNS, TCP and HTTP probes) and, through
//! [`Supervisor::resolver`](crate::Supervisor::resolver), the wrapped client.
//!
//! ```text
//! resolver_for(force_ipv4)
//!   ├─ false → SystemResolver            (A + AAAA)
//!   └─ true  → Ipv4Only<SystemResolver>  (A only, error if none)
//! ```

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;

/// Resolves a host name to socket addresses.
#[async_trait]
pub trait Resolve: Send + Sync + 'static {
    /// Returns every address for `host`, with `port` applied.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;
}

/// Shared handle to a resolver.
pub type ResolverRef = Arc<dyn Resolve>;

/// The operating system resolver (via `tokio::net::lookup_host`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        Ok(tokio::net::lookup_host((host, port)).await?.collect())
    }
}

/// Keeps only IPv4 answers of the wrapped resolver.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ipv4Only<R> {
    inner: R,
}

impl<R> Ipv4Only<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: Resolve> Resolve for Ipv4Only<R> {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = self
            .inner
            .resolve(host, port)
            .await?
            .into_iter()
            .filter(SocketAddr::is_ipv4)
            .collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no IPv4 address for {host}"),
            ));
        }
        Ok(addrs)
    }
}

/// Picks the process resolver from the force-IPv4 flag.
pub fn resolver_for(force_ipv4: bool) -> ResolverRef {
    if force_ipv4 {
        Arc::new(Ipv4Only::new(SystemResolver))
    } else {
        Arc::new(SystemResolver)
    }
}

/// Adapter so the HTTP probe resolves through the same strategy.
pub(crate) struct HttpResolver(pub(crate) ResolverRef);

impl reqwest::dns::Resolve for HttpResolver {
    fn resolve(&self, name: reqwest::dns::Name) -> reqwest::dns::Resolving {
        let inner = Arc::clone(&self.0);
        Box::pin(async move {
            let addrs = inner
                .resolve(name.as_str(), 0)
                .await
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
            let addrs: reqwest::dns::Addrs = Box::new(addrs.into_iter());
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}
