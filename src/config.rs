//! # Supervisor configuration.
//!
//! [`Config`] holds every knob of the supervisor: readiness deadline, retry
//! limit, backoff, resolver choice, diagnostics, close grace and bus capacity.
//!
//! Values come from code (`Config::default()` plus field edits) or from the
//! process environment via [`Config::from_env`]. Unset or empty variables keep
//! their defaults; malformed values fail with [`ConfigError::Invalid`] naming the
//! key.
//!
//! | Variable                        | Default                               |
//! |---------------------------------|---------------------------------------|
//! | `GATEWAY_READY_TIMEOUT`         | `180` seconds (must be > 0)           |
//! | `GATEWAY_FORCE_IPV4`            | off (`1/true/yes/on` enables)         |
//! | `GATEWAY_CONNECT_RETRIES`       | `0` (unbounded)                       |
//! | `GATEWAY_CONNECT_BACKOFF_MAX`   | `60` seconds                          |
//! | `GATEWAY_CONNECT_BACKOFF_BASE`  | `2` seconds                           |
//! | `GATEWAY_CONNECT_JITTER`        | `none` (`full`, `equal`)              |
//! | `GATEWAY_DIAGNOSTICS`           | on                                    |
//! | `GATEWAY_PROBE_HOSTS`           | `gateway.discord.gg,discord.com`      |
//! | `GATEWAY_PROBE_TCP`             | `gateway.discord.gg:443`              |
//! | `GATEWAY_PROBE_URL`             | `https://discord.com/api/v10/gateway` |
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use gatevisor::{Config, RetryPolicy};
//!
//! let cfg = Config::from_lookup(|key| match key {
//!     "GATEWAY_READY_TIMEOUT" => Some("30".into()),
//!     "GATEWAY_CONNECT_RETRIES" => Some("5".into()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(cfg.ready_timeout, Duration::from_secs(30));
//! assert_eq!(cfg.retry, RetryPolicy::limited(5));
//! ```

use std::time::Duration;

use crate::diagnostics::ProbeTargets;
use crate::error::ConfigError;
use crate::policies::{BackoffPolicy, JitterPolicy, RetryPolicy};

/// Readiness deadline in seconds.
pub const ENV_READY_TIMEOUT: &str = "GATEWAY_READY_TIMEOUT";
/// Restrict name resolution to IPv4.
pub const ENV_FORCE_IPV4: &str = "GATEWAY_FORCE_IPV4";
/// Attempt limit; `0` retries forever.
pub const ENV_CONNECT_RETRIES: &str = "GATEWAY_CONNECT_RETRIES";
/// Backoff ceiling in seconds.
pub const ENV_BACKOFF_MAX: &str = "GATEWAY_CONNECT_BACKOFF_MAX";
/// First backoff delay in seconds.
pub const ENV_BACKOFF_BASE: &str = "GATEWAY_CONNECT_BACKOFF_BASE";
/// Jitter mode.
pub const ENV_JITTER: &str = "GATEWAY_CONNECT_JITTER";
/// Pre-attempt diagnostics switch.
pub const ENV_DIAGNOSTICS: &str = "GATEWAY_DIAGNOSTICS";
/// Comma-separated hostnames for the DNS probe.
pub const ENV_PROBE_HOSTS: &str = "GATEWAY_PROBE_HOSTS";
/// `host:port` for the TCP probe.
pub const ENV_PROBE_TCP: &str = "GATEWAY_PROBE_TCP";
/// URL for the HTTP probe.
pub const ENV_PROBE_URL: &str = "GATEWAY_PROBE_URL";

/// Configuration for one [`Supervisor`](crate::Supervisor).
///
/// ## Field semantics
/// - `ready_timeout`: per-attempt deadline for the client to report READY (`> 0`)
/// - `retry`: attempt limit (`RetryPolicy::unbounded()` retries forever)
/// - `backoff`: delay schedule between failed attempts
/// - `force_ipv4`: selects the IPv4-only resolver for probes and the client
/// - `diagnostics`: run the network probe before each attempt
/// - `grace`: bound on `GatewayClient::close()` during cleanup
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
/// - `handle_signals`: cancel the shutdown token on SIGINT/SIGTERM/SIGQUIT
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for READY per attempt.
    pub ready_timeout: Duration,
    /// Attempt limit.
    pub retry: RetryPolicy,
    /// Delay schedule after retryable failures.
    pub backoff: BackoffPolicy,
    /// Resolve names to IPv4 addresses only.
    pub force_ipv4: bool,
    /// Run the network probe before each attempt.
    pub diagnostics: bool,
    /// Endpoints checked by the network probe.
    pub probe: ProbeTargets,
    /// Maximum time a `close()` call may take during cleanup.
    pub grace: Duration,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
    /// Install OS signal handlers that trigger shutdown.
    pub handle_signals: bool,
}

impl Default for Config {
    /// - `ready_timeout = 180s`, unbounded retries, `BackoffPolicy::default()`
    /// - diagnostics on, IPv4 not forced
    /// - `grace = 10s`, `bus_capacity = 1024`, signal handling on
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(180),
            retry: RetryPolicy::unbounded(),
            backoff: BackoffPolicy::default(),
            force_ipv4: false,
            diagnostics: true,
            probe: ProbeTargets::default(),
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
            handle_signals: true,
        }
    }
}

impl Config {
    /// Single attempt with a 45 s deadline and no retries.
    pub fn minimal() -> Self {
        Self {
            ready_timeout: Duration::from_secs(45),
            retry: RetryPolicy::one_shot(),
            ..Self::default()
        }
    }

    /// Reads the `GATEWAY_*` variables of the current process.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();

        if let Some(raw) = get(ENV_READY_TIMEOUT) {
            let d = parse_secs(ENV_READY_TIMEOUT, &raw)?;
            if d.is_zero() {
                return Err(invalid(ENV_READY_TIMEOUT, raw, "must be greater than zero"));
            }
            cfg.ready_timeout = d;
        }
        if let Some(raw) = get(ENV_FORCE_IPV4) {
            cfg.force_ipv4 = parse_flag(&raw);
        }
        if let Some(raw) = get(ENV_CONNECT_RETRIES) {
            let n = raw
                .parse::<u32>()
                .map_err(|_| invalid(ENV_CONNECT_RETRIES, raw, "expected a non-negative integer"))?;
            cfg.retry = RetryPolicy::limited(n);
        }
        if let Some(raw) = get(ENV_BACKOFF_MAX) {
            cfg.backoff.ceiling = parse_secs(ENV_BACKOFF_MAX, &raw)?;
        }
        if let Some(raw) = get(ENV_BACKOFF_BASE) {
            cfg.backoff.base = parse_secs(ENV_BACKOFF_BASE, &raw)?;
        }
        if let Some(raw) = get(ENV_JITTER) {
            cfg.backoff.jitter = raw
                .parse::<JitterPolicy>()
                .map_err(|reason| invalid(ENV_JITTER, raw, reason))?;
        }
        if let Some(raw) = get(ENV_DIAGNOSTICS) {
            cfg.diagnostics = parse_flag(&raw);
        }
        if let Some(raw) = get(ENV_PROBE_HOSTS) {
            let hosts: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from)
                .collect();
            if hosts.is_empty() {
                return Err(invalid(ENV_PROBE_HOSTS, raw, "expected at least one hostname"));
            }
            cfg.probe.dns_hosts = hosts;
        }
        if let Some(raw) = get(ENV_PROBE_TCP) {
            let (host, port) = parse_endpoint(&raw)
                .ok_or_else(|| invalid(ENV_PROBE_TCP, raw.clone(), "expected host:port"))?;
            cfg.probe.tcp_host = host;
            cfg.probe.tcp_port = port;
        }
        if let Some(raw) = get(ENV_PROBE_URL) {
            cfg.probe.http_url = raw;
        }

        Ok(cfg)
    }
}

fn invalid(key: &'static str, value: impl Into<String>, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.into(),
        reason,
    }
}

/// Non-negative, finite seconds (fractions allowed).
fn parse_secs(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| invalid(key, raw, "expected a number of seconds"))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| invalid(key, raw, "expected a finite, non-negative number of seconds"))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_endpoint(raw: &str) -> Option<(String, u16)> {
    let (host, port) = raw.rsplit_once(':')?;
    let host = host.trim().trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return None;
    }
    Some((host.to_string(), port.trim().parse().ok()?))
}
