//! # Probe results.
//!
//! A [`ProbeReport`] is plain data: one [`ProbeResult`] per sub-probe, in the
//! order they ran. The supervisor turns each result into one event.

use std::{net::IpAddr, time::Duration};

use crate::events::{Event, EventKind};

/// Outcome of one sub-probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeResult {
    /// Name resolution of one host.
    Dns {
        /// Hostname.
        host: String,
        /// Sorted, deduplicated addresses or the resolution error.
        outcome: Result<Vec<IpAddr>, String>,
    },
    /// Raw TCP connect.
    Tcp {
        /// `host:port`.
        endpoint: String,
        /// Time spent resolving and connecting.
        elapsed: Duration,
        /// Success or the failure reason.
        outcome: Result<(), String>,
    },
    /// Single HTTP GET.
    Http {
        /// Requested URL.
        url: String,
        /// Response status or the failure reason.
        outcome: Result<u16, String>,
    },
}

impl ProbeResult {
    /// True if the sub-probe reached its target.
    pub fn is_ok(&self) -> bool {
        match self {
            ProbeResult::Dns { outcome, .. } => outcome.is_ok(),
            ProbeResult::Tcp { outcome, .. } => outcome.is_ok(),
            ProbeResult::Http { outcome, .. } => outcome.is_ok(),
        }
    }

    pub(crate) fn to_event(&self) -> Event {
        match self {
            ProbeResult::Dns { host, outcome } => match outcome {
                Ok(addrs) => {
                    let list = if addrs.is_empty() {
                        "<none>".to_string()
                    } else {
                        addrs
                            .iter()
                            .map(IpAddr::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    };
                    Event::new(EventKind::DnsResolved)
                        .with_target(host.as_str())
                        .with_reason(list)
                }
                Err(err) => Event::new(EventKind::DnsFailed)
                    .with_target(host.as_str())
                    .with_reason(err.as_str()),
            },
            ProbeResult::Tcp {
                endpoint,
                elapsed,
                outcome,
            } => match outcome {
                Ok(()) => Event::new(EventKind::TcpProbeSucceeded)
                    .with_target(endpoint.as_str())
                    .with_elapsed(*elapsed),
                Err(err) => Event::new(EventKind::TcpProbeFailed)
                    .with_target(endpoint.as_str())
                    .with_elapsed(*elapsed)
                    .with_reason(err.as_str()),
            },
            ProbeResult::Http { url, outcome } => match outcome {
                Ok(status) => Event::new(EventKind::HttpProbeCompleted)
                    .with_target(url.as_str())
                    .with_status(*status),
                Err(err) => Event::new(EventKind::HttpProbeFailed)
                    .with_target(url.as_str())
                    .with_reason(err.as_str()),
            },
        }
    }
}

/// Results of one diagnostics run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Results in execution order.
    pub results: Vec<ProbeResult>,
}

impl ProbeReport {
    /// Number of sub-probes that failed.
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.is_ok()).count()
    }

    /// True if every sub-probe succeeded.
    pub fn is_healthy(&self) -> bool {
        self.failures() == 0
    }

    pub(crate) fn events(&self) -> impl Iterator<Item = Event> + '_ {
        self.results.iter().map(ProbeResult::to_event)
    }
}
