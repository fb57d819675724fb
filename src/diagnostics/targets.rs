use std::time::Duration;

/// Endpoints the diagnostics step checks before every attempt.
///
/// Defaults point at the Discord gateway and its low-cost `/gateway` endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeTargets {
    /// Hostnames to resolve.
    pub dns_hosts: Vec<String>,
    /// Host for the raw TCP connect.
    pub tcp_host: String,
    /// Port for the raw TCP connect.
    pub tcp_port: u16,
    /// URL for the single HTTP GET.
    pub http_url: String,
    /// Bound on each DNS lookup.
    pub dns_timeout: Duration,
    /// Bound on resolve + connect for the TCP probe.
    pub tcp_timeout: Duration,
    /// Bound on the whole HTTP request.
    pub http_timeout: Duration,
}

impl Default for ProbeTargets {
    fn default() -> Self {
        Self {
            dns_hosts: vec!["gateway.discord.gg".into(), "discord.com".into()],
            tcp_host: "gateway.discord.gg".into(),
            tcp_port: 443,
            http_url: "https://discord.com/api/v10/gateway".into(),
            dns_timeout: Duration::from_secs(5),
            tcp_timeout: Duration::from_secs(8),
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl ProbeTargets {
    /// `host:port` of the TCP probe.
    pub fn tcp_endpoint(&self) -> String {
        format!("{}:{}", self.tcp_host, self.tcp_port)
    }

    /// Upper bound on one full probe round: every lookup, the connect and the
    /// request, plus one second of slack.
    pub fn budget(&self) -> Duration {
        let hosts = u32::try_from(self.dns_hosts.len()).unwrap_or(u32::MAX);
        self.dns_timeout
            .saturating_mul(hosts)
            .saturating_add(self.tcp_timeout)
            .saturating_add(self.http_timeout)
            .saturating_add(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_covers_every_check() {
        let t = ProbeTargets::default();
        assert_eq!(t.budget(), Duration::from_secs(2 * 5 + 8 + 10 + 1));

        let none = ProbeTargets {
            dns_hosts: Vec::new(),
            ..ProbeTargets::default()
        };
        assert_eq!(none.budget(), Duration::from_secs(8 + 10 + 1));
    }
}
