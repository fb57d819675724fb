//! # Demo: probe
//!
//! Runs the network diagnostics once against the configured targets and prints
//! the report. Honors `GATEWAY_FORCE_IPV4`, `GATEWAY_PROBE_HOSTS`,
//! `GATEWAY_PROBE_TCP` and `GATEWAY_PROBE_URL`.
//!
//! ## Run
//! ```bash
//! GATEWAY_FORCE_IPV4=1 cargo run --example probe
//! ```

use gatevisor::{Config, NetworkProbe, Probe, ProbeResult, resolver_for};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::from_env()?;
    let probe = NetworkProbe::new(cfg.probe.clone(), resolver_for(cfg.force_ipv4));

    let report = probe.probe().await;
    for result in &report.results {
        match result {
            ProbeResult::Dns { host, outcome } => match outcome {
                Ok(addrs) => println!("dns   {host:<30} {addrs:?}"),
                Err(e) => println!("dns   {host:<30} FAILED: {e}"),
            },
            ProbeResult::Tcp {
                endpoint,
                elapsed,
                outcome,
            } => match outcome {
                Ok(()) => println!("tcp   {endpoint:<30} ok in {elapsed:?}"),
                Err(e) => println!("tcp   {endpoint:<30} FAILED after {elapsed:?}: {e}"),
            },
            ProbeResult::Http { url, outcome } => match outcome {
                Ok(status) => println!("http  {url:<30} status {status}"),
                Err(e) => println!("http  {url:<30} FAILED: {e}"),
            },
        }
    }
    println!("{} of {} checks failed", report.failures(), report.results.len());
    Ok(())
}
