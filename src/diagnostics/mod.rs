//! # Pre-attempt network diagnostics.
//!
//! Before every connection attempt the supervisor may run a [`Probe`]. Each
//! sub-probe result becomes one diagnostic event; the report never affects
//! whether or how the attempt proceeds.
//!
//! - [`Resolve`] / [`resolver_for`]: the process-wide name resolution strategy.
//! - [`NetworkProbe`]: DNS, TCP and HTTP checks against [`ProbeTargets`].
//! - [`ProbeReport`] / [`ProbeResult`]: plain-data outcomes.

mod probe;
mod report;
mod resolver;
mod targets;

pub use probe::{NetworkProbe, Probe, ProbeRef};
pub use report::{ProbeReport, ProbeResult};
pub use resolver::{Ipv4Only, Resolve, ResolverRef, SystemResolver, resolver_for};
pub use targets::ProbeTargets;
