use std::sync::Arc;

use crate::{
    config::Config,
    diagnostics::{NetworkProbe, ProbeRef, ResolverRef, resolver_for},
    events::Bus,
    subscribers::{LogWriter, Subscribe},
};

use super::supervisor::Supervisor;

/// Builder for a [`Supervisor`] with optional collaborators.
///
/// Defaults:
/// - subscribers: `[LogWriter]`
/// - resolver: [`resolver_for`]`(cfg.force_ipv4)`
/// - probe: [`NetworkProbe`] over `cfg.probe` when `cfg.diagnostics` is on
pub struct SupervisorBuilder {
    cfg: Config,
    subscribers: Option<Vec<Arc<dyn Subscribe>>>,
    probe: Option<ProbeRef>,
    resolver: Option<ResolverRef>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: None,
            probe: None,
            resolver: None,
        }
    }

    /// Replaces the default subscribers. An empty list disables event delivery
    /// to subscribers; [`Supervisor::subscribe`] still works.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = Some(subscribers);
        self
    }

    /// Uses `probe` for diagnostics instead of the network probe.
    ///
    /// Ignored when `cfg.diagnostics` is off.
    pub fn with_probe(mut self, probe: ProbeRef) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Uses `resolver` instead of the one selected by `cfg.force_ipv4`.
    pub fn with_resolver(mut self, resolver: ResolverRef) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Builds the supervisor. Does not need a running runtime.
    pub fn build(self) -> Supervisor {
        let bus = Bus::new(self.cfg.bus_capacity);
        let resolver = self
            .resolver
            .unwrap_or_else(|| resolver_for(self.cfg.force_ipv4));

        let probe = if self.cfg.diagnostics {
            Some(self.probe.unwrap_or_else(|| {
                Arc::new(NetworkProbe::new(
                    self.cfg.probe.clone(),
                    Arc::clone(&resolver),
                )) as ProbeRef
            }))
        } else {
            None
        };

        let subscribers = self
            .subscribers
            .unwrap_or_else(|| vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>]);

        Supervisor::new_internal(self.cfg, bus, subscribers, probe, resolver)
    }
}
