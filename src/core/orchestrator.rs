/*!
 * One full purge pass across all networks
 */

use crate::api::ChatServerApi;
use crate::config::PurgerConfig;
use crate::stats::{DiscoveryStatus, NetworkReport, PassReport};

use super::{
    AccountActivity, CallGate, DiscoveryResolver, Ledger, MembershipSync, PresenceProbe,
    PurgeExecutor, Resolution, Thresholds,
};

/// Ledger after a pass, ready to be persisted by the caller
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub ledger: Ledger,
    pub report: PassReport,
}

/// Drives discovery, membership sync, probing and purging per network
pub struct RunOrchestrator<A: ChatServerApi> {
    api: A,
    gate: CallGate,
    config: PurgerConfig,
    thresholds: Thresholds,
}

impl<A: ChatServerApi> RunOrchestrator<A> {
    pub fn new(api: A, config: PurgerConfig) -> Self {
        let gate = CallGate::new(config.probe_delay());
        let thresholds = Thresholds::from_config(&config);
        Self {
            api,
            gate,
            config,
            thresholds,
        }
    }

    /// Run one pass over `ledger` at time `now` (unix seconds).
    ///
    /// Configured networks missing from the ledger are added first. Networks
    /// are processed in ledger key order. No single account or network
    /// failure aborts the pass; persistence is left to the caller.
    pub async fn run_pass(&self, mut ledger: Ledger, now: i64) -> PassOutcome {
        ledger.ensure_networks(&self.config.networks);

        let refresh = self.thresholds.refresh_due(ledger.last_global_refresh, now);
        if refresh {
            tracing::info!(
                last_refresh = ledger.last_global_refresh,
                "Membership refresh due, fetching discovery room members"
            );
            ledger.last_global_refresh = now;
        }

        let mut report = PassReport {
            refreshed: refresh,
            networks: Vec::with_capacity(ledger.networks.len()),
        };

        for (network, segment) in ledger.networks.iter_mut() {
            let network_report = self.run_network(network, segment, refresh, now).await;
            report.networks.push(network_report);
        }

        report.log();
        PassOutcome { ledger, report }
    }

    async fn run_network(
        &self,
        network: &str,
        segment: &mut AccountActivity,
        refresh: bool,
        now: i64,
    ) -> NetworkReport {
        let mut report = NetworkReport::new(network);

        if refresh {
            report.discovery = self.discover_and_sync(network, segment, now).await;
        }

        let probe = PresenceProbe::new(&self.api, &self.gate, &self.config);
        let probe_summary = probe.probe_candidates(segment, now).await;
        report.record_probe(&probe_summary);

        tracing::info!(network, due = probe_summary.due.len(), "Purging inactive users");
        let executor = PurgeExecutor::new(&self.api, &self.gate, &self.config);
        let purge_summary = executor.purge(segment, &probe_summary.due, now).await;
        report.record_purge(&purge_summary);

        report.tracked = segment.len();
        report
    }

    /// DISCOVER and SYNC; any failure falls through to probing with the
    /// accounts already known
    async fn discover_and_sync(
        &self,
        network: &str,
        segment: &mut AccountActivity,
        now: i64,
    ) -> DiscoveryStatus {
        let resolver = DiscoveryResolver::new(&self.api, &self.gate, &self.config);
        let room = match resolver.resolve(network).await {
            Resolution::Resolved(room) => room,
            Resolution::NotFound => {
                tracing::warn!(network, "No discovery room found, skipping membership refresh");
                return DiscoveryStatus::RoomMissing;
            }
            Resolution::TransportError(detail) => {
                tracing::warn!(network, error = %detail, "Could not resolve discovery room");
                return DiscoveryStatus::Failed(detail);
            }
        };

        let sync = MembershipSync::new(&self.api, &self.gate, &self.config);
        match sync.sync(&room, segment, now).await {
            Ok(added) => DiscoveryStatus::Synced { added },
            Err(e) => {
                tracing::warn!(
                    network,
                    room = %room.local_alias(),
                    error = %e,
                    "Could not fetch members"
                );
                DiscoveryStatus::Failed(e.to_string())
            }
        }
    }
}
