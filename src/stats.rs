/*!
 * Per-pass statistics
 */

use crate::core::{NetworkId, ProbeSummary, PurgeSummary};

/// How discovery went for one network
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DiscoveryStatus {
    /// Refresh was not due this pass
    #[default]
    Skipped,
    /// Room resolved and members merged
    Synced { added: usize },
    /// No discovery room on this server
    RoomMissing,
    /// Alias lookup or member listing failed
    Failed(String),
}

/// Counters for one network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkReport {
    pub network: NetworkId,
    pub discovery: DiscoveryStatus,
    pub candidates: usize,
    pub probed: usize,
    pub probe_failures: usize,
    pub due: usize,
    pub purged: usize,
    pub purge_failures: usize,
    pub skipped: usize,
    /// Accounts left in the ledger segment after the pass
    pub tracked: usize,
}

impl NetworkReport {
    pub fn new(network: &str) -> Self {
        Self {
            network: network.to_string(),
            ..Default::default()
        }
    }

    pub fn record_probe(&mut self, summary: &ProbeSummary) {
        self.candidates = summary.probed + summary.failed;
        self.probed = summary.probed;
        self.probe_failures = summary.failed;
        self.due = summary.due.len();
    }

    pub fn record_purge(&mut self, summary: &PurgeSummary) {
        self.purged = summary.purged.len();
        self.purge_failures = summary.failed.len();
        self.skipped = summary.skipped.len();
    }
}

/// Summary of a whole pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Membership was pulled from discovery rooms this pass
    pub refreshed: bool,
    pub networks: Vec<NetworkReport>,
}

impl PassReport {
    pub fn total_purged(&self) -> usize {
        self.networks.iter().map(|n| n.purged).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.networks
            .iter()
            .map(|n| n.probe_failures + n.purge_failures)
            .sum()
    }

    pub fn network(&self, network: &str) -> Option<&NetworkReport> {
        self.networks.iter().find(|n| n.network == network)
    }

    /// Emit one summary line per network plus a total
    pub fn log(&self) {
        for n in &self.networks {
            tracing::info!(
                network = %n.network,
                discovery = ?n.discovery,
                probed = n.probed,
                probe_failures = n.probe_failures,
                due = n.due,
                purged = n.purged,
                purge_failures = n.purge_failures,
                tracked = n.tracked,
                "Network pass finished"
            );
        }
        tracing::info!(
            refreshed = self.refreshed,
            purged = self.total_purged(),
            failures = self.total_failures(),
            "Purge pass finished"
        );
    }
}
