/*!
 * Inactive-account lifecycle engine
 *
 * One pass walks every network in the ledger:
 *
 * ```text
 * START -> (refresh due? -> DISCOVER -> SYNC) -> PROBE -> PURGE -> DONE
 * ```
 *
 * Remote calls are issued one at a time through a shared [`CallGate`].
 */

pub mod discovery;
pub mod gate;
pub mod ledger;
pub mod membership;
pub mod orchestrator;
pub mod presence;
pub mod purge;

pub use discovery::{DiscoveryResolver, Resolution, RoomHandle};
pub use gate::CallGate;
pub use ledger::{AccountActivity, Ledger, LedgerError, NetworkId};
pub use membership::MembershipSync;
pub use orchestrator::{PassOutcome, RunOrchestrator};
pub use presence::{PresenceProbe, ProbeOutcome, ProbeSummary};
pub use purge::{PurgeExecutor, PurgeSummary};

use crate::config::PurgerConfig;

/// Inactivity window arithmetic shared by every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Seconds an account may stay unseen before it is a deletion candidate
    pub inactivity_secs: i64,
}

impl Thresholds {
    pub fn new(inactivity_secs: i64) -> Self {
        Self { inactivity_secs }
    }

    pub fn from_config(config: &PurgerConfig) -> Self {
        Self::new(config.inactivity_threshold_secs)
    }

    /// Accounts last seen before this instant are deletion candidates
    pub fn deadline(&self, now: i64) -> i64 {
        now.saturating_sub(self.inactivity_secs)
    }

    /// Last-seen value for a newly discovered account: one second past the
    /// deadline, so it gets probed but never purged without a probe.
    /// Never below zero, which is the lowest value a ledger accepts.
    pub fn fresh_last_seen(&self, now: i64) -> i64 {
        self.deadline(now).saturating_sub(1).max(0)
    }

    pub fn is_candidate(&self, last_seen: i64, now: i64) -> bool {
        last_seen < self.deadline(now)
    }

    /// Membership is pulled at most once per inactivity window
    pub fn refresh_due(&self, last_refresh: i64, now: i64) -> bool {
        last_refresh < self.deadline(now)
    }
}
