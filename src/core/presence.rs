/*!
 * Presence probing of deletion candidates
 *
 * Only accounts already past the deadline are probed, which keeps the number
 * of presence requests per pass small. A probe refreshes the account's
 * last-seen; it is due for purge only if it is still past the deadline and
 * the homeserver reports it offline right now.
 */

use crate::api::{AccountId, ChatServerApi, Presence, PresenceStatus};
use crate::config::{MissingActivityPolicy, PurgerConfig};

use super::{AccountActivity, CallGate, Thresholds};

/// Result of probing one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Observed { presence: Presence, last_seen: i64 },
    TransportError(String),
}

/// What a probe stage found for one network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    /// Candidates confirmed offline and still past the deadline
    pub due: Vec<AccountId>,
    pub probed: usize,
    pub failed: usize,
}

pub struct PresenceProbe<'a> {
    api: &'a dyn ChatServerApi,
    gate: &'a CallGate,
    thresholds: Thresholds,
    missing_activity: MissingActivityPolicy,
}

impl<'a> PresenceProbe<'a> {
    pub fn new(api: &'a dyn ChatServerApi, gate: &'a CallGate, config: &PurgerConfig) -> Self {
        Self {
            api,
            gate,
            thresholds: Thresholds::from_config(config),
            missing_activity: config.missing_activity,
        }
    }

    /// Accounts last seen before the deadline
    pub fn candidates(&self, segment: &AccountActivity, now: i64) -> Vec<AccountId> {
        segment
            .iter()
            .filter(|(_, last_seen)| self.thresholds.is_candidate(**last_seen, now))
            .map(|(account, _)| account.clone())
            .collect()
    }

    /// Last-seen timestamp implied by a presence reply
    ///
    /// Clamped at zero: an absurd `last_active_ago` must still produce a
    /// value the ledger accepts on the next load.
    pub fn last_seen_from(&self, status: &PresenceStatus, now: i64) -> i64 {
        let idle_secs = match status.last_active_ago_ms {
            Some(ms) => i64::try_from(ms / 1000).unwrap_or(i64::MAX),
            None => self
                .missing_activity
                .assumed_idle_secs(self.thresholds.inactivity_secs),
        };
        now.saturating_sub(idle_secs).max(0)
    }

    /// Ask the homeserver about one account
    pub async fn probe(&self, account: &str, now: i64) -> ProbeOutcome {
        match self.gate.paced(|| self.api.get_presence(account)).await {
            Ok(status) => ProbeOutcome::Observed {
                presence: status.presence,
                last_seen: self.last_seen_from(&status, now),
            },
            Err(e) => ProbeOutcome::TransportError(e.to_string()),
        }
    }

    /// Probe every candidate in `segment`, update its last-seen and collect
    /// the ones due for purge. A failed probe leaves the account untouched so
    /// it stays a candidate for the next pass.
    pub async fn probe_candidates(&self, segment: &mut AccountActivity, now: i64) -> ProbeSummary {
        let candidates = self.candidates(segment, now);
        let deadline = self.thresholds.deadline(now);
        let mut summary = ProbeSummary::default();

        tracing::info!(
            candidates = candidates.len(),
            "Fetching presence of possibly inactive users"
        );

        for account in candidates {
            match self.probe(&account, now).await {
                ProbeOutcome::Observed {
                    presence,
                    last_seen,
                } => {
                    summary.probed += 1;
                    segment.insert(account.clone(), last_seen);
                    if last_seen < deadline && presence == Presence::Offline {
                        tracing::debug!(account = %account, last_seen, "Account due for purge");
                        summary.due.push(account);
                    } else {
                        tracing::trace!(
                            account = %account,
                            %presence,
                            last_seen,
                            "Account still active"
                        );
                    }
                }
                ProbeOutcome::TransportError(detail) => {
                    summary.failed += 1;
                    tracing::warn!(
                        account = %account,
                        error = %detail,
                        "Could not fetch user presence"
                    );
                }
            }
        }

        summary
    }
}
