/*!
 * Account deactivation
 */

use crate::api::{AccountId, ChatServerApi};
use crate::config::PurgerConfig;

use super::{AccountActivity, CallGate};

const SECS_PER_DAY: f64 = 60.0 * 60.0 * 24.0;

/// What a purge stage did for one network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub purged: Vec<AccountId>,
    pub failed: Vec<AccountId>,
    /// No longer in the ledger, or left alone in dry-run mode
    pub skipped: Vec<AccountId>,
}

pub struct PurgeExecutor<'a> {
    api: &'a dyn ChatServerApi,
    gate: &'a CallGate,
    dry_run: bool,
}

impl<'a> PurgeExecutor<'a> {
    pub fn new(api: &'a dyn ChatServerApi, gate: &'a CallGate, config: &PurgerConfig) -> Self {
        Self {
            api,
            gate,
            dry_run: config.dry_run,
        }
    }

    /// Deactivate (with erase) every due account.
    ///
    /// A successful deactivation removes the account from `segment`; there is
    /// no tombstone since the remote account is gone. A failure keeps the
    /// record for re-evaluation next pass. Nothing is retried within a pass.
    pub async fn purge(
        &self,
        segment: &mut AccountActivity,
        due: &[AccountId],
        now: i64,
    ) -> PurgeSummary {
        let mut summary = PurgeSummary::default();

        for account in due {
            let Some(&last_seen) = segment.get(account) else {
                tracing::debug!(account = %account, "Account no longer tracked, skipping");
                summary.skipped.push(account.clone());
                continue;
            };
            let days_offline = (now - last_seen) as f64 / SECS_PER_DAY;

            if self.dry_run {
                tracing::info!(
                    account = %account,
                    days_offline,
                    "Dry run: would deactivate account"
                );
                summary.skipped.push(account.clone());
                continue;
            }

            match self
                .gate
                .paced(|| self.api.deactivate_account(account, true))
                .await
            {
                Ok(()) => {
                    segment.remove(account);
                    tracing::info!(account = %account, days_offline, "Account deactivated");
                    summary.purged.push(account.clone());
                }
                Err(e) => {
                    tracing::warn!(account = %account, error = %e, "Could not deactivate account");
                    summary.failed.push(account.clone());
                }
            }
        }

        summary
    }
}
