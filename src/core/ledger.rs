/*!
 * Activity ledger: last-seen time per account, per network
 *
 * The ledger is the only state the purger keeps between runs. It is read once
 * at start, mutated in place by a pass and written back atomically at the end.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::Thresholds;
use crate::api::AccountId;

/// Network (chain) identifier as used for ledger keys, e.g. `"1"`
pub type NetworkId = String;

/// Last-seen unix timestamp per account of one network
pub type AccountActivity = BTreeMap<AccountId, i64>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// No ledger has been written yet
    #[error("ledger file {0} does not exist")]
    NotFound(PathBuf),

    /// File exists but does not hold a valid ledger
    #[error("corrupt ledger state: {0}")]
    CorruptState(String),

    #[error("ledger I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted activity state
///
/// Serialized with the field names of the deployed `user_activity.json`
/// document (`last_update`, `network_to_users`). The descriptive names
/// `lastGlobalRefresh` and `networks` are accepted as aliases on load, but a
/// document written that way is persisted back under the deployed names, so
/// its top-level keys change on the first write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// When discovery room membership was last pulled for all networks
    #[serde(rename = "last_update", alias = "lastGlobalRefresh")]
    pub last_global_refresh: i64,

    #[serde(rename = "network_to_users", alias = "networks", default)]
    pub networks: BTreeMap<NetworkId, AccountActivity>,
}

impl Ledger {
    /// Empty ledger whose membership refresh is already due
    pub fn fresh(now: i64, thresholds: &Thresholds) -> Self {
        Self {
            last_global_refresh: thresholds.fresh_last_seen(now),
            networks: BTreeMap::new(),
        }
    }

    /// Read and validate a ledger file
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let contents = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LedgerError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(LedgerError::Io(e)),
        };

        let ledger: Ledger = serde_json::from_slice(&contents)
            .map_err(|e| LedgerError::CorruptState(format!("{}: {}", path.display(), e)))?;
        ledger.validate()?;
        Ok(ledger)
    }

    /// Load the ledger, falling back to a fresh one on any error
    ///
    /// Losing history only means every account re-enters the "just
    /// discovered" state, so a bad file never aborts a run.
    pub fn load_or_fresh(path: &Path, now: i64, thresholds: &Thresholds) -> Self {
        match Self::load(path) {
            Ok(ledger) => {
                tracing::debug!(
                    path = %path.display(),
                    networks = ledger.networks.len(),
                    accounts = ledger.account_count(),
                    "Loaded activity ledger"
                );
                ledger
            }
            Err(LedgerError::NotFound(_)) => {
                tracing::warn!(
                    path = %path.display(),
                    "Ledger not found, starting with empty ledger"
                );
                Self::fresh(now, thresholds)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ledger unreadable, starting with empty ledger"
                );
                Self::fresh(now, thresholds)
            }
        }
    }

    /// Structural checks serde cannot express
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.last_global_refresh < 0 {
            return Err(LedgerError::CorruptState(format!(
                "negative last_update {}",
                self.last_global_refresh
            )));
        }
        for (network, accounts) in &self.networks {
            if network.is_empty() {
                return Err(LedgerError::CorruptState("empty network id".to_string()));
            }
            for (account, last_seen) in accounts {
                if account.is_empty() {
                    return Err(LedgerError::CorruptState(format!(
                        "empty account id in network {}",
                        network
                    )));
                }
                if *last_seen < 0 {
                    return Err(LedgerError::CorruptState(format!(
                        "negative last-seen {} for {}",
                        last_seen, account
                    )));
                }
            }
        }
        Ok(())
    }

    /// Add an empty segment for `network` unless it already exists
    pub fn ensure_network(&mut self, network: &str) -> &mut AccountActivity {
        self.networks.entry(network.to_string()).or_default()
    }

    pub fn ensure_networks<I, S>(&mut self, networks: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for network in networks {
            self.ensure_network(network.as_ref());
        }
    }

    pub fn segment(&self, network: &str) -> Option<&AccountActivity> {
        self.networks.get(network)
    }

    pub fn segment_mut(&mut self, network: &str) -> Option<&mut AccountActivity> {
        self.networks.get_mut(network)
    }

    /// Fold another ledger in; the more recent observation wins
    pub fn merge(&mut self, other: Ledger) {
        self.last_global_refresh = self.last_global_refresh.max(other.last_global_refresh);
        for (network, accounts) in other.networks {
            let segment = self.networks.entry(network).or_default();
            for (account, last_seen) in accounts {
                segment
                    .entry(account)
                    .and_modify(|known| *known = (*known).max(last_seen))
                    .or_insert(last_seen);
            }
        }
    }

    pub fn account_count(&self) -> usize {
        self.networks.values().map(|accounts| accounts.len()).sum()
    }

    /// Write the ledger atomically
    ///
    /// The document goes to a temporary file next to `path`, is synced and
    /// then renamed over the target, so readers see either the old or the new
    /// ledger, never a partial one.
    pub fn persist(&self, path: &Path) -> Result<(), LedgerError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        let body = serde_json::to_vec(self)
            .map_err(|e| LedgerError::CorruptState(format!("serialization failed: {}", e)))?;
        temp.write_all(&body)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| LedgerError::Io(e.error))?;

        tracing::debug!(
            path = %path.display(),
            accounts = self.account_count(),
            "Persisted activity ledger"
        );
        Ok(())
    }
}
