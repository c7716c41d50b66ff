/*!
 * Configuration types for the purger
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PurgerError, Result};

/// Two days
pub const DEFAULT_INACTIVITY_THRESHOLD_SECS: i64 = 2 * 24 * 60 * 60;

/// Ten years; anything longer means nobody is ever purged
pub const MAX_INACTIVITY_THRESHOLD_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Chain ids whose discovery rooms are tracked by default
pub const DEFAULT_NETWORKS: &[&str] = &["1", "3", "4", "5", "42", "627"];

/// Main configuration for a purge pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgerConfig {
    /// Homeserver base URL, e.g. `https://transport.example.org`
    #[serde(default)]
    pub server_url: String,

    /// Where the activity ledger is stored
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Seconds an offline account may stay unseen before it becomes purgeable
    #[serde(default = "default_inactivity_threshold")]
    pub inactivity_threshold_secs: i64,

    /// Minimum spacing between two remote calls, in milliseconds (0 = no pacing)
    #[serde(default = "default_probe_delay")]
    pub probe_delay_ms: u64,

    /// Timeout applied to every HTTP request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Network identifiers always present in the ledger
    #[serde(default = "default_networks")]
    pub networks: Vec<String>,

    /// First component of discovery room aliases
    #[serde(default = "default_room_prefix")]
    pub room_prefix: String,

    /// Last component of discovery room aliases
    #[serde(default = "default_discovery_suffix")]
    pub discovery_suffix: String,

    /// Accounts starting with this prefix are never tracked
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,

    /// What a presence reply without `last_active_ago` means
    #[serde(default)]
    pub missing_activity: MissingActivityPolicy,

    /// Probe and report, but never deactivate
    #[serde(default)]
    pub dry_run: bool,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for PurgerConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            ledger_path: default_ledger_path(),
            inactivity_threshold_secs: default_inactivity_threshold(),
            probe_delay_ms: default_probe_delay(),
            request_timeout_secs: default_request_timeout(),
            networks: default_networks(),
            room_prefix: default_room_prefix(),
            discovery_suffix: default_discovery_suffix(),
            admin_prefix: default_admin_prefix(),
            missing_activity: MissingActivityPolicy::AssumeIdle,
            dry_run: false,
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
        }
    }
}

/// Interpretation of a presence reply that carries no `last_active_ago`.
///
/// Homeservers occasionally omit the field. Treating such accounts as idle
/// biases toward deletion, so the choice is left to the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingActivityPolicy {
    /// Pretend the account was last active just past the threshold
    #[default]
    AssumeIdle,

    /// Pretend the account was active at probe time
    AssumeActive,
}

impl MissingActivityPolicy {
    /// Seconds since last activity to assume for the given threshold
    pub fn assumed_idle_secs(&self, threshold_secs: i64) -> i64 {
        match self {
            MissingActivityPolicy::AssumeIdle => threshold_secs.saturating_add(1),
            MissingActivityPolicy::AssumeActive => 0,
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Login credentials for the admin account
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read `{"username": ..., "password": ...}` from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PurgerError::Credentials(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| PurgerError::Credentials(format!("{}: {}", path.display(), e)))
    }
}

// Default value functions for serde
fn default_ledger_path() -> PathBuf {
    PathBuf::from("/config/user_activity.json")
}

fn default_inactivity_threshold() -> i64 {
    DEFAULT_INACTIVITY_THRESHOLD_SECS
}

fn default_probe_delay() -> u64 {
    100
}

fn default_request_timeout() -> u64 {
    30
}

fn default_networks() -> Vec<String> {
    DEFAULT_NETWORKS.iter().map(|n| n.to_string()).collect()
}

fn default_room_prefix() -> String {
    "raiden".to_string()
}

fn default_discovery_suffix() -> String {
    "discovery".to_string()
}

fn default_admin_prefix() -> String {
    "@admin".to_string()
}

impl PurgerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PurgerError::Config(format!("{}: {}", path.display(), e)))?;
        let config: PurgerConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Reject values that would make a pass meaningless
    pub fn validate(&self) -> Result<()> {
        if self.inactivity_threshold_secs <= 0 {
            return Err(PurgerError::Config(
                "inactivity_threshold_secs must be positive".to_string(),
            ));
        }
        if self.inactivity_threshold_secs > MAX_INACTIVITY_THRESHOLD_SECS {
            return Err(PurgerError::Config(format!(
                "inactivity_threshold_secs must not exceed {}",
                MAX_INACTIVITY_THRESHOLD_SECS
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(PurgerError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.networks.iter().any(|n| n.is_empty()) {
            return Err(PurgerError::Config("empty network identifier".to_string()));
        }
        url::Url::parse(&self.server_url)
            .map_err(|e| {
                PurgerError::Config(format!("invalid server url {:?}: {}", self.server_url, e))
            })?;
        Ok(())
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
