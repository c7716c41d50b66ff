/*!
 * Purger - inactive-account lifecycle engine for Matrix homeservers
 *
 * - Per-network activity ledger persisted atomically between runs
 * - Discovery room membership refresh, at most once per inactivity window
 * - Presence probing limited to accounts past the inactivity deadline
 * - Erasing deactivation of accounts confirmed offline
 * - Paced, sequential homeserver calls
 */

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod stats;

// Re-export commonly used types
pub use api::{ChatServerApi, HttpChatApi, Presence, PresenceStatus};
pub use config::{Credentials, MissingActivityPolicy, PurgerConfig};
pub use core::{Ledger, PassOutcome, RunOrchestrator, Thresholds};
pub use error::{PurgerError, Result};
pub use stats::PassReport;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
