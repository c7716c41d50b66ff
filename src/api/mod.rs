//! Homeserver API abstraction
//!
//! The purge engine only ever talks to the homeserver through the
//! [`ChatServerApi`] trait:
//!
//! - [`HttpChatApi`]: Matrix client-server and Synapse admin HTTP endpoints
//! - `MockChatServer`: in-memory homeserver for unit tests (test builds only)
//!
//! Every method maps one remote call. Pacing and per-account error isolation
//! are the caller's concern.

mod http;

#[cfg(test)]
pub mod mock;

pub use http::HttpChatApi;

#[cfg(test)]
pub use mock::MockChatServer;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Matrix user id, e.g. `@0xabc:transport.example.org`
pub type AccountId = String;

/// Matrix room id, e.g. `!aBcDeF:transport.example.org`
pub type RoomId = String;

/// Result type alias for homeserver calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors returned by the homeserver or the transport underneath it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Alias, room or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Matrix error response with errcode
    #[error("Homeserver error ({status} {errcode}): {message}")]
    Server {
        status: u16,
        errcode: String,
        message: String,
    },

    /// Connection refused, reset, DNS failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Token missing or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// Presence state as reported by the homeserver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
    Unavailable,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Online => write!(f, "online"),
            Presence::Offline => write!(f, "offline"),
            Presence::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Body of `GET /presence/{userId}/status`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresenceStatus {
    pub presence: Presence,

    /// Milliseconds since the user last did something; may be absent
    #[serde(rename = "last_active_ago", default)]
    pub last_active_ago_ms: Option<u64>,
}

impl PresenceStatus {
    pub fn new(presence: Presence, last_active_ago_ms: Option<u64>) -> Self {
        Self {
            presence,
            last_active_ago_ms,
        }
    }
}

/// Remote surface consumed by the purge engine
#[async_trait]
pub trait ChatServerApi: Send + Sync {
    /// Host (and port) the homeserver is known as, e.g. `transport.example.org`
    fn server_name(&self) -> &str;

    /// Resolve a full alias (`#alias:server`) to its room id
    async fn resolve_room_alias(&self, alias: &str) -> ApiResult<RoomId>;

    /// All members of a room, local and remote (admin scope)
    async fn list_room_members(&self, room_id: &str) -> ApiResult<Vec<AccountId>>;

    /// Current presence of an account
    async fn get_presence(&self, account: &str) -> ApiResult<PresenceStatus>;

    /// Deactivate an account; with `erase` it leaves every room
    async fn deactivate_account(&self, account: &str, erase: bool) -> ApiResult<()>;
}
