//! In-memory homeserver for testing
//!
//! Rooms, members and presence replies are scripted up front; every call is
//! counted so tests can assert on remote load.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{AccountId, ApiError, ApiResult, ChatServerApi, Presence, PresenceStatus, RoomId};

#[derive(Debug, Default)]
struct MockState {
    aliases: HashMap<String, RoomId>,
    unreachable_aliases: HashSet<String>,
    members: HashMap<RoomId, Vec<AccountId>>,
    presence: HashMap<AccountId, PresenceStatus>,
    failing_deactivations: HashSet<AccountId>,
    deactivated: Vec<AccountId>,
    calls: CallCounts,
}

/// Number of calls seen per endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub resolve: usize,
    pub members: usize,
    pub presence: usize,
    pub deactivate: usize,
}

/// Scriptable homeserver
#[derive(Debug, Clone)]
pub struct MockChatServer {
    server_name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockChatServer {
    pub fn new(server_name: &str) -> Self {
        Self {
            server_name: server_name.to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Register a room under `#alias:server` with the given members
    pub fn add_room(&self, alias: &str, room_id: &str, members: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state
            .aliases
            .insert(format!("#{}:{}", alias, self.server_name), room_id.to_string());
        state.members.insert(
            room_id.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    /// Make alias resolution fail with a transport error
    pub fn break_alias(&self, alias: &str) {
        self.state
            .lock()
            .unwrap()
            .unreachable_aliases
            .insert(format!("#{}:{}", alias, self.server_name));
    }

    /// Script the presence reply for an account; unscripted accounts fail
    pub fn set_presence(&self, account: &str, presence: Presence, last_active_ago_ms: Option<u64>) {
        self.state.lock().unwrap().presence.insert(
            account.to_string(),
            PresenceStatus::new(presence, last_active_ago_ms),
        );
    }

    pub fn fail_deactivation(&self, account: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_deactivations
            .insert(account.to_string());
    }

    pub fn deactivated(&self) -> Vec<AccountId> {
        self.state.lock().unwrap().deactivated.clone()
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl ChatServerApi for MockChatServer {
    fn server_name(&self) -> &str {
        &self.server_name
    }

    async fn resolve_room_alias(&self, alias: &str) -> ApiResult<RoomId> {
        let mut state = self.state.lock().unwrap();
        state.calls.resolve += 1;
        if state.unreachable_aliases.contains(alias) {
            return Err(ApiError::Transport(format!("{}: connection reset", alias)));
        }
        state
            .aliases
            .get(alias)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(alias.to_string()))
    }

    async fn list_room_members(&self, room_id: &str) -> ApiResult<Vec<AccountId>> {
        let mut state = self.state.lock().unwrap();
        state.calls.members += 1;
        state
            .members
            .get(room_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(room_id.to_string()))
    }

    async fn get_presence(&self, account: &str) -> ApiResult<PresenceStatus> {
        let mut state = self.state.lock().unwrap();
        state.calls.presence += 1;
        state.presence.get(account).cloned().ok_or_else(|| ApiError::Server {
            status: 500,
            errcode: "M_UNKNOWN".to_string(),
            message: format!("presence lookup failed for {}", account),
        })
    }

    async fn deactivate_account(&self, account: &str, _erase: bool) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.deactivate += 1;
        if state.failing_deactivations.contains(account) {
            return Err(ApiError::Timeout(account.to_string()));
        }
        state.deactivated.push(account.to_string());
        state.presence.remove(account);
        for members in state.members.values_mut() {
            members.retain(|m| m != account);
        }
        Ok(())
    }
}
