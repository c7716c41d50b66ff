/*!
 * Discovery room membership -> ledger
 */

use crate::api::{ApiResult, ChatServerApi};
use crate::config::PurgerConfig;

use super::{AccountActivity, CallGate, RoomHandle, Thresholds};

pub struct MembershipSync<'a> {
    api: &'a dyn ChatServerApi,
    gate: &'a CallGate,
    thresholds: Thresholds,
    admin_prefix: &'a str,
}

impl<'a> MembershipSync<'a> {
    pub fn new(api: &'a dyn ChatServerApi, gate: &'a CallGate, config: &'a PurgerConfig) -> Self {
        Self {
            api,
            gate,
            thresholds: Thresholds::from_config(config),
            admin_prefix: &config.admin_prefix,
        }
    }

    /// Insert every local, non-admin member not yet in `segment`.
    ///
    /// New accounts start one second past the deadline so the next probe
    /// stage checks them. Known accounts are never touched. Returns the
    /// number of accounts added.
    pub async fn sync(
        &self,
        room: &RoomHandle,
        segment: &mut AccountActivity,
        now: i64,
    ) -> ApiResult<usize> {
        let members = self
            .gate
            .paced(|| self.api.list_room_members(&room.room_id))
            .await?;

        let fresh_last_seen = self.thresholds.fresh_last_seen(now);
        let mut added = 0;
        for member in members {
            if !self.is_tracked(&member, &room.server_name) {
                continue;
            }
            if !segment.contains_key(&member) {
                segment.insert(member, fresh_last_seen);
                added += 1;
            }
        }

        tracing::info!(
            room = %room.local_alias(),
            added,
            known = segment.len(),
            "Fetched discovery room members"
        );
        Ok(added)
    }

    /// Homed on `server_name` and not an administrative account
    fn is_tracked(&self, member: &str, server_name: &str) -> bool {
        let homed_here = member
            .split_once(':')
            .is_some_and(|(_, server)| server == server_name);
        homed_here && !member.starts_with(self.admin_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockChatServer;
    use std::time::Duration;

    const NOW: i64 = 1_700_000_000;
    const SERVER: &str = "server.org";

    fn room() -> RoomHandle {
        RoomHandle {
            room_id: "!disc:server.org".to_string(),
            alias: "raiden_mainnet_discovery".to_string(),
            server_name: SERVER.to_string(),
        }
    }

    fn config() -> PurgerConfig {
        PurgerConfig {
            inactivity_threshold_secs: 3600,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sync_filters_remote_and_admin_accounts() {
        let api = MockChatServer::new(SERVER);
        api.add_room(
            "raiden_mainnet_discovery",
            "!disc:server.org",
            &["@a:server.org", "@b:other.org", "@admin:server.org", "@c:server.org"],
        );
        let gate = CallGate::new(Duration::ZERO);
        let config = config();
        let sync = MembershipSync::new(&api, &gate, &config);

        let mut segment = AccountActivity::new();
        let added = sync.sync(&room(), &mut segment, NOW).await.unwrap();

        assert_eq!(added, 2);
        assert_eq!(segment.len(), 2);
        assert_eq!(segment.get("@a:server.org"), Some(&(NOW - 3600 - 1)));
        assert_eq!(segment.get("@c:server.org"), Some(&(NOW - 3600 - 1)));
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let api = MockChatServer::new(SERVER);
        api.add_room(
            "raiden_mainnet_discovery",
            "!disc:server.org",
            &["@a:server.org", "@b:server.org"],
        );
        let gate = CallGate::new(Duration::ZERO);
        let config = config();
        let sync = MembershipSync::new(&api, &gate, &config);

        let mut segment = AccountActivity::new();
        segment.insert("@a:server.org".to_string(), NOW - 5);
        sync.sync(&room(), &mut segment, NOW).await.unwrap();
        let after_first = segment.clone();

        let added = sync.sync(&room(), &mut segment, NOW + 60).await.unwrap();

        assert_eq!(added, 0);
        assert_eq!(segment, after_first);
        // a known account keeps its observed last-seen
        assert_eq!(segment.get("@a:server.org"), Some(&(NOW - 5)));
    }

    #[tokio::test]
    async fn test_sync_propagates_listing_failure() {
        let api = MockChatServer::new(SERVER);
        let gate = CallGate::new(Duration::ZERO);
        let config = config();
        let sync = MembershipSync::new(&api, &gate, &config);

        let mut segment = AccountActivity::new();
        assert!(sync.sync(&room(), &mut segment, NOW).await.is_err());
        assert!(segment.is_empty());
    }
}
