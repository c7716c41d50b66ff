/*!
 * Discovery room lookup per network
 */

use crate::api::{ChatServerApi, RoomId};
use crate::config::PurgerConfig;

use super::CallGate;

/// A discovery room found on the local server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomHandle {
    pub room_id: RoomId,
    /// Alias without sigil and server, e.g. `raiden_mainnet_discovery`
    pub alias: String,
    pub server_name: String,
}

impl RoomHandle {
    pub fn local_alias(&self) -> String {
        local_alias(&self.alias, &self.server_name)
    }
}

/// Outcome of resolving a network's discovery room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(RoomHandle),
    /// The alias does not exist on this server
    NotFound,
    /// The homeserver could not be asked
    TransportError(String),
}

/// Human name of well-known chain ids; other ids are used verbatim
pub fn network_name(network: &str) -> &str {
    match network {
        "1" => "mainnet",
        "3" => "ropsten",
        "4" => "rinkeby",
        "5" => "goerli",
        "42" => "kovan",
        "627" => "smoketest",
        other => other,
    }
}

/// `<prefix>_<network name>_<suffix>`
pub fn room_alias(prefix: &str, network: &str, suffix: &str) -> String {
    format!("{}_{}_{}", prefix, network_name(network), suffix)
}

fn local_alias(alias: &str, server_name: &str) -> String {
    format!("#{}:{}", alias, server_name)
}

pub struct DiscoveryResolver<'a> {
    api: &'a dyn ChatServerApi,
    gate: &'a CallGate,
    room_prefix: &'a str,
    discovery_suffix: &'a str,
}

impl<'a> DiscoveryResolver<'a> {
    pub fn new(api: &'a dyn ChatServerApi, gate: &'a CallGate, config: &'a PurgerConfig) -> Self {
        Self {
            api,
            gate,
            room_prefix: &config.room_prefix,
            discovery_suffix: &config.discovery_suffix,
        }
    }

    pub async fn resolve(&self, network: &str) -> Resolution {
        let alias = room_alias(self.room_prefix, network, self.discovery_suffix);
        let server_name = self.api.server_name().to_string();
        let full_alias = local_alias(&alias, &server_name);

        let result = self
            .gate
            .paced(|| self.api.resolve_room_alias(&full_alias))
            .await;

        match result {
            Ok(room_id) => {
                tracing::debug!(
                    network,
                    alias = %full_alias,
                    room_id = %room_id,
                    "Resolved discovery room"
                );
                Resolution::Resolved(RoomHandle {
                    room_id,
                    alias,
                    server_name,
                })
            }
            Err(e) if e.is_not_found() => Resolution::NotFound,
            Err(e) => Resolution::TransportError(e.to_string()),
        }
    }
}
