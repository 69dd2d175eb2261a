// ── Network domain types ──

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use super::ids::NetworkId;

/// Protocol family and API generation of a network server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProtocolKind {
    #[strum(serialize = "chirpstack-v1")]
    #[serde(rename = "chirpstack-v1")]
    ChirpStackV1,
    #[strum(serialize = "chirpstack-v2")]
    #[serde(rename = "chirpstack-v2")]
    ChirpStackV2,
    #[strum(serialize = "ttn-v2")]
    #[serde(rename = "ttn-v2")]
    TtnV2,
    GenericIp,
}

impl ProtocolKind {
    /// Whether the backend has device profiles as a first-class resource.
    pub fn has_device_profiles(self) -> bool {
        matches!(self, Self::ChirpStackV1 | Self::ChirpStackV2)
    }
}

/// Relationship ids the network itself is configured with. Entities
/// pushed to this network must agree with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub organization_id: Option<String>,
    pub service_profile_id: Option<String>,
    pub network_server_id: Option<String>,
    /// TTN handler id, e.g. `ttn-handler-eu`.
    pub handler_id: Option<String>,
}

/// Credential bundle for a network (`securityData`).
#[derive(Debug, Clone, Default)]
pub struct SecurityData {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub access_token: Option<SecretString>,
    /// Shared secret the network server presents when delivering uplinks.
    pub uplink_api_key: Option<SecretString>,
}

/// One configured network-server instance.
#[derive(Debug, Clone)]
pub struct Network {
    pub id: NetworkId,
    pub name: String,
    pub protocol: ProtocolKind,
    /// Application server (ChirpStack) or account server (TTN) root.
    pub base_url: Option<Url>,
    /// TTN handler root; unused by other protocols.
    pub handler_url: Option<Url>,
    pub security: SecurityData,
    pub settings: NetworkSettings,
    pub uplink_subscribed: bool,
}

impl Network {
    /// A network with no endpoint, credentials or settings.
    pub fn new(id: impl Into<String>, protocol: ProtocolKind) -> Self {
        let id = NetworkId::new(id);
        Self {
            name: id.to_string(),
            id,
            protocol,
            base_url: None,
            handler_url: None,
            security: SecurityData::default(),
            settings: NetworkSettings::default(),
            uplink_subscribed: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn protocol_kind_round_trips_through_strings() {
        for kind in [
            ProtocolKind::ChirpStackV1,
            ProtocolKind::ChirpStackV2,
            ProtocolKind::TtnV2,
            ProtocolKind::GenericIp,
        ] {
            let s = kind.to_string();
            assert_eq!(s.parse::<ProtocolKind>().unwrap(), kind);
        }
        assert_eq!(ProtocolKind::GenericIp.to_string(), "generic-ip");
        assert_eq!(ProtocolKind::ChirpStackV2.to_string(), "chirpstack-v2");
    }
}
