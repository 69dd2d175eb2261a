// ── Local store records ──
//
// What the local side persists: entities with their local ids, plus the
// per-network links that carry the normalized remote settings.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::application::Application;
use super::device::Device;
use super::device_profile::DeviceProfile;
use super::ids::{LocalId, NetworkId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: LocalId,
    pub name: String,
}

/// How uplinks are forwarded to the application's `base_url`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReportingProtocol {
    #[default]
    HttpPost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: LocalId,
    pub company_id: LocalId,
    pub reporting_protocol: ReportingProtocol,
    pub application: Application,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfileRecord {
    pub id: LocalId,
    pub company_id: LocalId,
    pub profile: DeviceProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: LocalId,
    pub application_id: LocalId,
    pub device: Device,
}

/// Application ↔ network association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationLink {
    pub id: LocalId,
    pub application_id: LocalId,
    pub network_id: NetworkId,
    pub settings: Application,
}

/// Device ↔ network association, with the profile the device uses there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLink {
    pub id: LocalId,
    pub device_id: LocalId,
    pub network_id: NetworkId,
    pub device_profile_id: LocalId,
    pub settings: Device,
}
