// ── Canonical domain model ──
//
// Backend-agnostic representation of applications, device profiles and
// devices. Normalizers translate every wire format into these types.

pub mod application;
pub mod device;
pub mod device_profile;
pub mod ids;
pub mod local;
pub mod network;
pub mod uplink;

// ── Re-exports ──────────────────────────────────────────────────────

pub use application::Application;
pub use device::{Device, DeviceActivation, DeviceCredentials, DeviceKeys};
pub use device_profile::DeviceProfile;
pub use ids::{DevEui, LocalId, NetworkId, RemoteId};
pub use local::{
    ApplicationLink, ApplicationRecord, Company, DeviceLink, DeviceProfileRecord, DeviceRecord,
    ReportingProtocol,
};
pub use network::{Network, NetworkSettings, ProtocolKind, SecurityData};
pub use uplink::{
    Downlink, DownlinkArgs, DownlinkRequest, Uplink, UplinkOutcome, UplinkResult,
};
