// ── Store contracts ──
//
// Two collaborators the core reads and writes through:
//
// - `ProtocolDataStore`: per-network map from `DataKey` to a remote id.
//   A missing key is the only signal that no remote twin exists.
// - `LocalStore`: the local entity graph (companies, applications,
//   device profiles, devices) and their per-network links.
//
// `MemoryStore` implements both.

mod collection;
pub mod keys;
pub mod memory;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{
    Application, ApplicationLink, ApplicationRecord, Company, DevEui, Device, DeviceLink,
    DeviceProfile, DeviceProfileRecord, DeviceRecord, LocalId, NetworkId,
};

pub use keys::{DataKey, EntityKind};
pub use memory::{MemoryStore, ProtocolDataEntry};

/// Durable `(network, key) → value` map.
#[async_trait]
pub trait ProtocolDataStore: Send + Sync {
    async fn upsert(&self, network: &NetworkId, key: &DataKey, value: &str)
    -> Result<(), CoreError>;

    /// `Ok(None)` when the key is absent; `Err` only when the lookup
    /// itself failed.
    async fn load_value(
        &self,
        network: &NetworkId,
        key: &DataKey,
    ) -> Result<Option<String>, CoreError>;

    async fn delete_key(&self, network: &NetworkId, key: &DataKey) -> Result<(), CoreError>;
}

/// Local entity storage consumed by pull and push.
#[async_trait]
pub trait LocalStore: Send + Sync {
    // ── Companies ────────────────────────────────────────────────────
    async fn create_company(&self, name: &str) -> Result<Company, CoreError>;
    async fn get_company(&self, id: LocalId) -> Result<Option<Company>, CoreError>;
    async fn list_companies(&self) -> Result<Vec<Company>, CoreError>;

    // ── Applications ─────────────────────────────────────────────────
    async fn create_application(
        &self,
        company_id: LocalId,
        application: Application,
    ) -> Result<ApplicationRecord, CoreError>;
    async fn get_application(&self, id: LocalId) -> Result<Option<ApplicationRecord>, CoreError>;
    async fn find_application_by_name(
        &self,
        company_id: LocalId,
        name: &str,
    ) -> Result<Option<ApplicationRecord>, CoreError>;
    async fn list_applications(&self) -> Result<Vec<ApplicationRecord>, CoreError>;

    // ── Device profiles ──────────────────────────────────────────────
    async fn create_device_profile(
        &self,
        company_id: LocalId,
        profile: DeviceProfile,
    ) -> Result<DeviceProfileRecord, CoreError>;
    async fn get_device_profile(
        &self,
        id: LocalId,
    ) -> Result<Option<DeviceProfileRecord>, CoreError>;
    async fn find_device_profile_by_name(
        &self,
        company_id: LocalId,
        name: &str,
    ) -> Result<Option<DeviceProfileRecord>, CoreError>;
    async fn list_device_profiles(&self) -> Result<Vec<DeviceProfileRecord>, CoreError>;

    // ── Devices ──────────────────────────────────────────────────────
    async fn create_device(
        &self,
        application_id: LocalId,
        device: Device,
    ) -> Result<DeviceRecord, CoreError>;
    async fn get_device(&self, id: LocalId) -> Result<Option<DeviceRecord>, CoreError>;
    async fn find_device_by_dev_eui(
        &self,
        dev_eui: &DevEui,
    ) -> Result<Option<DeviceRecord>, CoreError>;
    /// Devices of one application, or every device when `None`.
    async fn list_devices(
        &self,
        application_id: Option<LocalId>,
    ) -> Result<Vec<DeviceRecord>, CoreError>;

    // ── Network links ────────────────────────────────────────────────
    async fn create_application_link(
        &self,
        application_id: LocalId,
        network_id: &NetworkId,
        settings: Application,
    ) -> Result<ApplicationLink, CoreError>;
    async fn find_application_link(
        &self,
        application_id: LocalId,
        network_id: &NetworkId,
    ) -> Result<Option<ApplicationLink>, CoreError>;
    async fn list_application_links(
        &self,
        network_id: &NetworkId,
    ) -> Result<Vec<ApplicationLink>, CoreError>;

    async fn create_device_link(
        &self,
        device_id: LocalId,
        network_id: &NetworkId,
        device_profile_id: LocalId,
        settings: Device,
    ) -> Result<DeviceLink, CoreError>;
    async fn find_device_link(
        &self,
        device_id: LocalId,
        network_id: &NetworkId,
    ) -> Result<Option<DeviceLink>, CoreError>;
    async fn list_device_links(&self, network_id: &NetworkId)
    -> Result<Vec<DeviceLink>, CoreError>;
}
