// ── In-memory store ──
//
// `DashMap`-backed implementation of both store contracts, with an
// optional JSON snapshot so the CLI can keep state between runs.
// Concurrent upserts to the protocol data map are last-writer-wins.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::collection::RecordTable;
use super::{DataKey, LocalStore, ProtocolDataStore};
use crate::error::CoreError;
use crate::model::{
    Application, ApplicationLink, ApplicationRecord, Company, DevEui, Device, DeviceLink,
    DeviceProfile, DeviceProfileRecord, DeviceRecord, LocalId, NetworkId, ReportingProtocol,
};

/// One protocol-data row, as persisted in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDataEntry {
    pub network_id: NetworkId,
    pub data_key: String,
    pub value: String,
}

#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    #[serde(default)]
    companies: Vec<Company>,
    #[serde(default)]
    applications: Vec<ApplicationRecord>,
    #[serde(default)]
    device_profiles: Vec<DeviceProfileRecord>,
    #[serde(default)]
    devices: Vec<DeviceRecord>,
    #[serde(default)]
    application_links: Vec<ApplicationLink>,
    #[serde(default)]
    device_links: Vec<DeviceLink>,
    #[serde(default)]
    protocol_data: Vec<ProtocolDataEntry>,
}

pub struct MemoryStore {
    next_id: AtomicU64,
    companies: RecordTable<Company>,
    applications: RecordTable<ApplicationRecord>,
    device_profiles: RecordTable<DeviceProfileRecord>,
    devices: RecordTable<DeviceRecord>,
    application_links: RecordTable<ApplicationLink>,
    device_links: RecordTable<DeviceLink>,
    protocol_data: DashMap<(NetworkId, String), String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            companies: RecordTable::new(),
            applications: RecordTable::new(),
            device_profiles: RecordTable::new(),
            devices: RecordTable::new(),
            application_links: RecordTable::new(),
            device_links: RecordTable::new(),
            protocol_data: DashMap::new(),
        }
    }

    fn allocate_id(&self) -> LocalId {
        LocalId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Load a snapshot; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::new());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| CoreError::Store {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| CoreError::Store {
            message: format!("corrupt state file {}: {e}", path.display()),
        })?;

        let store = Self::new();
        store.next_id.store(snapshot.next_id.max(1), Ordering::Relaxed);
        for row in snapshot.companies {
            store.companies.upsert(row.id, row);
        }
        for row in snapshot.applications {
            store.applications.upsert(row.id, row);
        }
        for row in snapshot.device_profiles {
            store.device_profiles.upsert(row.id, row);
        }
        for row in snapshot.devices {
            store.devices.upsert(row.id, row);
        }
        for row in snapshot.application_links {
            store.application_links.upsert(row.id, row);
        }
        for row in snapshot.device_links {
            store.device_links.upsert(row.id, row);
        }
        for entry in snapshot.protocol_data {
            store
                .protocol_data
                .insert((entry.network_id, entry.data_key), entry.value);
        }
        Ok(store)
    }

    /// Write the whole store as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let snapshot = Snapshot {
            next_id: self.next_id.load(Ordering::Relaxed),
            companies: unwrap_rows(self.companies.snapshot()),
            applications: unwrap_rows(self.applications.snapshot()),
            device_profiles: unwrap_rows(self.device_profiles.snapshot()),
            devices: unwrap_rows(self.devices.snapshot()),
            application_links: unwrap_rows(self.application_links.snapshot()),
            device_links: unwrap_rows(self.device_links.snapshot()),
            protocol_data: self.protocol_entries(None),
        };

        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| CoreError::Store {
            message: format!("cannot serialize state: {e}"),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::Store {
                message: format!("cannot create {}: {e}", parent.display()),
            })?;
        }
        std::fs::write(path, json).map_err(|e| CoreError::Store {
            message: format!("cannot write {}: {e}", path.display()),
        })
    }

    /// Protocol-data rows, for one network or all, sorted by key.
    pub fn protocol_entries(&self, network: Option<&NetworkId>) -> Vec<ProtocolDataEntry> {
        let mut entries: Vec<ProtocolDataEntry> = self
            .protocol_data
            .iter()
            .filter(|r| network.is_none_or(|n| &r.key().0 == n))
            .map(|r| ProtocolDataEntry {
                network_id: r.key().0.clone(),
                data_key: r.key().1.clone(),
                value: r.value().clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            (&a.network_id, &a.data_key).cmp(&(&b.network_id, &b.data_key))
        });
        entries
    }
}

fn unwrap_rows<T: Clone>(rows: Vec<std::sync::Arc<T>>) -> Vec<T> {
    rows.into_iter().map(|r| (*r).clone()).collect()
}

// ── Protocol data ───────────────────────────────────────────────────

#[async_trait]
impl ProtocolDataStore for MemoryStore {
    async fn upsert(
        &self,
        network: &NetworkId,
        key: &DataKey,
        value: &str,
    ) -> Result<(), CoreError> {
        debug!(network = %network, key = %key, value, "protocol data upsert");
        self.protocol_data
            .insert((network.clone(), key.as_str().to_owned()), value.to_owned());
        Ok(())
    }

    async fn load_value(
        &self,
        network: &NetworkId,
        key: &DataKey,
    ) -> Result<Option<String>, CoreError> {
        Ok(self
            .protocol_data
            .get(&(network.clone(), key.as_str().to_owned()))
            .map(|v| v.value().clone()))
    }

    async fn delete_key(&self, network: &NetworkId, key: &DataKey) -> Result<(), CoreError> {
        self.protocol_data
            .remove(&(network.clone(), key.as_str().to_owned()));
        Ok(())
    }
}

// ── Local entities ──────────────────────────────────────────────────

#[async_trait]
impl LocalStore for MemoryStore {
    async fn create_company(&self, name: &str) -> Result<Company, CoreError> {
        let company = Company {
            id: self.allocate_id(),
            name: name.to_owned(),
        };
        self.companies.upsert(company.id, company.clone());
        Ok(company)
    }

    async fn get_company(&self, id: LocalId) -> Result<Option<Company>, CoreError> {
        Ok(self.companies.get(id).map(|c| (*c).clone()))
    }

    async fn list_companies(&self) -> Result<Vec<Company>, CoreError> {
        Ok(unwrap_rows(self.companies.snapshot()))
    }

    async fn create_application(
        &self,
        company_id: LocalId,
        application: Application,
    ) -> Result<ApplicationRecord, CoreError> {
        let record = ApplicationRecord {
            id: self.allocate_id(),
            company_id,
            reporting_protocol: ReportingProtocol::default(),
            application,
        };
        self.applications.upsert(record.id, record.clone());
        Ok(record)
    }

    async fn get_application(&self, id: LocalId) -> Result<Option<ApplicationRecord>, CoreError> {
        Ok(self.applications.get(id).map(|r| (*r).clone()))
    }

    async fn find_application_by_name(
        &self,
        company_id: LocalId,
        name: &str,
    ) -> Result<Option<ApplicationRecord>, CoreError> {
        Ok(self
            .applications
            .find(|r| r.company_id == company_id && r.application.name == name)
            .map(|r| (*r).clone()))
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationRecord>, CoreError> {
        Ok(unwrap_rows(self.applications.snapshot()))
    }

    async fn create_device_profile(
        &self,
        company_id: LocalId,
        profile: DeviceProfile,
    ) -> Result<DeviceProfileRecord, CoreError> {
        let record = DeviceProfileRecord {
            id: self.allocate_id(),
            company_id,
            profile,
        };
        self.device_profiles.upsert(record.id, record.clone());
        Ok(record)
    }

    async fn get_device_profile(
        &self,
        id: LocalId,
    ) -> Result<Option<DeviceProfileRecord>, CoreError> {
        Ok(self.device_profiles.get(id).map(|r| (*r).clone()))
    }

    async fn find_device_profile_by_name(
        &self,
        company_id: LocalId,
        name: &str,
    ) -> Result<Option<DeviceProfileRecord>, CoreError> {
        Ok(self
            .device_profiles
            .find(|r| r.company_id == company_id && r.profile.name == name)
            .map(|r| (*r).clone()))
    }

    async fn list_device_profiles(&self) -> Result<Vec<DeviceProfileRecord>, CoreError> {
        Ok(unwrap_rows(self.device_profiles.snapshot()))
    }

    async fn create_device(
        &self,
        application_id: LocalId,
        device: Device,
    ) -> Result<DeviceRecord, CoreError> {
        if self
            .devices
            .find(|r| r.device.dev_eui == device.dev_eui)
            .is_some()
        {
            return Err(CoreError::validation(format!(
                "a device with DevEUI {} already exists",
                device.dev_eui
            )));
        }
        let record = DeviceRecord {
            id: self.allocate_id(),
            application_id,
            device,
        };
        self.devices.upsert(record.id, record.clone());
        Ok(record)
    }

    async fn get_device(&self, id: LocalId) -> Result<Option<DeviceRecord>, CoreError> {
        Ok(self.devices.get(id).map(|r| (*r).clone()))
    }

    async fn find_device_by_dev_eui(
        &self,
        dev_eui: &DevEui,
    ) -> Result<Option<DeviceRecord>, CoreError> {
        Ok(self
            .devices
            .find(|r| &r.device.dev_eui == dev_eui)
            .map(|r| (*r).clone()))
    }

    async fn list_devices(
        &self,
        application_id: Option<LocalId>,
    ) -> Result<Vec<DeviceRecord>, CoreError> {
        Ok(unwrap_rows(self.devices.filter(|r| {
            application_id.is_none_or(|app| r.application_id == app)
        })))
    }

    async fn create_application_link(
        &self,
        application_id: LocalId,
        network_id: &NetworkId,
        settings: Application,
    ) -> Result<ApplicationLink, CoreError> {
        let link = ApplicationLink {
            id: self.allocate_id(),
            application_id,
            network_id: network_id.clone(),
            settings,
        };
        self.application_links.upsert(link.id, link.clone());
        Ok(link)
    }

    async fn find_application_link(
        &self,
        application_id: LocalId,
        network_id: &NetworkId,
    ) -> Result<Option<ApplicationLink>, CoreError> {
        Ok(self
            .application_links
            .find(|l| l.application_id == application_id && &l.network_id == network_id)
            .map(|l| (*l).clone()))
    }

    async fn list_application_links(
        &self,
        network_id: &NetworkId,
    ) -> Result<Vec<ApplicationLink>, CoreError> {
        Ok(unwrap_rows(
            self.application_links
                .filter(|l| &l.network_id == network_id),
        ))
    }

    async fn create_device_link(
        &self,
        device_id: LocalId,
        network_id: &NetworkId,
        device_profile_id: LocalId,
        settings: Device,
    ) -> Result<DeviceLink, CoreError> {
        let link = DeviceLink {
            id: self.allocate_id(),
            device_id,
            network_id: network_id.clone(),
            device_profile_id,
            settings,
        };
        self.device_links.upsert(link.id, link.clone());
        Ok(link)
    }

    async fn find_device_link(
        &self,
        device_id: LocalId,
        network_id: &NetworkId,
    ) -> Result<Option<DeviceLink>, CoreError> {
        Ok(self
            .device_links
            .find(|l| l.device_id == device_id && &l.network_id == network_id)
            .map(|l| (*l).clone()))
    }

    async fn list_device_links(
        &self,
        network_id: &NetworkId,
    ) -> Result<Vec<DeviceLink>, CoreError> {
        Ok(unwrap_rows(
            self.device_links.filter(|l| &l.network_id == network_id),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::EntityKind;

    fn net(name: &str) -> NetworkId {
        NetworkId::new(name)
    }

    #[tokio::test]
    async fn missing_key_is_none_not_error() {
        let store = MemoryStore::new();
        let key = DataKey::remote_id(EntityKind::Application, LocalId(1));
        assert_eq!(store.load_value(&net("cs"), &key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_are_scoped_per_network() {
        let store = MemoryStore::new();
        let key = DataKey::remote_id(EntityKind::Application, LocalId(1));
        store.upsert(&net("cs"), &key, "12").await.unwrap();

        assert_eq!(
            store.load_value(&net("cs"), &key).await.unwrap().as_deref(),
            Some("12")
        );
        assert_eq!(store.load_value(&net("ttn"), &key).await.unwrap(), None);

        store.delete_key(&net("cs"), &key).await.unwrap();
        assert_eq!(store.load_value(&net("cs"), &key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_dev_eui_is_rejected() {
        let store = MemoryStore::new();
        let eui = DevEui::new("0004a30b001c0530").unwrap();
        store
            .create_device(LocalId(1), Device::new(eui.clone(), "a"))
            .await
            .unwrap();
        let err = store
            .create_device(LocalId(1), Device::new(eui, "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("lorasync.json");

        let store = MemoryStore::new();
        let co = store.create_company("Acme Corp").await.unwrap();
        let app = store
            .create_application(
                co.id,
                Application {
                    name: "Acme".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .create_application_link(app.id, &net("cs"), app.application.clone())
            .await
            .unwrap();
        store
            .upsert(
                &net("cs"),
                &DataKey::remote_id(EntityKind::Application, app.id),
                "42",
            )
            .await
            .unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.list_companies().await.unwrap(), vec![co]);
        assert!(
            loaded
                .find_application_link(app.id, &net("cs"))
                .await
                .unwrap()
                .is_some()
        );
        assert_eq!(loaded.protocol_entries(None).len(), 1);

        // ids keep increasing after a reload
        let next = loaded.create_company("Other").await.unwrap();
        assert!(next.id > app.id);
    }

    #[test]
    fn missing_state_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.protocol_entries(None).is_empty());
    }
}
