// ── Generic-IP adapter ──
//
// No remote server: IP devices post uplinks straight to the ingest
// endpoint and poll for downlinks. Remote ids are derived from local
// ids, and downlinks wait in a per-device queue until fetched. The
// registry of known devices is rebuilt from `dev:` mappings on restore.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::{DeviceContext, IntegrationTarget, NetworkProtocol, Remote, RemoteDevice};
use crate::error::CoreError;
use crate::model::{
    Application, Device, DeviceProfile, Downlink, DownlinkArgs, LocalId, Network, ProtocolKind,
    RemoteId, Uplink,
};
use crate::normalize::ip;
use crate::store::{DataKey, EntityKind, LocalStore, ProtocolDataStore};

#[derive(Default)]
pub struct IpAdapter {
    /// Registered devices and their undelivered downlinks.
    queues: DashMap<RemoteId, Vec<Downlink>>,
}

impl IpAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the downlinks queued for a device.
    pub fn take_downlinks(&self, device_id: &RemoteId) -> Vec<ip::IpDownlink> {
        self.queues
            .get_mut(device_id)
            .map(|mut queue| queue.drain(..).map(|d| ip::downlink_to_wire(&d)).collect())
            .unwrap_or_default()
    }

    pub fn is_registered(&self, device_id: &RemoteId) -> bool {
        self.queues.contains_key(device_id)
    }
}

fn unsupported(operation: &str) -> CoreError {
    CoreError::Unsupported {
        operation: operation.into(),
        protocol: ProtocolKind::GenericIp.to_string(),
    }
}

#[async_trait]
impl NetworkProtocol for IpAdapter {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::GenericIp
    }

    async fn connect(&self, _network: &Network) -> Result<(), CoreError> {
        Ok(())
    }

    async fn test(&self, _network: &Network) -> Result<(), CoreError> {
        Ok(())
    }

    async fn restore(
        &self,
        network: &Network,
        locals: &dyn LocalStore,
        data: &dyn ProtocolDataStore,
    ) -> Result<(), CoreError> {
        let mut restored = 0usize;
        for link in locals.list_device_links(&network.id).await? {
            let key = DataKey::remote_id(EntityKind::Device, link.device_id);
            if let Some(id) = data.load_value(&network.id, &key).await? {
                self.queues.entry(RemoteId::new(id)).or_default();
                restored += 1;
            }
        }
        debug!(network = %network.id, restored, "IP device registry restored");
        Ok(())
    }

    // ── Applications ─────────────────────────────────────────────────

    async fn list_applications(
        &self,
        _network: &Network,
    ) -> Result<Vec<Remote<Application>>, CoreError> {
        Ok(Vec::new())
    }

    async fn get_application(
        &self,
        _network: &Network,
        id: &RemoteId,
    ) -> Result<Application, CoreError> {
        Err(CoreError::not_found("application", id))
    }

    async fn application_exists(&self, _network: &Network, _id: &RemoteId) -> Result<bool, CoreError> {
        Ok(true)
    }

    async fn create_application(
        &self,
        _network: &Network,
        local_id: LocalId,
        _application: &Application,
    ) -> Result<RemoteId, CoreError> {
        Ok(ip::application_remote_id(local_id))
    }

    async fn update_application(
        &self,
        _network: &Network,
        _id: &RemoteId,
        _application: &Application,
    ) -> Result<(), CoreError> {
        Ok(())
    }

    async fn remove_application(&self, _network: &Network, _id: &RemoteId) -> Result<(), CoreError> {
        Ok(())
    }

    async fn start_application(
        &self,
        _network: &Network,
        _id: &RemoteId,
        _target: &IntegrationTarget,
    ) -> Result<(), CoreError> {
        Ok(())
    }

    async fn stop_application(&self, _network: &Network, _id: &RemoteId) -> Result<(), CoreError> {
        Ok(())
    }

    // ── Device profiles ──────────────────────────────────────────────

    async fn list_device_profiles(
        &self,
        _network: &Network,
        _application_id: Option<&RemoteId>,
    ) -> Result<Vec<Remote<DeviceProfile>>, CoreError> {
        Err(unsupported("list device profiles"))
    }

    async fn get_device_profile(
        &self,
        _network: &Network,
        _id: &RemoteId,
    ) -> Result<DeviceProfile, CoreError> {
        Err(unsupported("get device profile"))
    }

    async fn create_device_profile(
        &self,
        _network: &Network,
        _local_id: LocalId,
        _profile: &DeviceProfile,
    ) -> Result<RemoteId, CoreError> {
        Err(unsupported("create device profile"))
    }

    async fn update_device_profile(
        &self,
        _network: &Network,
        _id: &RemoteId,
        _profile: &DeviceProfile,
    ) -> Result<(), CoreError> {
        Err(unsupported("update device profile"))
    }

    async fn remove_device_profile(
        &self,
        _network: &Network,
        _id: &RemoteId,
    ) -> Result<(), CoreError> {
        Err(unsupported("remove device profile"))
    }

    // ── Devices ──────────────────────────────────────────────────────

    async fn list_devices(
        &self,
        _network: &Network,
        _application_id: &RemoteId,
    ) -> Result<Vec<RemoteDevice>, CoreError> {
        Ok(Vec::new())
    }

    async fn create_device(
        &self,
        network: &Network,
        _ctx: &DeviceContext,
        device: &Device,
    ) -> Result<RemoteId, CoreError> {
        let id = ip::device_remote_id(&device.dev_eui);
        self.queues.entry(id.clone()).or_default();
        debug!(network = %network.id, device_id = %id, "IP device registered");
        Ok(id)
    }

    async fn update_device(
        &self,
        _network: &Network,
        id: &RemoteId,
        _ctx: &DeviceContext,
        _device: &Device,
    ) -> Result<(), CoreError> {
        if self.is_registered(id) {
            Ok(())
        } else {
            Err(CoreError::not_found("device", id))
        }
    }

    async fn remove_device(
        &self,
        _network: &Network,
        _application_id: &RemoteId,
        id: &RemoteId,
    ) -> Result<(), CoreError> {
        self.queues.remove(id);
        Ok(())
    }

    async fn pass_data_to_device(
        &self,
        network: &Network,
        args: &DownlinkArgs,
    ) -> Result<(), CoreError> {
        let mut queue = self
            .queues
            .get_mut(&args.device_id)
            .ok_or_else(|| CoreError::not_found("device", &args.device_id))?;
        queue.push(args.downlink.clone());
        debug!(network = %network.id, device_id = %args.device_id, queued = queue.len(), "downlink queued");
        Ok(())
    }

    // ── Uplinks ──────────────────────────────────────────────────────

    fn normalize_uplink(
        &self,
        network: &Network,
        application_id: LocalId,
        body: &serde_json::Value,
    ) -> Result<Uplink, CoreError> {
        ip::uplink_from_wire(&network.id, application_id, body)
    }
}
