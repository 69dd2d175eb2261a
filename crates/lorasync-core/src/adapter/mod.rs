// ── Network protocol adapters ──
//
// One async trait over every backend family. Adapters own a transport
// client and a translation table; they never write the local store or
// protocol data, and read them only in `restore`. The sync engine and
// the CLI only ever see `Arc<dyn NetworkProtocol>`.

mod chirpstack;
pub mod integration;
mod ip;
mod ttn;

use std::sync::Arc;

use async_trait::async_trait;
use lorasync_api::TransportConfig;

use crate::error::CoreError;
use crate::model::{
    Application, Device, DeviceProfile, DownlinkArgs, LocalId, Network, ProtocolKind, RemoteId,
    Uplink,
};
use crate::router::UplinkRouter;
use crate::store::{LocalStore, ProtocolDataStore};

pub use chirpstack::{ChirpStackAdapter, ChirpStackVersion};
pub use integration::IntegrationTarget;
pub use ip::IpAdapter;
pub use ttn::{TTN_ACCOUNT_URL, TtnAdapter};

/// A canonical entity together with the id the network server knows it by.
#[derive(Debug, Clone, PartialEq)]
pub struct Remote<T> {
    pub id: RemoteId,
    pub entity: T,
}

impl<T> Remote<T> {
    pub fn new(id: impl Into<RemoteId>, entity: T) -> Self {
        Self {
            id: id.into(),
            entity,
        }
    }
}

/// A remote device with the profile it runs under. For backends
/// without profiles the profile is synthesized and `profile_id` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDevice {
    pub id: RemoteId,
    pub device: Device,
    pub profile: DeviceProfile,
    pub profile_id: Option<RemoteId>,
}

/// Relationships a device is created or updated under.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub local_id: LocalId,
    pub application_id: RemoteId,
    /// Required by backends with native device profiles.
    pub profile_id: Option<RemoteId>,
    pub profile: DeviceProfile,
}

impl DeviceContext {
    pub(crate) fn require_profile_id(&self, network: &Network) -> Result<&RemoteId, CoreError> {
        self.profile_id.as_ref().ok_or_else(|| CoreError::MappingNotFound {
            network: network.id.to_string(),
            key: format!("device profile {:?}", self.profile.name),
        })
    }
}

/// Capability set every network-server backend exposes.
#[async_trait]
pub trait NetworkProtocol: Send + Sync {
    fn protocol(&self) -> ProtocolKind;

    /// Whether device profiles are a first-class remote resource.
    fn has_native_profiles(&self) -> bool {
        self.protocol().has_device_profiles()
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Check credentials are present and establish a session. No retries.
    async fn connect(&self, network: &Network) -> Result<(), CoreError>;

    /// One cheap read proving the server is reachable.
    async fn test(&self, network: &Network) -> Result<(), CoreError>;

    /// Rebuild in-process state from the mappings recorded by earlier
    /// runs. Backends that keep everything remote have nothing to do.
    async fn restore(
        &self,
        _network: &Network,
        _locals: &dyn LocalStore,
        _data: &dyn ProtocolDataStore,
    ) -> Result<(), CoreError> {
        Ok(())
    }

    // ── Applications ─────────────────────────────────────────────────

    async fn list_applications(
        &self,
        network: &Network,
    ) -> Result<Vec<Remote<Application>>, CoreError>;

    async fn get_application(
        &self,
        network: &Network,
        id: &RemoteId,
    ) -> Result<Application, CoreError>;

    /// Existence check that turns a remote not-found into `false`.
    async fn application_exists(&self, network: &Network, id: &RemoteId) -> Result<bool, CoreError> {
        match self.get_application(network, id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_application(
        &self,
        network: &Network,
        local_id: LocalId,
        application: &Application,
    ) -> Result<RemoteId, CoreError>;

    async fn update_application(
        &self,
        network: &Network,
        id: &RemoteId,
        application: &Application,
    ) -> Result<(), CoreError>;

    /// Delete; an application that is already gone is not an error.
    async fn remove_application(&self, network: &Network, id: &RemoteId) -> Result<(), CoreError>;

    /// Install or refresh the uplink integration. Idempotent.
    async fn start_application(
        &self,
        network: &Network,
        id: &RemoteId,
        target: &IntegrationTarget,
    ) -> Result<(), CoreError>;

    /// Remove the uplink integration; an absent one is not an error.
    async fn stop_application(&self, network: &Network, id: &RemoteId) -> Result<(), CoreError>;

    // ── Device profiles ──────────────────────────────────────────────

    /// Profiles visible to the network, optionally only those usable by
    /// one application.
    async fn list_device_profiles(
        &self,
        network: &Network,
        application_id: Option<&RemoteId>,
    ) -> Result<Vec<Remote<DeviceProfile>>, CoreError>;

    async fn get_device_profile(
        &self,
        network: &Network,
        id: &RemoteId,
    ) -> Result<DeviceProfile, CoreError>;

    async fn create_device_profile(
        &self,
        network: &Network,
        local_id: LocalId,
        profile: &DeviceProfile,
    ) -> Result<RemoteId, CoreError>;

    async fn update_device_profile(
        &self,
        network: &Network,
        id: &RemoteId,
        profile: &DeviceProfile,
    ) -> Result<(), CoreError>;

    async fn remove_device_profile(
        &self,
        network: &Network,
        id: &RemoteId,
    ) -> Result<(), CoreError>;

    // ── Devices ──────────────────────────────────────────────────────

    async fn list_devices(
        &self,
        network: &Network,
        application_id: &RemoteId,
    ) -> Result<Vec<RemoteDevice>, CoreError>;

    /// Create the device and its credentials.
    async fn create_device(
        &self,
        network: &Network,
        ctx: &DeviceContext,
        device: &Device,
    ) -> Result<RemoteId, CoreError>;

    async fn update_device(
        &self,
        network: &Network,
        id: &RemoteId,
        ctx: &DeviceContext,
        device: &Device,
    ) -> Result<(), CoreError>;

    async fn remove_device(
        &self,
        network: &Network,
        application_id: &RemoteId,
        id: &RemoteId,
    ) -> Result<(), CoreError>;

    /// Queue a downlink. An unknown device is `CoreError::NotFound`.
    async fn pass_data_to_device(
        &self,
        network: &Network,
        args: &DownlinkArgs,
    ) -> Result<(), CoreError>;

    // ── Uplinks ──────────────────────────────────────────────────────

    /// Decode an ingest body delivered by this backend.
    fn normalize_uplink(
        &self,
        network: &Network,
        application_id: LocalId,
        body: &serde_json::Value,
    ) -> Result<Uplink, CoreError>;

    /// Normalize an ingest body and route it: correlated uplinks resolve
    /// their pending downlink, the rest go to application delivery.
    async fn handle_uplink(
        &self,
        network: &Network,
        application_id: LocalId,
        body: &serde_json::Value,
        router: &UplinkRouter,
    ) -> Result<(), CoreError> {
        let uplink = self.normalize_uplink(network, application_id, body)?;
        router.dispatch_uplink(uplink).await
    }
}

/// Build the adapter for a network's protocol.
pub fn adapter_for(
    network: &Network,
    transport: &TransportConfig,
) -> Result<Arc<dyn NetworkProtocol>, CoreError> {
    Ok(match network.protocol {
        ProtocolKind::ChirpStackV1 => Arc::new(ChirpStackAdapter::from_network(
            network,
            ChirpStackVersion::V1,
            transport,
        )?),
        ProtocolKind::ChirpStackV2 => Arc::new(ChirpStackAdapter::from_network(
            network,
            ChirpStackVersion::V2,
            transport,
        )?),
        ProtocolKind::TtnV2 => Arc::new(TtnAdapter::from_network(network, transport)?),
        ProtocolKind::GenericIp => Arc::new(IpAdapter::new()),
    })
}

/// Map a not-found into `Ok(())`; used where "already gone" is success.
pub(crate) fn ignore_not_found(result: Result<(), lorasync_api::Error>) -> Result<(), CoreError> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other.map_err(CoreError::from),
    }
}

/// Map a remote not-found on a device call into a `NotFound` naming the device.
pub(crate) fn unknown_device(err: lorasync_api::Error, device_id: &RemoteId) -> CoreError {
    if err.is_not_found() {
        CoreError::not_found("device", device_id)
    } else {
        err.into()
    }
}

/// Classify a failed reachability check: credential and transport
/// failures keep their kind, anything else means the server is not
/// answering like a network server should.
pub(crate) fn reachability_error(network: &Network, err: lorasync_api::Error) -> CoreError {
    let err = CoreError::from(err);
    if err.is_fatal() {
        err
    } else {
        CoreError::Connectivity {
            url: network
                .base_url
                .as_ref()
                .map_or_else(String::new, ToString::to_string),
            reason: err.to_string(),
        }
    }
}
