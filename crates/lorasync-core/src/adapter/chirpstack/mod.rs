// ── ChirpStack adapter ──
//
// One transport, two wire dialects. Every operation is written once
// against `Dialect` and dispatched on `ChirpStackVersion`; URLs, auth
// and error handling are shared.

mod dialect;

use std::collections::HashMap;

use async_trait::async_trait;
use lorasync_api::chirpstack::models::{EnqueueResponse, UplinkEvent};
use lorasync_api::{ChirpStackClient, TransportConfig};
use tracing::{debug, info};

use self::dialect::{Credentials, Dialect, V1, V2, row_id};
use super::{
    DeviceContext, IntegrationTarget, NetworkProtocol, Remote, RemoteDevice, ignore_not_found,
    reachability_error, unknown_device,
};
use crate::error::CoreError;
use crate::model::{
    Application, Device, DeviceProfile, DownlinkArgs, LocalId, Network, ProtocolKind, RemoteId,
    Uplink,
};
use crate::normalize::chirpstack_v1;

const PAGE_SIZE: u32 = 100;

/// ChirpStack API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChirpStackVersion {
    /// LoRa App Server 1.x: bare bodies, LoRaWAN 1.0 activation names.
    V1,
    /// Enveloped bodies, LoRaWAN 1.1 activation names.
    V2,
}

pub struct ChirpStackAdapter {
    client: ChirpStackClient,
    version: ChirpStackVersion,
}

impl ChirpStackAdapter {
    pub fn new(client: ChirpStackClient, version: ChirpStackVersion) -> Self {
        Self { client, version }
    }

    pub fn from_network(
        network: &Network,
        version: ChirpStackVersion,
        transport: &TransportConfig,
    ) -> Result<Self, CoreError> {
        let base_url = network.base_url.clone().ok_or_else(|| {
            CoreError::validation(format!("network {} has no base_url", network.id))
        })?;
        Ok(Self::new(ChirpStackClient::new(base_url, transport)?, version))
    }

    pub fn client(&self) -> &ChirpStackClient {
        &self.client
    }

    pub fn version(&self) -> ChirpStackVersion {
        self.version
    }

    // ── Applications ─────────────────────────────────────────────────

    async fn list_applications_as<D: Dialect>(
        &self,
        network: &Network,
    ) -> Result<Vec<Remote<Application>>, CoreError> {
        let org = network.settings.organization_id.as_deref();
        let rows: Vec<D::ApplicationRow> = self
            .client
            .paginate_all(PAGE_SIZE, |offset, limit| {
                self.client.list_applications(org, offset, limit)
            })
            .await?;
        rows.iter().map(D::application_from_row).collect()
    }

    async fn get_application_as<D: Dialect>(&self, id: &RemoteId) -> Result<Application, CoreError> {
        let w: D::Application = self.client.get_application(id.as_str()).await?;
        Ok(D::application_from_wire(&w))
    }

    async fn create_application_as<D: Dialect>(
        &self,
        network: &Network,
        application: &Application,
    ) -> Result<RemoteId, CoreError> {
        let body = D::application_to_wire(application, &network.settings, None)?;
        Ok(RemoteId::new(self.client.create_application(&body).await?))
    }

    async fn update_application_as<D: Dialect>(
        &self,
        network: &Network,
        id: &RemoteId,
        application: &Application,
    ) -> Result<(), CoreError> {
        let body = D::application_to_wire(application, &network.settings, Some(id))?;
        self.client.update_application(id.as_str(), &body).await?;
        Ok(())
    }

    /// PUT the integration; fall back to POST when none is installed yet.
    async fn install_integration_as<D: Dialect>(
        &self,
        application_id: &str,
        target: &IntegrationTarget,
    ) -> Result<(), lorasync_api::Error> {
        let body = D::integration(target, application_id);
        match self
            .client
            .update_http_integration(application_id, &body)
            .await
        {
            Err(e) if e.is_not_found() => {
                debug!(application_id, "no integration installed, creating");
                self.client
                    .create_http_integration(application_id, &body)
                    .await
            }
            other => other,
        }
    }

    // ── Device profiles ──────────────────────────────────────────────

    /// Fetch a full profile; list endpoints omit the MAC settings.
    async fn fetch_profile_as<D: Dialect>(&self, id: &str) -> Result<DeviceProfile, CoreError> {
        let w: D::Profile = self.client.get_device_profile(id).await?;
        Ok(D::profile_from_wire(&w))
    }

    async fn fetch_profile(&self, id: &str) -> Result<DeviceProfile, CoreError> {
        match self.version {
            ChirpStackVersion::V1 => self.fetch_profile_as::<V1>(id).await,
            ChirpStackVersion::V2 => self.fetch_profile_as::<V2>(id).await,
        }
    }

    async fn list_profile_ids_as<D: Dialect>(
        &self,
        network: &Network,
        application_id: Option<&RemoteId>,
    ) -> Result<Vec<RemoteId>, CoreError> {
        let org = network.settings.organization_id.as_deref();
        let app = application_id.map(RemoteId::as_str);
        let rows: Vec<D::ProfileRow> = self
            .client
            .paginate_all(PAGE_SIZE, |offset, limit| {
                self.client.list_device_profiles(org, app, offset, limit)
            })
            .await?;
        rows.iter().map(D::profile_row_id).collect()
    }

    async fn create_device_profile_as<D: Dialect>(
        &self,
        network: &Network,
        profile: &DeviceProfile,
    ) -> Result<RemoteId, CoreError> {
        let body = D::profile_to_wire(profile, &network.settings, None)?;
        Ok(RemoteId::new(self.client.create_device_profile(&body).await?))
    }

    async fn update_device_profile_as<D: Dialect>(
        &self,
        network: &Network,
        id: &RemoteId,
        profile: &DeviceProfile,
    ) -> Result<(), CoreError> {
        let body = D::profile_to_wire(profile, &network.settings, Some(id))?;
        self.client.update_device_profile(id.as_str(), &body).await?;
        Ok(())
    }

    // ── Devices ──────────────────────────────────────────────────────

    async fn list_devices_as<D: Dialect>(
        &self,
        application_id: &RemoteId,
    ) -> Result<Vec<RemoteDevice>, CoreError> {
        let app = application_id.as_str();
        let rows: Vec<D::DeviceRow> = self
            .client
            .paginate_all(PAGE_SIZE, |offset, limit| {
                self.client.list_devices(app, offset, limit)
            })
            .await?;

        let mut profiles: HashMap<RemoteId, DeviceProfile> = HashMap::new();
        let mut devices = Vec::with_capacity(rows.len());
        for row in &rows {
            let profile_id = row_id(D::device_row_profile_id(row), "device profile")?;
            let profile = match profiles.get(&profile_id) {
                Some(p) => p.clone(),
                None => {
                    let p = self.fetch_profile_as::<D>(profile_id.as_str()).await?;
                    profiles.insert(profile_id.clone(), p.clone());
                    p
                }
            };
            let device = self.device_from_row::<D>(row, &profile).await?;
            devices.push(RemoteDevice {
                id: RemoteId::new(device.dev_eui.as_str()),
                device,
                profile,
                profile_id: Some(profile_id),
            });
        }

        debug!(application_id = app, count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Read the credential body matching the profile's join support.
    async fn device_from_row<D: Dialect>(
        &self,
        row: &D::DeviceRow,
        profile: &DeviceProfile,
    ) -> Result<Device, CoreError> {
        let eui = D::device_row_dev_eui(row);
        if profile.supports_join {
            let keys: Option<D::Keys> = optional(self.client.get_device_keys(eui).await)?;
            D::device_from_wire(row, profile, keys.as_ref(), None)
        } else {
            let activation: Option<D::Activation> =
                optional(self.client.get_device_activation(eui).await)?;
            D::device_from_wire(row, profile, None, activation.as_ref())
        }
    }

    /// Create the device, then its credentials. A device left behind by
    /// an earlier attempt that failed on the credentials is keyed by the
    /// same DevEUI, so a conflict here means "already created".
    async fn create_device_as<D: Dialect>(
        &self,
        network: &Network,
        ctx: &DeviceContext,
        device: &Device,
    ) -> Result<RemoteId, CoreError> {
        let profile_id = ctx.require_profile_id(network)?;
        // Reject contradicting credentials before anything is created.
        let credentials = D::credentials_to_wire(device, &ctx.profile)?;

        let body = D::device_to_wire(device, &ctx.application_id, profile_id);
        match self.client.create_device(&body).await {
            Err(e) if e.is_conflict() => {
                debug!(network = %network.id, dev_eui = %device.dev_eui, "device already exists, writing credentials");
            }
            other => other?,
        }
        self.write_credentials::<D>(device, credentials, false).await?;

        info!(network = %network.id, local_id = %ctx.local_id, dev_eui = %device.dev_eui, "device created");
        Ok(RemoteId::new(device.dev_eui.as_str()))
    }

    async fn update_device_as<D: Dialect>(
        &self,
        network: &Network,
        id: &RemoteId,
        ctx: &DeviceContext,
        device: &Device,
    ) -> Result<(), CoreError> {
        let profile_id = ctx.require_profile_id(network)?;
        let credentials = D::credentials_to_wire(device, &ctx.profile)?;
        let body = D::device_to_wire(device, &ctx.application_id, profile_id);
        self.client
            .update_device(id.as_str(), &body)
            .await
            .map_err(|e| unknown_device(e, id))?;
        self.write_credentials::<D>(device, credentials, true).await
    }

    /// Send the credential body for a device that already exists. Keys
    /// that are already set are replaced rather than created twice.
    async fn write_credentials<D: Dialect>(
        &self,
        device: &Device,
        credentials: Option<Credentials<D::Keys, D::Activation>>,
        update: bool,
    ) -> Result<(), CoreError> {
        let eui = device.dev_eui.as_str();
        match credentials {
            Some(Credentials::Keys(body)) if update => {
                self.client.update_device_keys(eui, &body).await?;
            }
            Some(Credentials::Keys(body)) => match self.client.create_device_keys(eui, &body).await {
                Err(e) if e.is_conflict() => {
                    debug!(dev_eui = eui, "device keys already set, replacing");
                    self.client.update_device_keys(eui, &body).await?;
                }
                other => other?,
            },
            Some(Credentials::Activation(body)) => {
                self.client.activate_device(eui, &body).await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn enqueue_as<D: Dialect>(&self, args: &DownlinkArgs) -> Result<Option<u32>, CoreError> {
        let resp: EnqueueResponse = self
            .client
            .enqueue_downlink(args.device_id.as_str(), &D::queue_item(args))
            .await
            .map_err(|e| unknown_device(e, &args.device_id))?;
        Ok(resp.f_cnt)
    }
}

/// A sub-resource that may legitimately be absent.
fn optional<T>(result: Result<T, lorasync_api::Error>) -> Result<Option<T>, CoreError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl NetworkProtocol for ChirpStackAdapter {
    fn protocol(&self) -> ProtocolKind {
        match self.version {
            ChirpStackVersion::V1 => ProtocolKind::ChirpStackV1,
            ChirpStackVersion::V2 => ProtocolKind::ChirpStackV2,
        }
    }

    // ── Session ──────────────────────────────────────────────────────

    async fn connect(&self, network: &Network) -> Result<(), CoreError> {
        let (Some(username), Some(password)) = (
            network.security.username.as_deref(),
            network.security.password.as_ref(),
        ) else {
            return Err(CoreError::Auth {
                message: format!("network {} has no username/password configured", network.id),
            });
        };

        self.client.login(username, password).await?;
        debug!(network = %network.id, "ChirpStack session established");
        Ok(())
    }

    async fn test(&self, network: &Network) -> Result<(), CoreError> {
        let org = network.settings.organization_id.as_deref();
        self.client
            .list_applications::<serde_json::Value>(org, 0, 1)
            .await
            .map(|_| ())
            .map_err(|e| reachability_error(network, e))
    }

    // ── Applications ─────────────────────────────────────────────────

    async fn list_applications(
        &self,
        network: &Network,
    ) -> Result<Vec<Remote<Application>>, CoreError> {
        match self.version {
            ChirpStackVersion::V1 => self.list_applications_as::<V1>(network).await,
            ChirpStackVersion::V2 => self.list_applications_as::<V2>(network).await,
        }
    }

    async fn get_application(
        &self,
        _network: &Network,
        id: &RemoteId,
    ) -> Result<Application, CoreError> {
        match self.version {
            ChirpStackVersion::V1 => self.get_application_as::<V1>(id).await,
            ChirpStackVersion::V2 => self.get_application_as::<V2>(id).await,
        }
    }

    async fn create_application(
        &self,
        network: &Network,
        local_id: LocalId,
        application: &Application,
    ) -> Result<RemoteId, CoreError> {
        let id = match self.version {
            ChirpStackVersion::V1 => self.create_application_as::<V1>(network, application).await,
            ChirpStackVersion::V2 => self.create_application_as::<V2>(network, application).await,
        }?;
        info!(network = %network.id, %local_id, remote_id = %id, name = %application.name, "application created");
        Ok(id)
    }

    async fn update_application(
        &self,
        network: &Network,
        id: &RemoteId,
        application: &Application,
    ) -> Result<(), CoreError> {
        match self.version {
            ChirpStackVersion::V1 => {
                self.update_application_as::<V1>(network, id, application)
                    .await
            }
            ChirpStackVersion::V2 => {
                self.update_application_as::<V2>(network, id, application)
                    .await
            }
        }
    }

    async fn remove_application(&self, _network: &Network, id: &RemoteId) -> Result<(), CoreError> {
        ignore_not_found(self.client.delete_application(id.as_str()).await)
    }

    async fn start_application(
        &self,
        network: &Network,
        id: &RemoteId,
        target: &IntegrationTarget,
    ) -> Result<(), CoreError> {
        let app = id.as_str();
        let result = match self.version {
            ChirpStackVersion::V1 => self.install_integration_as::<V1>(app, target).await,
            ChirpStackVersion::V2 => self.install_integration_as::<V2>(app, target).await,
        };
        match result {
            Err(e) if e.is_conflict() => {
                debug!(application_id = app, "integration already installed");
                Ok(())
            }
            other => {
                other?;
                info!(network = %network.id, application_id = app, url = %target.url, "uplink integration installed");
                Ok(())
            }
        }
    }

    async fn stop_application(&self, network: &Network, id: &RemoteId) -> Result<(), CoreError> {
        ignore_not_found(self.client.delete_http_integration(id.as_str()).await)?;
        info!(network = %network.id, application_id = %id, "uplink integration removed");
        Ok(())
    }

    // ── Device profiles ──────────────────────────────────────────────

    async fn list_device_profiles(
        &self,
        network: &Network,
        application_id: Option<&RemoteId>,
    ) -> Result<Vec<Remote<DeviceProfile>>, CoreError> {
        let ids = match self.version {
            ChirpStackVersion::V1 => {
                self.list_profile_ids_as::<V1>(network, application_id)
                    .await?
            }
            ChirpStackVersion::V2 => {
                self.list_profile_ids_as::<V2>(network, application_id)
                    .await?
            }
        };

        let mut profiles = Vec::with_capacity(ids.len());
        for id in ids {
            let profile = self.fetch_profile(id.as_str()).await?;
            profiles.push(Remote::new(id, profile));
        }
        Ok(profiles)
    }

    async fn get_device_profile(
        &self,
        _network: &Network,
        id: &RemoteId,
    ) -> Result<DeviceProfile, CoreError> {
        self.fetch_profile(id.as_str()).await
    }

    async fn create_device_profile(
        &self,
        network: &Network,
        local_id: LocalId,
        profile: &DeviceProfile,
    ) -> Result<RemoteId, CoreError> {
        let id = match self.version {
            ChirpStackVersion::V1 => self.create_device_profile_as::<V1>(network, profile).await,
            ChirpStackVersion::V2 => self.create_device_profile_as::<V2>(network, profile).await,
        }?;
        info!(network = %network.id, %local_id, remote_id = %id, name = %profile.name, "device profile created");
        Ok(id)
    }

    async fn update_device_profile(
        &self,
        network: &Network,
        id: &RemoteId,
        profile: &DeviceProfile,
    ) -> Result<(), CoreError> {
        match self.version {
            ChirpStackVersion::V1 => {
                self.update_device_profile_as::<V1>(network, id, profile)
                    .await
            }
            ChirpStackVersion::V2 => {
                self.update_device_profile_as::<V2>(network, id, profile)
                    .await
            }
        }
    }

    async fn remove_device_profile(
        &self,
        _network: &Network,
        id: &RemoteId,
    ) -> Result<(), CoreError> {
        ignore_not_found(self.client.delete_device_profile(id.as_str()).await)
    }

    // ── Devices ──────────────────────────────────────────────────────

    async fn list_devices(
        &self,
        _network: &Network,
        application_id: &RemoteId,
    ) -> Result<Vec<RemoteDevice>, CoreError> {
        match self.version {
            ChirpStackVersion::V1 => self.list_devices_as::<V1>(application_id).await,
            ChirpStackVersion::V2 => self.list_devices_as::<V2>(application_id).await,
        }
    }

    async fn create_device(
        &self,
        network: &Network,
        ctx: &DeviceContext,
        device: &Device,
    ) -> Result<RemoteId, CoreError> {
        match self.version {
            ChirpStackVersion::V1 => self.create_device_as::<V1>(network, ctx, device).await,
            ChirpStackVersion::V2 => self.create_device_as::<V2>(network, ctx, device).await,
        }
    }

    async fn update_device(
        &self,
        network: &Network,
        id: &RemoteId,
        ctx: &DeviceContext,
        device: &Device,
    ) -> Result<(), CoreError> {
        match self.version {
            ChirpStackVersion::V1 => self.update_device_as::<V1>(network, id, ctx, device).await,
            ChirpStackVersion::V2 => self.update_device_as::<V2>(network, id, ctx, device).await,
        }
    }

    async fn remove_device(
        &self,
        _network: &Network,
        _application_id: &RemoteId,
        id: &RemoteId,
    ) -> Result<(), CoreError> {
        ignore_not_found(self.client.delete_device(id.as_str()).await)
    }

    async fn pass_data_to_device(
        &self,
        network: &Network,
        args: &DownlinkArgs,
    ) -> Result<(), CoreError> {
        let f_cnt = match self.version {
            ChirpStackVersion::V1 => self.enqueue_as::<V1>(args).await?,
            ChirpStackVersion::V2 => self.enqueue_as::<V2>(args).await?,
        };
        debug!(network = %network.id, dev_eui = %args.device_id, ?f_cnt, "downlink queued");
        Ok(())
    }

    // ── Uplinks ──────────────────────────────────────────────────────

    fn normalize_uplink(
        &self,
        network: &Network,
        application_id: LocalId,
        body: &serde_json::Value,
    ) -> Result<Uplink, CoreError> {
        let event: UplinkEvent = serde_json::from_value(body.clone())
            .map_err(|e| CoreError::validation(format!("malformed ChirpStack uplink: {e}")))?;
        chirpstack_v1::uplink_from_wire(&network.id, application_id, &event)
    }
}
