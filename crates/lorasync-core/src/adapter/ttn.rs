// ── The Things Network v2 adapter ──
//
// Applications live on the account server, everything else on the
// regional handler. TTN has no device profiles: listing devices
// synthesizes one per device, and profile CRUD is unsupported.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lorasync_api::ttn::models as ttn;
use lorasync_api::{TransportConfig, TtnClient};
use tracing::{debug, info, warn};
use url::Url;

use super::{
    DeviceContext, IntegrationTarget, NetworkProtocol, Remote, RemoteDevice, ignore_not_found,
    reachability_error, unknown_device,
};
use crate::error::CoreError;
use crate::model::{
    Application, Device, DeviceProfile, DownlinkArgs, LocalId, Network, ProtocolKind, RemoteId,
    Uplink,
};
use crate::normalize::ttn_v2;

/// Account server used when a network does not set `base_url`.
pub const TTN_ACCOUNT_URL: &str = "https://account.thethingsnetwork.org";

pub struct TtnAdapter {
    client: TtnClient,
}

impl TtnAdapter {
    pub fn new(client: TtnClient) -> Self {
        Self { client }
    }

    pub fn from_network(network: &Network, transport: &TransportConfig) -> Result<Self, CoreError> {
        let token = network
            .security
            .access_token
            .as_ref()
            .ok_or_else(|| CoreError::Auth {
                message: format!("network {} has no access_token configured", network.id),
            })?;
        let account_url = match &network.base_url {
            Some(url) => url.clone(),
            None => Url::parse(TTN_ACCOUNT_URL)
                .map_err(|e| CoreError::Internal(format!("bad default account URL: {e}")))?,
        };
        let handler_url = network.handler_url.clone().ok_or_else(|| {
            CoreError::validation(format!("network {} has no handler_url", network.id))
        })?;

        Ok(Self::new(TtnClient::new(
            account_url,
            handler_url,
            token,
            transport,
        )?))
    }

    pub fn client(&self) -> &TtnClient {
        &self.client
    }

    /// Profile for a TTN device, regional defaults from the network's handler id.
    pub fn synthesize_device_profile(&self, network: &Network, device: &ttn::Device) -> DeviceProfile {
        ttn_v2::synthesize_device_profile(device, network.settings.handler_id.as_deref())
    }

    async fn register_on_handler(
        &self,
        id: &RemoteId,
        application: &Application,
    ) -> Result<(), CoreError> {
        self.client.register_handler_application(id.as_str()).await?;
        if has_payload_functions(application) {
            self.client
                .update_handler_application(&ttn_v2::handler_application_to_wire(id, application))
                .await?;
        }
        Ok(())
    }

    async fn handler_application(
        &self,
        app_id: &str,
    ) -> Result<Option<ttn::HandlerApplication>, CoreError> {
        match self.client.get_handler_application(app_id).await {
            Ok(h) => Ok(Some(h)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn has_payload_functions(app: &Application) -> bool {
    app.payload_codec.is_some() || app.payload_decoder.is_some() || app.payload_encoder.is_some()
}

fn unsupported(operation: &str) -> CoreError {
    CoreError::Unsupported {
        operation: operation.into(),
        protocol: ProtocolKind::TtnV2.to_string(),
    }
}

#[async_trait]
impl NetworkProtocol for TtnAdapter {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::TtnV2
    }

    // ── Session ──────────────────────────────────────────────────────

    async fn connect(&self, network: &Network) -> Result<(), CoreError> {
        if network.security.access_token.is_none() {
            return Err(CoreError::Auth {
                message: format!("network {} has no access_token configured", network.id),
            });
        }
        Ok(())
    }

    async fn test(&self, network: &Network) -> Result<(), CoreError> {
        self.client
            .list_applications()
            .await
            .map(|_| ())
            .map_err(|e| reachability_error(network, e))
    }

    // ── Applications ─────────────────────────────────────────────────

    async fn list_applications(
        &self,
        _network: &Network,
    ) -> Result<Vec<Remote<Application>>, CoreError> {
        let apps = self.client.list_applications().await?;
        let mut out = Vec::with_capacity(apps.len());
        for app in &apps {
            let handler = self.handler_application(&app.id).await?;
            out.push(Remote::new(
                app.id.as_str(),
                ttn_v2::application_from_wire(app, handler.as_ref()),
            ));
        }
        Ok(out)
    }

    async fn get_application(
        &self,
        _network: &Network,
        id: &RemoteId,
    ) -> Result<Application, CoreError> {
        let app = self.client.get_application(id.as_str()).await?;
        let handler = self.handler_application(id.as_str()).await?;
        Ok(ttn_v2::application_from_wire(&app, handler.as_ref()))
    }

    async fn create_application(
        &self,
        network: &Network,
        local_id: LocalId,
        application: &Application,
    ) -> Result<RemoteId, CoreError> {
        let id = ttn_v2::new_ttn_id(local_id);
        self.client
            .create_application(&ttn_v2::application_to_wire(&id, application))
            .await?;
        // No mapping is recorded on failure, so a half-created application
        // must not outlive this call.
        if let Err(e) = self.register_on_handler(&id, application).await {
            warn!(network = %network.id, remote_id = %id, error = %e, "handler registration failed, removing account application");
            if let Err(cleanup) = self.client.delete_application(id.as_str()).await {
                warn!(network = %network.id, remote_id = %id, error = %cleanup, "could not remove account application");
            }
            return Err(e);
        }
        info!(network = %network.id, %local_id, remote_id = %id, name = %application.name, "application created");
        Ok(id)
    }

    async fn update_application(
        &self,
        _network: &Network,
        id: &RemoteId,
        application: &Application,
    ) -> Result<(), CoreError> {
        self.client
            .update_handler_application(&ttn_v2::handler_application_to_wire(id, application))
            .await?;
        Ok(())
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
        let body = target.ttn();
        let result = match self.client.update_http_integration(id.as_str(), &body).await {
            Err(e) if e.is_not_found() => {
                debug!(application_id = %id, "no integration installed, creating");
                self.client.create_http_integration(id.as_str(), &body).await
            }
            other => other,
        };
        match result {
            Err(e) if e.is_conflict() => Ok(()),
            other => {
                other?;
                info!(network = %network.id, application_id = %id, url = %target.url, "uplink integration installed");
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
        network: &Network,
        application_id: &RemoteId,
    ) -> Result<Vec<RemoteDevice>, CoreError> {
        self.client
            .list_devices(application_id.as_str())
            .await?
            .iter()
            .map(|w| {
                Ok(RemoteDevice {
                    id: RemoteId::new(w.dev_id.as_str()),
                    device: ttn_v2::device_from_wire(w)?,
                    profile: self.synthesize_device_profile(network, w),
                    profile_id: None,
                })
            })
            .collect()
    }

    async fn create_device(
        &self,
        network: &Network,
        ctx: &DeviceContext,
        device: &Device,
    ) -> Result<RemoteId, CoreError> {
        let dev_id = ttn_v2::new_ttn_id(ctx.local_id);
        let body = ttn_v2::device_to_wire(&ctx.application_id, &dev_id, device, &ctx.profile)?;
        self.client.create_device(&body).await?;
        info!(network = %network.id, local_id = %ctx.local_id, dev_id = %dev_id, dev_eui = %device.dev_eui, "device created");
        Ok(dev_id)
    }

    async fn update_device(
        &self,
        _network: &Network,
        id: &RemoteId,
        ctx: &DeviceContext,
        device: &Device,
    ) -> Result<(), CoreError> {
        let body = ttn_v2::device_to_wire(&ctx.application_id, id, device, &ctx.profile)?;
        self.client
            .update_device(&body)
            .await
            .map_err(|e| unknown_device(e, id))
    }

    async fn remove_device(
        &self,
        _network: &Network,
        application_id: &RemoteId,
        id: &RemoteId,
    ) -> Result<(), CoreError> {
        ignore_not_found(
            self.client
                .delete_device(application_id.as_str(), id.as_str())
                .await,
        )
    }

    async fn pass_data_to_device(
        &self,
        network: &Network,
        args: &DownlinkArgs,
    ) -> Result<(), CoreError> {
        let msg = ttn::DownlinkMessage {
            dev_id: args.device_id.to_string(),
            port: args.downlink.f_port,
            confirmed: args.downlink.confirmed,
            payload_raw: STANDARD.encode(&args.downlink.data),
        };
        self.client
            .send_downlink(args.application_id.as_str(), &msg)
            .await
            .map_err(|e| unknown_device(e, &args.device_id))?;
        debug!(network = %network.id, dev_id = %args.device_id, "downlink scheduled");
        Ok(())
    }

    // ── Uplinks ──────────────────────────────────────────────────────

    fn normalize_uplink(
        &self,
        network: &Network,
        application_id: LocalId,
        body: &serde_json::Value,
    ) -> Result<Uplink, CoreError> {
        let msg: ttn::UplinkMessage = serde_json::from_value(body.clone())
            .map_err(|e| CoreError::validation(format!("malformed TTN uplink: {e}")))?;
        ttn_v2::uplink_from_wire(&network.id, application_id, &msg)
    }
}
