// ── Generic-IP normalizer ──
//
// IP devices talk to this system directly, so there is no remote server
// to allocate ids: applications are addressed by their local id and
// devices by DevEUI. Devices POST a small JSON body per uplink and
// fetch queued downlinks as base64.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{DevEui, Downlink, LocalId, NetworkId, RemoteId, Uplink};

/// Body an IP device posts to the ingest endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpUplink {
    #[serde(default, alias = "devEUI")]
    pub dev_eui: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub f_port: Option<u8>,
    #[serde(default)]
    pub f_cnt: Option<u32>,
    /// Base64 payload.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub object: Option<serde_json::Value>,
    /// Echoed back by devices answering a downlink.
    #[serde(default)]
    pub correlation_id: Option<Uuid>,
}

/// Downlink as handed to an IP device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpDownlink {
    pub f_port: u8,
    pub confirmed: bool,
    pub data: String,
}

pub fn application_remote_id(local_id: LocalId) -> RemoteId {
    RemoteId::new(local_id.to_string())
}

pub fn device_remote_id(dev_eui: &DevEui) -> RemoteId {
    RemoteId::new(dev_eui.as_str())
}

pub fn uplink_from_wire(
    network_id: &NetworkId,
    application_id: LocalId,
    body: &serde_json::Value,
) -> Result<Uplink, CoreError> {
    let wire: IpUplink = serde_json::from_value(body.clone())
        .map_err(|e| CoreError::validation(format!("malformed IP uplink: {e}")))?;

    let dev_eui = wire.dev_eui.as_deref().map(DevEui::new).transpose()?;
    let device_id = match (&dev_eui, wire.device_id) {
        (Some(eui), _) => device_remote_id(eui),
        (None, Some(id)) => RemoteId::new(id),
        (None, None) => {
            return Err(CoreError::validation(
                "IP uplink carries neither devEUI nor deviceId",
            ));
        }
    };

    if let Some(data) = &wire.data {
        STANDARD
            .decode(data)
            .map_err(|e| CoreError::validation(format!("IP uplink data is not base64: {e}")))?;
    }

    Ok(Uplink {
        network_id: network_id.clone(),
        application_id,
        device_id,
        dev_eui,
        f_port: wire.f_port,
        f_cnt: wire.f_cnt,
        payload: wire.data,
        decoded: wire.object,
        correlation_id: wire.correlation_id,
        received_at: Utc::now(),
    })
}

pub fn downlink_to_wire(downlink: &Downlink) -> IpDownlink {
    IpDownlink {
        f_port: downlink.f_port,
        confirmed: downlink.confirmed,
        data: STANDARD.encode(&downlink.data),
    }
}
