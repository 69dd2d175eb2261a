// ── Uplink / downlink message types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{DevEui, LocalId, NetworkId, RemoteId};

/// Normalized uplink, whatever backend delivered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uplink {
    pub network_id: NetworkId,
    /// Local application the ingest URL was registered for.
    pub application_id: LocalId,
    /// Remote device id (DevEUI on ChirpStack, `dev_id` on TTN).
    pub device_id: RemoteId,
    pub dev_eui: Option<DevEui>,
    pub f_port: Option<u8>,
    pub f_cnt: Option<u32>,
    /// Base64-encoded FRMPayload.
    pub payload: Option<String>,
    /// Payload decoded by the network server's codec, if any.
    pub decoded: Option<serde_json::Value>,
    /// Set when the uplink answers a pending downlink submission.
    pub correlation_id: Option<Uuid>,
    pub received_at: DateTime<Utc>,
}

/// Downlink payload for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Downlink {
    pub f_port: u8,
    pub confirmed: bool,
    /// Raw FRMPayload bytes.
    pub data: Vec<u8>,
}

/// Where a downlink goes on the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownlinkArgs {
    pub application_id: RemoteId,
    pub device_id: RemoteId,
    pub downlink: Downlink,
}

/// Downlink submission as emitted to the adapter worker: `{id, args}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownlinkRequest {
    pub id: Uuid,
    pub args: DownlinkArgs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UplinkOutcome {
    Ok(serde_json::Value),
    Fail(String),
}

/// Result event resolving one pending submission: `{id, ok|fail, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UplinkResult {
    pub id: Uuid,
    pub outcome: UplinkOutcome,
}
