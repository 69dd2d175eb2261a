// ChirpStack v1 (LoRa App Server 1.x) wire bodies.
//
// Request bodies are bare objects; the device profile nests its MAC
// settings under `deviceProfile`, and ABP activation still uses the
// LoRaWAN 1.0 field names (`nwkSKey`, `fCntDown`).

use serde::{Deserialize, Serialize};

use super::{IntegrationHeader, MacSettings, opt_string_from_string_or_number};

// ── Application ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(
        default,
        deserialize_with = "opt_string_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "organizationID",
        default,
        deserialize_with = "opt_string_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization_id: Option<String>,
    #[serde(
        rename = "serviceProfileID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_encoder_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_decoder_script: Option<String>,
}

// ── Device profile ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    #[serde(
        rename = "deviceProfileID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub device_profile_id: Option<String>,
    pub name: String,
    #[serde(
        rename = "organizationID",
        default,
        deserialize_with = "opt_string_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization_id: Option<String>,
    #[serde(
        rename = "networkServerID",
        default,
        deserialize_with = "opt_string_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub network_server_id: Option<String>,
    #[serde(default)]
    pub device_profile: MacSettings,
}

// ── Device ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(rename = "devEUI")]
    pub dev_eui: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "applicationID",
        default,
        deserialize_with = "opt_string_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub application_id: Option<String>,
    #[serde(
        rename = "deviceProfileID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub device_profile_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
}

/// `POST /api/devices/{devEUI}/keys` body and `GET` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceKeysRequest {
    #[serde(rename = "devEUI", default, skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<String>,
    pub device_keys: DeviceKeys,
}

/// ABP session, LoRaWAN 1.0 naming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceActivation {
    #[serde(rename = "devEUI", default, skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<String>,
    pub dev_addr: String,
    pub app_s_key: String,
    pub nwk_s_key: String,
    #[serde(default)]
    pub f_cnt_up: u32,
    #[serde(default)]
    pub f_cnt_down: u32,
    #[serde(default)]
    pub skip_f_cnt_check: bool,
}

// ── Integrations ────────────────────────────────────────────────────

/// HTTP integration; v1 has no location notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpIntegration {
    #[serde(
        default,
        deserialize_with = "opt_string_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub headers: Vec<IntegrationHeader>,
    #[serde(rename = "uplinkDataURL", default)]
    pub uplink_data_url: String,
    #[serde(rename = "joinNotificationURL", default)]
    pub join_notification_url: String,
    #[serde(rename = "ackNotificationURL", default)]
    pub ack_notification_url: String,
    #[serde(rename = "errorNotificationURL", default)]
    pub error_notification_url: String,
    #[serde(rename = "statusNotificationURL", default)]
    pub status_notification_url: String,
}

// ── Downlink queue ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQueueItem {
    #[serde(rename = "devEUI")]
    pub dev_eui: String,
    pub confirmed: bool,
    pub f_port: u8,
    /// Base64-encoded FRMPayload.
    pub data: String,
}
