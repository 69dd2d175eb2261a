// ChirpStack v2 wire bodies.
//
// Same logical fields as v1, but every create/update body is wrapped in a
// named envelope (`{"application": {...}}`, `{"deviceProfile": {...}}`,
// ...), MAC settings are flattened into the profile, and ABP activation
// uses the LoRaWAN 1.1 session-key split.

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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationEnvelope {
    pub application: Application,
}

// ── Device profile ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
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
    #[serde(flatten)]
    pub mac: MacSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfileEnvelope {
    pub device_profile: DeviceProfile,
}

/// Row of `GET /api/device-profiles`; the list omits MAC settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfileListItem {
    pub id: String,
    pub name: String,
    #[serde(
        rename = "organizationID",
        default,
        deserialize_with = "opt_string_from_string_or_number"
    )]
    pub organization_id: Option<String>,
    #[serde(
        rename = "networkServerID",
        default,
        deserialize_with = "opt_string_from_string_or_number"
    )]
    pub network_server_id: Option<String>,
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
    #[serde(default)]
    pub skip_f_cnt_check: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEnvelope {
    pub device: Device,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceKeys {
    #[serde(rename = "devEUI", default, skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nwk_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gen_app_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceKeysEnvelope {
    pub device_keys: DeviceKeys,
}

/// ABP session, LoRaWAN 1.1 naming. For 1.0.x devices the server only
/// fills `fNwkSIntKey`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceActivation {
    #[serde(rename = "devEUI", default, skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<String>,
    pub dev_addr: String,
    pub app_s_key: String,
    #[serde(default)]
    pub nwk_s_enc_key: String,
    #[serde(default)]
    pub s_nwk_s_int_key: String,
    #[serde(default)]
    pub f_nwk_s_int_key: String,
    #[serde(default)]
    pub f_cnt_up: u32,
    #[serde(default)]
    pub n_f_cnt_down: u32,
    #[serde(default)]
    pub a_f_cnt_down: u32,
    #[serde(default)]
    pub skip_f_cnt_check: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceActivationEnvelope {
    pub device_activation: DeviceActivation,
}

// ── Integrations ────────────────────────────────────────────────────

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
    #[serde(rename = "locationNotificationURL", default)]
    pub location_notification_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpIntegrationEnvelope {
    pub integration: HttpIntegration,
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQueueItemEnvelope {
    pub device_queue_item: DeviceQueueItem,
}
