// ChirpStack wire schemas
//
// Types shared by both API generations live here; generation-specific
// request/response bodies live in `v1` and `v2`. Every field the server
// may omit is an `Option` so the payload is decoded exactly once.

pub mod v1;
pub mod v2;

use serde::{Deserialize, Deserializer, Serialize};

// ── Common envelopes ────────────────────────────────────────────────

/// Paginated list response: `{ "totalCount": "2", "result": [...] }`.
///
/// grpc-gateway encodes int64 as a JSON string; both forms are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default, deserialize_with = "u64_from_string_or_number")]
    pub total_count: u64,
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
}

/// Response to create calls that allocate a server-side id.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedResponse {
    #[serde(deserialize_with = "string_from_string_or_number")]
    pub id: String,
}

/// Response to `POST /api/devices/{devEUI}/queue` in both generations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    #[serde(default)]
    pub f_cnt: Option<u32>,
}

/// `{ "key": ..., "value": ... }` header pair for HTTP integrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationHeader {
    pub key: String,
    pub value: String,
}

// ── MAC/region settings ─────────────────────────────────────────────

/// LoRaWAN MAC and regional parameters of a device profile.
///
/// v1 nests these under `deviceProfile`; v2 flattens them into the
/// profile itself. Both carry the same field names, except that some
/// server releases emit `supports32bitFCnt` instead of `supports32BitFCnt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_params_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rf_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_join: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_class_b: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_b_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_slot_period: Option<u32>,
    #[serde(rename = "pingSlotDR", default, skip_serializing_if = "Option::is_none")]
    pub ping_slot_dr: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_slot_freq: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_class_c: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_c_timeout: Option<u32>,
    #[serde(rename = "maxEIRP", default, skip_serializing_if = "Option::is_none")]
    pub max_eirp: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duty_cycle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_delay_1: Option<u32>,
    #[serde(rename = "rxDROffset1", default, skip_serializing_if = "Option::is_none")]
    pub rx_dr_offset_1: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_data_rate_2: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_freq_2: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_preset_freqs: Option<Vec<u32>>,
    #[serde(rename = "supports32BitFCnt", default, skip_serializing_if = "Option::is_none")]
    pub supports_32bit_fcnt: Option<bool>,
    /// Legacy casing; read only, never written back.
    #[serde(rename = "supports32bitFCnt", default, skip_serializing)]
    pub supports_32bit_fcnt_legacy: Option<bool>,
}

// ── Integration events ──────────────────────────────────────────────

/// Body the HTTP integration POSTs to `uplinkDataURL`. Identical in both
/// generations apart from fields neither side reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UplinkEvent {
    #[serde(
        rename = "applicationID",
        default,
        deserialize_with = "opt_string_from_string_or_number"
    )]
    pub application_id: Option<String>,
    #[serde(default)]
    pub application_name: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(rename = "devEUI")]
    pub dev_eui: String,
    #[serde(default)]
    pub f_cnt: Option<u32>,
    #[serde(default)]
    pub f_port: Option<u8>,
    /// Base64-encoded FRMPayload.
    #[serde(default)]
    pub data: Option<String>,
    /// Decoded payload when the application has a codec.
    #[serde(default)]
    pub object: Option<serde_json::Value>,
}

// ── Deserialization helpers ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

pub(crate) fn string_from_string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(de)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

pub(crate) fn opt_string_from_string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<StringOrNumber>::deserialize(de)?.map(|v| match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}

fn u64_from_string_or_number<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(de)? {
        StringOrNumber::String(s) => s.parse().map_err(serde::de::Error::custom),
        StringOrNumber::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("totalCount is not a positive integer")),
    }
}
