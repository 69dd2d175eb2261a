// The Things Network v2 wire schemas
//
// TTN v2 speaks snake_case JSON. Applications live on the account server;
// devices, integrations and downlinks live on the regional handler.

use serde::{Deserialize, Serialize};

// ── Account server ──────────────────────────────────────────────────

/// `GET /applications` row and `POST /applications` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub euis: Vec<String>,
    #[serde(default, skip_serializing)]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

// ── Handler ─────────────────────────────────────────────────────────

/// Handler-side application settings (payload functions).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerApplication {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

/// LoRaWAN section of a handler device. Which key fields are present
/// depends on `activation_constraints`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LorawanDevice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_eui: Option<String>,
    pub dev_eui: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nwk_s_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_s_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_cnt_up: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_cnt_down: Option<u32>,
    #[serde(default)]
    pub disable_f_cnt_check: bool,
    #[serde(default)]
    pub uses32_bit_f_cnt: bool,
    /// `"otaa"`, `"abp"`, or `"local"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_constraints: Option<String>,
    #[serde(default, skip_serializing)]
    pub last_seen: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub app_id: String,
    pub dev_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub lorawan_device: LorawanDevice,
}

/// `GET /applications/{app_id}/devices`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// HTTP integration installed on the handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpIntegration {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// Sent verbatim as the `Authorization` header on every delivery.
    #[serde(default)]
    pub authorization: String,
}

fn default_method() -> String {
    "POST".into()
}

/// `POST /applications/{app_id}/down`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownlinkMessage {
    pub dev_id: String,
    pub port: u8,
    #[serde(default)]
    pub confirmed: bool,
    /// Base64-encoded FRMPayload.
    pub payload_raw: String,
}

// ── Uplink delivery ─────────────────────────────────────────────────

/// Body the handler POSTs to an HTTP integration for every uplink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UplinkMessage {
    pub app_id: String,
    pub dev_id: String,
    #[serde(default)]
    pub hardware_serial: Option<String>,
    #[serde(default)]
    pub port: Option<u8>,
    #[serde(default)]
    pub counter: Option<u32>,
    #[serde(default)]
    pub payload_raw: Option<String>,
    #[serde(default)]
    pub metadata: Option<UplinkMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UplinkMetadata {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub frequency: Option<f64>,
    #[serde(default)]
    pub data_rate: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn device_decodes_otaa_handler_payload() {
        let device: Device = serde_json::from_value(json!({
            "app_id": "acme",
            "dev_id": "sensor-1",
            "lorawan_device": {
                "app_eui": "70B3D57ED0000001",
                "dev_eui": "0004A30B001C0530",
                "app_key": "2B7E151628AED2A6ABF7158809CF4F3C",
                "activation_constraints": "otaa",
                "uses32_bit_f_cnt": true,
                "last_seen": 1_700_000_000_u64
            }
        }))
        .unwrap();

        assert_eq!(device.lorawan_device.activation_constraints.as_deref(), Some("otaa"));
        assert!(device.lorawan_device.uses32_bit_f_cnt);
        assert!(device.lorawan_device.nwk_s_key.is_none());

        let out = serde_json::to_value(&device).unwrap();
        assert!(out["lorawan_device"].get("last_seen").is_none());
    }

    #[test]
    fn http_integration_defaults_to_post() {
        let hook: HttpIntegration =
            serde_json::from_value(json!({ "url": "https://ingest.example.com" })).unwrap();
        assert_eq!(hook.method, "POST");
    }
}
