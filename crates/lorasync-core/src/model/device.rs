// ── Device domain types ──
//
// A device is either join-capable (OTAA keys) or pre-activated (ABP
// session). `DeviceCredentials` makes "both" unrepresentable.

use serde::{Deserialize, Serialize};

use super::ids::DevEui;

/// OTAA root keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceKeys {
    pub app_key: Option<String>,
    pub nwk_key: Option<String>,
    pub gen_app_key: Option<String>,
    /// JoinEUI / AppEUI, where the backend stores it with the keys.
    pub app_eui: Option<String>,
}

/// ABP session, in LoRaWAN 1.1 naming. For 1.0.x sessions the three
/// network session keys hold the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceActivation {
    pub dev_addr: String,
    pub app_s_key: String,
    pub nwk_s_enc_key: String,
    pub s_nwk_s_int_key: String,
    pub f_nwk_s_int_key: String,
    pub f_cnt_up: u32,
    pub n_f_cnt_down: u32,
    pub a_f_cnt_down: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCredentials {
    Keys(DeviceKeys),
    Activation(DeviceActivation),
}

/// Canonical device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub dev_eui: DevEui,
    pub name: String,
    pub description: Option<String>,
    pub skip_f_cnt_check: bool,
    pub credentials: Option<DeviceCredentials>,
}

impl Device {
    pub fn new(dev_eui: DevEui, name: impl Into<String>) -> Self {
        Self {
            dev_eui,
            name: name.into(),
            description: None,
            skip_f_cnt_check: false,
            credentials: None,
        }
    }

    pub fn device_keys(&self) -> Option<&DeviceKeys> {
        match &self.credentials {
            Some(DeviceCredentials::Keys(k)) => Some(k),
            _ => None,
        }
    }

    pub fn device_activation(&self) -> Option<&DeviceActivation> {
        match &self.credentials {
            Some(DeviceCredentials::Activation(a)) => Some(a),
            _ => None,
        }
    }
}
