// ── Device profile domain type ──

use serde::{Deserialize, Serialize};

/// Canonical LoRaWAN device profile: MAC version, regional parameters
/// and class B/C capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub organization_id: Option<String>,
    pub network_server_id: Option<String>,

    pub mac_version: Option<String>,
    pub reg_params_revision: Option<String>,
    pub rf_region: Option<String>,
    /// OTAA when true, ABP otherwise.
    pub supports_join: bool,
    pub supports_32bit_fcnt: Option<bool>,

    pub supports_class_b: Option<bool>,
    pub class_b_timeout: Option<u32>,
    pub ping_slot_period: Option<u32>,
    pub ping_slot_dr: Option<u32>,
    pub ping_slot_freq: Option<u32>,

    pub supports_class_c: Option<bool>,
    pub class_c_timeout: Option<u32>,

    pub max_eirp: Option<u32>,
    pub max_duty_cycle: Option<u32>,
    pub rx_delay_1: Option<u32>,
    pub rx_dr_offset_1: Option<u32>,
    pub rx_data_rate_2: Option<u32>,
    pub rx_freq_2: Option<u32>,
    #[serde(default)]
    pub factory_preset_freqs: Vec<u32>,
}

impl DeviceProfile {
    /// LoRaWAN 1.0.x devices use one network session key for all three
    /// 1.1 session-key roles.
    pub fn is_lorawan_1_0(&self) -> bool {
        self.mac_version
            .as_deref()
            .is_some_and(|v| v.starts_with("1.0"))
    }
}
