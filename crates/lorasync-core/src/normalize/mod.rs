// ── Entity normalizers ──
//
// Pure translation between wire schemas and the canonical model, one
// module per backend generation. `*_from_wire` functions normalize a
// decoded response; `*_to_wire` functions build request bodies from a
// canonical entity plus the network's configured relationship ids.

pub mod chirpstack_v1;
pub mod chirpstack_v2;
pub mod ip;
pub mod ttn_v2;

use lorasync_api::chirpstack::models::MacSettings;

use crate::error::CoreError;
use crate::model::{DeviceCredentials, DeviceProfile};

// ── Relationship guard ──────────────────────────────────────────────

/// Fail when an entity already carries a relationship id that differs
/// from the one the network is configured with.
pub(crate) fn check_relationship(
    entity: &'static str,
    field: &'static str,
    carried: Option<&str>,
    configured: Option<&str>,
) -> Result<(), CoreError> {
    match (carried, configured) {
        (Some(carried), Some(configured)) if carried != configured => {
            Err(CoreError::RelationshipMismatch {
                entity,
                field,
                carried: carried.to_owned(),
                configured: configured.to_owned(),
            })
        }
        _ => Ok(()),
    }
}

/// The configured id, or the one the entity carries, or a validation
/// error when neither exists.
pub(crate) fn required_relationship(
    entity: &'static str,
    field: &'static str,
    carried: Option<&str>,
    configured: Option<&str>,
) -> Result<String, CoreError> {
    check_relationship(entity, field, carried, configured)?;
    configured
        .or(carried)
        .map(str::to_owned)
        .ok_or_else(|| CoreError::validation(format!("{entity} requires a {field}")))
}

// ── Credentials gating ──────────────────────────────────────────────

/// Which credential body to send for a device on a given profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CredentialShape<'a> {
    Keys(&'a crate::model::DeviceKeys),
    Activation(&'a crate::model::DeviceActivation),
    None,
}

/// Pick the credential body from what the device carries, rejecting
/// credentials that contradict the profile's join support.
pub(crate) fn credential_shape<'a>(
    credentials: Option<&'a DeviceCredentials>,
    profile: &DeviceProfile,
) -> Result<CredentialShape<'a>, CoreError> {
    match credentials {
        Some(DeviceCredentials::Keys(keys)) if profile.supports_join => {
            Ok(CredentialShape::Keys(keys))
        }
        Some(DeviceCredentials::Activation(act)) if !profile.supports_join => {
            Ok(CredentialShape::Activation(act))
        }
        Some(DeviceCredentials::Keys(_)) => Err(CoreError::validation(format!(
            "device carries OTAA keys but profile {:?} does not support join",
            profile.name
        ))),
        Some(DeviceCredentials::Activation(_)) => Err(CoreError::validation(format!(
            "device carries an ABP activation but profile {:?} is join-only",
            profile.name
        ))),
        None => Ok(CredentialShape::None),
    }
}

// ── MAC settings (shared by both ChirpStack generations) ────────────

/// Build a canonical profile from MAC settings; coalesces the legacy
/// `supports32bitFCnt` casing into `supports_32bit_fcnt`.
pub(crate) fn profile_from_mac(
    name: &str,
    organization_id: Option<&str>,
    network_server_id: Option<&str>,
    mac: &MacSettings,
) -> DeviceProfile {
    DeviceProfile {
        name: name.to_owned(),
        organization_id: organization_id.map(str::to_owned),
        network_server_id: network_server_id.map(str::to_owned),
        mac_version: mac.mac_version.clone(),
        reg_params_revision: mac.reg_params_revision.clone(),
        rf_region: mac.rf_region.clone(),
        supports_join: mac.supports_join.unwrap_or(false),
        supports_32bit_fcnt: mac.supports_32bit_fcnt.or(mac.supports_32bit_fcnt_legacy),
        supports_class_b: mac.supports_class_b,
        class_b_timeout: mac.class_b_timeout,
        ping_slot_period: mac.ping_slot_period,
        ping_slot_dr: mac.ping_slot_dr,
        ping_slot_freq: mac.ping_slot_freq,
        supports_class_c: mac.supports_class_c,
        class_c_timeout: mac.class_c_timeout,
        max_eirp: mac.max_eirp,
        max_duty_cycle: mac.max_duty_cycle,
        rx_delay_1: mac.rx_delay_1,
        rx_dr_offset_1: mac.rx_dr_offset_1,
        rx_data_rate_2: mac.rx_data_rate_2,
        rx_freq_2: mac.rx_freq_2,
        factory_preset_freqs: mac.factory_preset_freqs.clone().unwrap_or_default(),
    }
}

/// MAC settings for a request body. The legacy casing is never written.
pub(crate) fn mac_from_profile(profile: &DeviceProfile) -> MacSettings {
    MacSettings {
        mac_version: profile.mac_version.clone(),
        reg_params_revision: profile.reg_params_revision.clone(),
        rf_region: profile.rf_region.clone(),
        supports_join: Some(profile.supports_join),
        supports_class_b: profile.supports_class_b,
        class_b_timeout: profile.class_b_timeout,
        ping_slot_period: profile.ping_slot_period,
        ping_slot_dr: profile.ping_slot_dr,
        ping_slot_freq: profile.ping_slot_freq,
        supports_class_c: profile.supports_class_c,
        class_c_timeout: profile.class_c_timeout,
        max_eirp: profile.max_eirp,
        max_duty_cycle: profile.max_duty_cycle,
        rx_delay_1: profile.rx_delay_1,
        rx_dr_offset_1: profile.rx_dr_offset_1,
        rx_data_rate_2: profile.rx_data_rate_2,
        rx_freq_2: profile.rx_freq_2,
        factory_preset_freqs: if profile.factory_preset_freqs.is_empty() {
            None
        } else {
            Some(profile.factory_preset_freqs.clone())
        },
        supports_32bit_fcnt: profile.supports_32bit_fcnt,
        supports_32bit_fcnt_legacy: None,
    }
}
