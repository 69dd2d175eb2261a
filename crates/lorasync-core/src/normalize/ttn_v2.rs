// ── TTN v2 normalizer ──
//
// TTN has no device profiles: one is synthesized from the device's
// activation mode plus a regional default keyed by handler id. Remote
// ids are chosen locally as `<localId>-lpwanserver-<uuid>`.

use chrono::Utc;
use lorasync_api::ttn::models as ttn;
use uuid::Uuid;

use super::{CredentialShape, credential_shape};
use crate::error::CoreError;
use crate::model::{
    Application, DevEui, Device, DeviceActivation, DeviceCredentials, DeviceKeys, DeviceProfile,
    LocalId, NetworkId, RemoteId, Uplink,
};

const MAX_ID_LEN: usize = 36;

// ── Identifiers ─────────────────────────────────────────────────────

/// Build a TTN application or device id: lower-cased, anything outside
/// `[a-z0-9_-]` becomes `-`, cut to 36 characters, then leading and
/// trailing `-`/`_` stripped.
pub fn ttn_id(local_id: LocalId, salt: Uuid) -> String {
    sanitize_id(&format!("{local_id}-lpwanserver-{salt}"))
}

/// [`ttn_id`] with a fresh random salt.
pub fn new_ttn_id(local_id: LocalId) -> RemoteId {
    RemoteId::new(ttn_id(local_id, Uuid::new_v4()))
}

pub fn sanitize_id(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_ID_LEN)
        .collect();
    cleaned.trim_matches(|c| c == '-' || c == '_').to_owned()
}

// ── Regions ─────────────────────────────────────────────────────────

const HANDLER_REGIONS: &[(&str, &str)] = &[
    ("-us-west", "US902"),
    ("-eu", "EU868"),
    ("-asia-se", "China779"),
    ("-brazil", "AS923"),
];

/// Default RF region for a handler id; US902 when the suffix is unknown.
pub fn region_for_handler(handler_id: &str) -> &'static str {
    HANDLER_REGIONS
        .iter()
        .find(|&&(suffix, _)| handler_id.ends_with(suffix))
        .map_or("US902", |&(_, region)| region)
}

// ── Application ─────────────────────────────────────────────────────

pub fn application_from_wire(
    w: &ttn::Application,
    handler: Option<&ttn::HandlerApplication>,
) -> Application {
    Application {
        name: if w.name.is_empty() {
            w.id.clone()
        } else {
            w.name.clone()
        },
        description: None,
        payload_codec: handler.and_then(|h| h.payload_format.clone()),
        payload_decoder: handler.and_then(|h| h.decoder.clone()),
        payload_encoder: handler.and_then(|h| h.encoder.clone()),
        base_url: None,
        organization_id: None,
    }
}

pub fn application_to_wire(app_id: &RemoteId, app: &Application) -> ttn::Application {
    ttn::Application {
        id: app_id.to_string(),
        name: app.name.clone(),
        ..Default::default()
    }
}

pub fn handler_application_to_wire(
    app_id: &RemoteId,
    app: &Application,
) -> ttn::HandlerApplication {
    ttn::HandlerApplication {
        app_id: app_id.to_string(),
        payload_format: app.payload_codec.clone(),
        decoder: app.payload_decoder.clone(),
        encoder: app.payload_encoder.clone(),
        converter: None,
        validator: None,
    }
}

// ── Device profile synthesis ────────────────────────────────────────

/// Synthesize a profile for a TTN device.
pub fn synthesize_device_profile(device: &ttn::Device, handler_id: Option<&str>) -> DeviceProfile {
    let region = region_for_handler(handler_id.unwrap_or_default());
    let supports_join = is_otaa(&device.lorawan_device);

    DeviceProfile {
        name: format!(
            "TTN {region} {}",
            if supports_join { "OTAA" } else { "ABP" }
        ),
        mac_version: Some("1.0.2".into()),
        reg_params_revision: Some("B".into()),
        rf_region: Some(region.into()),
        supports_join,
        supports_32bit_fcnt: Some(device.lorawan_device.uses32_bit_f_cnt),
        ..Default::default()
    }
}

fn is_otaa(lw: &ttn::LorawanDevice) -> bool {
    match lw.activation_constraints.as_deref() {
        Some(c) => c.eq_ignore_ascii_case("otaa"),
        None => lw.app_key.is_some() && lw.dev_addr.is_none(),
    }
}

// ── Device ──────────────────────────────────────────────────────────

pub fn device_from_wire(w: &ttn::Device) -> Result<Device, CoreError> {
    let lw = &w.lorawan_device;

    let credentials = if is_otaa(lw) {
        Some(DeviceCredentials::Keys(DeviceKeys {
            app_key: lw.app_key.clone(),
            nwk_key: None,
            gen_app_key: None,
            app_eui: lw.app_eui.clone(),
        }))
    } else {
        match (&lw.dev_addr, &lw.nwk_s_key, &lw.app_s_key) {
            (Some(dev_addr), Some(nwk_s_key), Some(app_s_key)) => {
                Some(DeviceCredentials::Activation(DeviceActivation {
                    dev_addr: dev_addr.clone(),
                    app_s_key: app_s_key.clone(),
                    nwk_s_enc_key: nwk_s_key.clone(),
                    s_nwk_s_int_key: nwk_s_key.clone(),
                    f_nwk_s_int_key: nwk_s_key.clone(),
                    f_cnt_up: lw.f_cnt_up.unwrap_or_default(),
                    n_f_cnt_down: lw.f_cnt_down.unwrap_or_default(),
                    a_f_cnt_down: lw.f_cnt_down.unwrap_or_default(),
                }))
            }
            _ => None,
        }
    };

    Ok(Device {
        dev_eui: DevEui::new(&lw.dev_eui)?,
        name: w.dev_id.clone(),
        description: w.description.clone(),
        skip_f_cnt_check: lw.disable_f_cnt_check,
        credentials,
    })
}

pub fn device_to_wire(
    app_id: &RemoteId,
    dev_id: &RemoteId,
    device: &Device,
    profile: &DeviceProfile,
) -> Result<ttn::Device, CoreError> {
    let mut lw = ttn::LorawanDevice {
        dev_eui: device.dev_eui.as_str().to_uppercase(),
        app_id: Some(app_id.to_string()),
        dev_id: Some(dev_id.to_string()),
        disable_f_cnt_check: device.skip_f_cnt_check,
        uses32_bit_f_cnt: profile.supports_32bit_fcnt.unwrap_or(true),
        ..Default::default()
    };

    match credential_shape(device.credentials.as_ref(), profile)? {
        CredentialShape::Keys(keys) => {
            lw.activation_constraints = Some("otaa".into());
            lw.app_key = keys.app_key.clone().or_else(|| keys.nwk_key.clone());
            lw.app_eui = keys.app_eui.clone();
        }
        CredentialShape::Activation(act) => {
            lw.activation_constraints = Some("abp".into());
            lw.dev_addr = Some(act.dev_addr.clone());
            lw.nwk_s_key = Some(act.f_nwk_s_int_key.clone());
            lw.app_s_key = Some(act.app_s_key.clone());
            lw.f_cnt_up = Some(act.f_cnt_up);
            lw.f_cnt_down = Some(act.a_f_cnt_down);
        }
        CredentialShape::None => {
            lw.activation_constraints = Some(
                if profile.supports_join { "otaa" } else { "abp" }.into(),
            );
        }
    }

    Ok(ttn::Device {
        app_id: app_id.to_string(),
        dev_id: dev_id.to_string(),
        description: device.description.clone(),
        latitude: None,
        longitude: None,
        lorawan_device: lw,
    })
}

// ── Uplink / downlink ───────────────────────────────────────────────

pub fn uplink_from_wire(
    network_id: &NetworkId,
    application_id: LocalId,
    msg: &ttn::UplinkMessage,
) -> Result<Uplink, CoreError> {
    let dev_eui = msg.hardware_serial.as_deref().map(DevEui::new).transpose()?;
    Ok(Uplink {
        network_id: network_id.clone(),
        application_id,
        device_id: RemoteId::new(msg.dev_id.as_str()),
        dev_eui,
        f_port: msg.port,
        f_cnt: msg.counter,
        payload: msg.payload_raw.clone(),
        decoded: None,
        correlation_id: None,
        received_at: Utc::now(),
    })
}
