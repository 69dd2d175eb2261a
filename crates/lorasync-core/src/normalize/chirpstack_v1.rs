// ── ChirpStack v1 normalizer ──
//
// v1 still uses LoRaWAN 1.0 activation names: a single `nwkSKey` and a
// single `fCntDown`. Normalizing fans them out to the three 1.1 session
// keys and both downlink counters; denormalizing reads `fNwkSIntKey`
// and `aFCntDown` back.

use chrono::Utc;
use lorasync_api::chirpstack::models::{UplinkEvent, v1};

use super::{
    CredentialShape, credential_shape, mac_from_profile, profile_from_mac, required_relationship,
};
use crate::error::CoreError;
use crate::model::{
    Application, DevEui, Device, DeviceActivation, DeviceCredentials, DeviceKeys, DeviceProfile,
    LocalId, NetworkId, NetworkSettings, RemoteId, Uplink,
};

// ── Application ─────────────────────────────────────────────────────

pub fn application_from_wire(w: &v1::Application) -> Application {
    Application {
        name: w.name.clone(),
        description: w.description.clone(),
        payload_codec: w.payload_codec.clone(),
        payload_decoder: w.payload_decoder_script.clone(),
        payload_encoder: w.payload_encoder_script.clone(),
        base_url: None,
        organization_id: w.organization_id.clone(),
    }
}

pub fn application_to_wire(
    app: &Application,
    settings: &NetworkSettings,
) -> Result<v1::Application, CoreError> {
    let organization_id = required_relationship(
        "application",
        "organizationID",
        app.organization_id.as_deref(),
        settings.organization_id.as_deref(),
    )?;
    let service_profile_id = settings
        .service_profile_id
        .clone()
        .ok_or_else(|| CoreError::validation("network has no serviceProfileID configured"))?;

    Ok(v1::Application {
        id: None,
        name: app.name.clone(),
        description: app.description.clone(),
        organization_id: Some(organization_id),
        service_profile_id: Some(service_profile_id),
        payload_codec: app.payload_codec.clone(),
        payload_encoder_script: app.payload_encoder.clone(),
        payload_decoder_script: app.payload_decoder.clone(),
    })
}

// ── Device profile ──────────────────────────────────────────────────

pub fn device_profile_from_wire(w: &v1::DeviceProfile) -> DeviceProfile {
    profile_from_mac(
        &w.name,
        w.organization_id.as_deref(),
        w.network_server_id.as_deref(),
        &w.device_profile,
    )
}

pub fn device_profile_to_wire(
    profile: &DeviceProfile,
    settings: &NetworkSettings,
) -> Result<v1::DeviceProfile, CoreError> {
    let organization_id = required_relationship(
        "device profile",
        "organizationID",
        profile.organization_id.as_deref(),
        settings.organization_id.as_deref(),
    )?;
    let network_server_id = required_relationship(
        "device profile",
        "networkServerID",
        profile.network_server_id.as_deref(),
        settings.network_server_id.as_deref(),
    )?;

    Ok(v1::DeviceProfile {
        device_profile_id: None,
        name: profile.name.clone(),
        organization_id: Some(organization_id),
        network_server_id: Some(network_server_id),
        device_profile: mac_from_profile(profile),
    })
}

// ── Device ──────────────────────────────────────────────────────────

/// Normalize a device. Only the credential body matching the profile's
/// join support is used.
pub fn device_from_wire(
    w: &v1::Device,
    profile: &DeviceProfile,
    keys: Option<&v1::DeviceKeys>,
    activation: Option<&v1::DeviceActivation>,
) -> Result<Device, CoreError> {
    let credentials = if profile.supports_join {
        keys.map(|k| {
            DeviceCredentials::Keys(DeviceKeys {
                app_key: k.app_key.clone(),
                ..Default::default()
            })
        })
    } else {
        activation.map(|a| DeviceCredentials::Activation(activation_from_wire(a)))
    };

    Ok(Device {
        dev_eui: DevEui::new(&w.dev_eui)?,
        name: w.name.clone(),
        description: w.description.clone(),
        skip_f_cnt_check: activation.is_some_and(|a| a.skip_f_cnt_check),
        credentials,
    })
}

pub fn device_to_wire(
    device: &Device,
    application_id: &RemoteId,
    device_profile_id: &RemoteId,
) -> v1::Device {
    v1::Device {
        dev_eui: device.dev_eui.to_string(),
        name: device.name.clone(),
        description: device.description.clone(),
        application_id: Some(application_id.to_string()),
        device_profile_id: Some(device_profile_id.to_string()),
    }
}

/// `nwkSKey` fills every network session key; `fCntDown` both counters.
pub fn activation_from_wire(a: &v1::DeviceActivation) -> DeviceActivation {
    DeviceActivation {
        dev_addr: a.dev_addr.clone(),
        app_s_key: a.app_s_key.clone(),
        nwk_s_enc_key: a.nwk_s_key.clone(),
        s_nwk_s_int_key: a.nwk_s_key.clone(),
        f_nwk_s_int_key: a.nwk_s_key.clone(),
        f_cnt_up: a.f_cnt_up,
        n_f_cnt_down: a.f_cnt_down,
        a_f_cnt_down: a.f_cnt_down,
    }
}

pub fn activation_to_wire(device: &Device, a: &DeviceActivation) -> v1::DeviceActivation {
    v1::DeviceActivation {
        dev_eui: Some(device.dev_eui.to_string()),
        dev_addr: a.dev_addr.clone(),
        app_s_key: a.app_s_key.clone(),
        nwk_s_key: a.f_nwk_s_int_key.clone(),
        f_cnt_up: a.f_cnt_up,
        f_cnt_down: a.a_f_cnt_down,
        skip_f_cnt_check: device.skip_f_cnt_check,
    }
}

pub fn keys_to_wire(device: &Device, keys: &DeviceKeys) -> v1::DeviceKeysRequest {
    v1::DeviceKeysRequest {
        dev_eui: Some(device.dev_eui.to_string()),
        device_keys: v1::DeviceKeys {
            app_key: keys.app_key.clone().or_else(|| keys.nwk_key.clone()),
        },
    }
}

/// Wire bodies for a device's credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialsBody {
    Keys(v1::DeviceKeysRequest),
    Activation(v1::DeviceActivation),
}

pub fn credentials_to_wire(
    device: &Device,
    profile: &DeviceProfile,
) -> Result<Option<CredentialsBody>, CoreError> {
    Ok(
        match credential_shape(device.credentials.as_ref(), profile)? {
            CredentialShape::Keys(keys) => Some(CredentialsBody::Keys(keys_to_wire(device, keys))),
            CredentialShape::Activation(act) => {
                Some(CredentialsBody::Activation(activation_to_wire(device, act)))
            }
            CredentialShape::None => None,
        },
    )
}

// ── Uplink ──────────────────────────────────────────────────────────

/// Both ChirpStack generations deliver the same uplink event shape.
pub fn uplink_from_wire(
    network_id: &NetworkId,
    application_id: LocalId,
    event: &UplinkEvent,
) -> Result<Uplink, CoreError> {
    let dev_eui = DevEui::new(&event.dev_eui)?;
    Ok(Uplink {
        network_id: network_id.clone(),
        application_id,
        device_id: RemoteId::new(dev_eui.as_str()),
        dev_eui: Some(dev_eui),
        f_port: event.f_port,
        f_cnt: event.f_cnt,
        payload: event.data.clone(),
        decoded: event.object.clone(),
        correlation_id: None,
        received_at: Utc::now(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings() -> NetworkSettings {
        NetworkSettings {
            organization_id: Some("7".into()),
            service_profile_id: Some("sp-1".into()),
            network_server_id: Some("3".into()),
            handler_id: None,
        }
    }

    fn abp_profile() -> DeviceProfile {
        DeviceProfile {
            name: "ABP".into(),
            mac_version: Some("1.0.2".into()),
            ..Default::default()
        }
    }

    #[test]
    fn nwk_s_key_survives_normalize_then_denormalize() {
        let wire = v1::DeviceActivation {
            dev_eui: None,
            dev_addr: "26011b2c".into(),
            app_s_key: "A".into(),
            nwk_s_key: "K".into(),
            f_cnt_up: 10,
            f_cnt_down: 4,
            skip_f_cnt_check: false,
        };
        let act = activation_from_wire(&wire);
        assert_eq!(act.f_nwk_s_int_key, "K");
        assert_eq!(act.nwk_s_enc_key, "K");
        assert_eq!(act.s_nwk_s_int_key, "K");
        assert_eq!(act.a_f_cnt_down, 4);
        assert_eq!(act.n_f_cnt_down, 4);

        let device = Device::new(DevEui::new("0004a30b001c0531").unwrap(), "abp");
        let back = activation_to_wire(&device, &act);
        assert_eq!(back.nwk_s_key, "K");
        assert_eq!(back.f_cnt_down, 4);
    }

    #[test]
    fn abp_device_round_trips() {
        let device = Device {
            dev_eui: DevEui::new("0004a30b001c0531").unwrap(),
            name: "abp-1".into(),
            description: Some("meter".into()),
            skip_f_cnt_check: true,
            credentials: Some(DeviceCredentials::Activation(DeviceActivation {
                dev_addr: "26011b2c".into(),
                app_s_key: "A".into(),
                nwk_s_enc_key: "K".into(),
                s_nwk_s_int_key: "K".into(),
                f_nwk_s_int_key: "K".into(),
                f_cnt_up: 1,
                n_f_cnt_down: 2,
                a_f_cnt_down: 2,
            })),
        };
        let profile = abp_profile();

        let wire = device_to_wire(&device, &RemoteId::new("12"), &RemoteId::new("dp-1"));
        let Some(CredentialsBody::Activation(act)) =
            credentials_to_wire(&device, &profile).unwrap()
        else {
            panic!("expected activation body");
        };

        let back = device_from_wire(&wire, &profile, None, Some(&act)).unwrap();
        assert_eq!(back, device);
    }

    #[test]
    fn otaa_device_round_trips() {
        let device = Device {
            dev_eui: DevEui::new("0004a30b001c0530").unwrap(),
            name: "otaa-1".into(),
            description: None,
            skip_f_cnt_check: false,
            credentials: Some(DeviceCredentials::Keys(DeviceKeys {
                app_key: Some("2b7e151628aed2a6abf7158809cf4f3c".into()),
                ..Default::default()
            })),
        };
        let profile = DeviceProfile {
            supports_join: true,
            ..abp_profile()
        };

        let wire = device_to_wire(&device, &RemoteId::new("12"), &RemoteId::new("dp-1"));
        let Some(CredentialsBody::Keys(keys)) = credentials_to_wire(&device, &profile).unwrap()
        else {
            panic!("expected keys body");
        };

        let back = device_from_wire(&wire, &profile, Some(&keys.device_keys), None).unwrap();
        assert_eq!(back, device);
        assert!(back.device_activation().is_none());
    }

    #[test]
    fn application_round_trips() {
        let app = Application {
            name: "Acme".into(),
            description: Some("Acme sensors".into()),
            payload_codec: Some("CUSTOM_JS".into()),
            payload_decoder: Some("function Decode() {}".into()),
            payload_encoder: None,
            base_url: None,
            organization_id: Some("7".into()),
        };
        let wire = application_to_wire(&app, &settings()).unwrap();
        assert_eq!(wire.service_profile_id.as_deref(), Some("sp-1"));
        assert_eq!(application_from_wire(&wire), app);
    }

    #[test]
    fn profile_from_foreign_organization_is_rejected() {
        let profile = DeviceProfile {
            name: "foreign".into(),
            organization_id: Some("99".into()),
            ..Default::default()
        };
        let err = device_profile_to_wire(&profile, &settings()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::RelationshipMismatch {
                field: "organizationID",
                ..
            }
        ));
    }

    #[test]
    fn profile_round_trips() {
        let profile = DeviceProfile {
            name: "Class C".into(),
            organization_id: Some("7".into()),
            network_server_id: Some("3".into()),
            mac_version: Some("1.0.2".into()),
            reg_params_revision: Some("B".into()),
            rf_region: Some("EU868".into()),
            supports_join: true,
            supports_32bit_fcnt: Some(true),
            supports_class_c: Some(true),
            class_c_timeout: Some(5),
            factory_preset_freqs: vec![868_100_000, 868_300_000],
            ..Default::default()
        };
        let wire = device_profile_to_wire(&profile, &settings()).unwrap();
        assert_eq!(device_profile_from_wire(&wire), profile);
    }
}
