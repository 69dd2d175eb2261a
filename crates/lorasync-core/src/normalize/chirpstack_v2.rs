// ── ChirpStack v2 normalizer ──
//
// Same logical fields as v1, wrapped in named envelopes on every
// create/update. Activation uses the 1.1 key split; for MAC 1.0.x the
// server only fills `fNwkSIntKey`, which is copied into the other two.

use lorasync_api::chirpstack::models::v2;

use super::{
    CredentialShape, credential_shape, mac_from_profile, profile_from_mac, required_relationship,
};
use crate::error::CoreError;
use crate::model::{
    Application, DevEui, Device, DeviceActivation, DeviceCredentials, DeviceKeys, DeviceProfile,
    NetworkSettings, RemoteId,
};

pub use super::chirpstack_v1::uplink_from_wire;

// ── Application ─────────────────────────────────────────────────────

pub fn application_from_wire(w: &v2::Application) -> Application {
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
) -> Result<v2::ApplicationEnvelope, CoreError> {
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

    Ok(v2::ApplicationEnvelope {
        application: v2::Application {
            id: None,
            name: app.name.clone(),
            description: app.description.clone(),
            organization_id: Some(organization_id),
            service_profile_id: Some(service_profile_id),
            payload_codec: app.payload_codec.clone(),
            payload_encoder_script: app.payload_encoder.clone(),
            payload_decoder_script: app.payload_decoder.clone(),
        },
    })
}

// ── Device profile ──────────────────────────────────────────────────

pub fn device_profile_from_wire(w: &v2::DeviceProfile) -> DeviceProfile {
    profile_from_mac(
        &w.name,
        w.organization_id.as_deref(),
        w.network_server_id.as_deref(),
        &w.mac,
    )
}

pub fn device_profile_to_wire(
    profile: &DeviceProfile,
    settings: &NetworkSettings,
) -> Result<v2::DeviceProfileEnvelope, CoreError> {
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

    Ok(v2::DeviceProfileEnvelope {
        device_profile: v2::DeviceProfile {
            id: None,
            name: profile.name.clone(),
            organization_id: Some(organization_id),
            network_server_id: Some(network_server_id),
            mac: mac_from_profile(profile),
        },
    })
}

// ── Device ──────────────────────────────────────────────────────────

pub fn device_from_wire(
    w: &v2::Device,
    profile: &DeviceProfile,
    keys: Option<&v2::DeviceKeys>,
    activation: Option<&v2::DeviceActivation>,
) -> Result<Device, CoreError> {
    let credentials = if profile.supports_join {
        keys.map(|k| {
            DeviceCredentials::Keys(DeviceKeys {
                app_key: k.app_key.clone(),
                nwk_key: k.nwk_key.clone(),
                gen_app_key: k.gen_app_key.clone(),
                app_eui: None,
            })
        })
    } else {
        activation.map(|a| DeviceCredentials::Activation(activation_from_wire(a, profile)))
    };

    Ok(Device {
        dev_eui: DevEui::new(&w.dev_eui)?,
        name: w.name.clone(),
        description: w.description.clone(),
        skip_f_cnt_check: w.skip_f_cnt_check,
        credentials,
    })
}

pub fn device_to_wire(
    device: &Device,
    application_id: &RemoteId,
    device_profile_id: &RemoteId,
) -> v2::DeviceEnvelope {
    v2::DeviceEnvelope {
        device: v2::Device {
            dev_eui: device.dev_eui.to_string(),
            name: device.name.clone(),
            description: device.description.clone(),
            application_id: Some(application_id.to_string()),
            device_profile_id: Some(device_profile_id.to_string()),
            skip_f_cnt_check: device.skip_f_cnt_check,
        },
    }
}

pub fn activation_from_wire(a: &v2::DeviceActivation, profile: &DeviceProfile) -> DeviceActivation {
    let (nwk_s_enc_key, s_nwk_s_int_key) = if profile.is_lorawan_1_0() {
        (a.f_nwk_s_int_key.clone(), a.f_nwk_s_int_key.clone())
    } else {
        (a.nwk_s_enc_key.clone(), a.s_nwk_s_int_key.clone())
    };

    DeviceActivation {
        dev_addr: a.dev_addr.clone(),
        app_s_key: a.app_s_key.clone(),
        nwk_s_enc_key,
        s_nwk_s_int_key,
        f_nwk_s_int_key: a.f_nwk_s_int_key.clone(),
        f_cnt_up: a.f_cnt_up,
        n_f_cnt_down: a.n_f_cnt_down,
        a_f_cnt_down: a.a_f_cnt_down,
    }
}

pub fn activation_to_wire(
    device: &Device,
    a: &DeviceActivation,
    profile: &DeviceProfile,
) -> v2::DeviceActivationEnvelope {
    let (nwk_s_enc_key, s_nwk_s_int_key) = if profile.is_lorawan_1_0() {
        (a.f_nwk_s_int_key.clone(), a.f_nwk_s_int_key.clone())
    } else {
        (a.nwk_s_enc_key.clone(), a.s_nwk_s_int_key.clone())
    };

    v2::DeviceActivationEnvelope {
        device_activation: v2::DeviceActivation {
            dev_eui: Some(device.dev_eui.to_string()),
            dev_addr: a.dev_addr.clone(),
            app_s_key: a.app_s_key.clone(),
            nwk_s_enc_key,
            s_nwk_s_int_key,
            f_nwk_s_int_key: a.f_nwk_s_int_key.clone(),
            f_cnt_up: a.f_cnt_up,
            n_f_cnt_down: a.n_f_cnt_down,
            a_f_cnt_down: a.a_f_cnt_down,
            skip_f_cnt_check: device.skip_f_cnt_check,
        },
    }
}

pub fn keys_to_wire(device: &Device, keys: &DeviceKeys) -> v2::DeviceKeysEnvelope {
    v2::DeviceKeysEnvelope {
        device_keys: v2::DeviceKeys {
            dev_eui: Some(device.dev_eui.to_string()),
            app_key: keys.app_key.clone(),
            nwk_key: keys.nwk_key.clone(),
            gen_app_key: keys.gen_app_key.clone(),
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialsBody {
    Keys(v2::DeviceKeysEnvelope),
    Activation(v2::DeviceActivationEnvelope),
}

pub fn credentials_to_wire(
    device: &Device,
    profile: &DeviceProfile,
) -> Result<Option<CredentialsBody>, CoreError> {
    Ok(
        match credential_shape(device.credentials.as_ref(), profile)? {
            CredentialShape::Keys(keys) => Some(CredentialsBody::Keys(keys_to_wire(device, keys))),
            CredentialShape::Activation(act) => Some(CredentialsBody::Activation(
                activation_to_wire(device, act, profile),
            )),
            CredentialShape::None => None,
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn profile(mac_version: &str, supports_join: bool) -> DeviceProfile {
        DeviceProfile {
            name: "p".into(),
            mac_version: Some(mac_version.into()),
            supports_join,
            ..Default::default()
        }
    }

    #[test]
    fn mac_1_0_activation_copies_fnwk_key() {
        let wire = v2::DeviceActivation {
            dev_addr: "26011b2c".into(),
            app_s_key: "A".into(),
            f_nwk_s_int_key: "K".into(),
            ..Default::default()
        };
        let act = activation_from_wire(&wire, &profile("1.0.2", false));
        assert_eq!(act.s_nwk_s_int_key, "K");
        assert_eq!(act.nwk_s_enc_key, "K");
        assert_eq!(act.f_nwk_s_int_key, "K");
    }

    #[test]
    fn mac_1_1_activation_keeps_split_keys() {
        let wire = v2::DeviceActivation {
            dev_addr: "26011b2c".into(),
            app_s_key: "A".into(),
            nwk_s_enc_key: "E".into(),
            s_nwk_s_int_key: "S".into(),
            f_nwk_s_int_key: "F".into(),
            ..Default::default()
        };
        let act = activation_from_wire(&wire, &profile("1.1.0", false));
        assert_eq!(
            (act.nwk_s_enc_key.as_str(), act.s_nwk_s_int_key.as_str()),
            ("E", "S")
        );
    }

    #[test]
    fn create_bodies_are_enveloped() {
        let settings = NetworkSettings {
            organization_id: Some("7".into()),
            service_profile_id: Some("sp-1".into()),
            network_server_id: Some("3".into()),
            handler_id: None,
        };
        let app = Application {
            name: "Acme".into(),
            ..Default::default()
        };
        let body = serde_json::to_value(application_to_wire(&app, &settings).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "application": {
                    "name": "Acme",
                    "organizationID": "7",
                    "serviceProfileID": "sp-1"
                }
            })
        );

        let dp = serde_json::to_value(
            device_profile_to_wire(&profile("1.0.2", true), &settings).unwrap(),
        )
        .unwrap();
        assert_eq!(dp["deviceProfile"]["networkServerID"], "3");
        assert_eq!(dp["deviceProfile"]["macVersion"], "1.0.2");
        assert_eq!(dp["deviceProfile"]["supportsJoin"], true);
    }

    #[test]
    fn network_server_mismatch_is_rejected() {
        let settings = NetworkSettings {
            organization_id: Some("7".into()),
            network_server_id: Some("3".into()),
            ..Default::default()
        };
        let dp = DeviceProfile {
            network_server_id: Some("4".into()),
            ..profile("1.0.2", true)
        };
        assert!(matches!(
            device_profile_to_wire(&dp, &settings),
            Err(CoreError::RelationshipMismatch {
                field: "networkServerID",
                ..
            })
        ));
    }

    #[test]
    fn abp_device_round_trips_for_mac_1_0() {
        let p = profile("1.0.3", false);
        let device = Device {
            dev_eui: DevEui::new("0004a30b001c0531").unwrap(),
            name: "abp-1".into(),
            description: None,
            skip_f_cnt_check: false,
            credentials: Some(DeviceCredentials::Activation(DeviceActivation {
                dev_addr: "26011b2c".into(),
                app_s_key: "A".into(),
                nwk_s_enc_key: "K".into(),
                s_nwk_s_int_key: "K".into(),
                f_nwk_s_int_key: "K".into(),
                f_cnt_up: 3,
                n_f_cnt_down: 1,
                a_f_cnt_down: 2,
            })),
        };

        let wire = device_to_wire(&device, &RemoteId::new("12"), &RemoteId::new("dp-1"));
        let Some(CredentialsBody::Activation(env)) = credentials_to_wire(&device, &p).unwrap()
        else {
            panic!("expected activation body");
        };
        let back =
            device_from_wire(&wire.device, &p, None, Some(&env.device_activation)).unwrap();
        assert_eq!(back, device);
    }

    #[test]
    fn otaa_device_round_trips() {
        let p = profile("1.1.0", true);
        let device = Device {
            dev_eui: DevEui::new("0004a30b001c0530").unwrap(),
            name: "otaa-1".into(),
            description: Some("tracker".into()),
            skip_f_cnt_check: false,
            credentials: Some(DeviceCredentials::Keys(DeviceKeys {
                app_key: Some("aa".into()),
                nwk_key: Some("bb".into()),
                gen_app_key: None,
                app_eui: None,
            })),
        };

        let wire = device_to_wire(&device, &RemoteId::new("12"), &RemoteId::new("dp-1"));
        let Some(CredentialsBody::Keys(env)) = credentials_to_wire(&device, &p).unwrap() else {
            panic!("expected keys body");
        };
        let back = device_from_wire(&wire.device, &p, Some(&env.device_keys), None).unwrap();
        assert_eq!(back, device);
    }
}
