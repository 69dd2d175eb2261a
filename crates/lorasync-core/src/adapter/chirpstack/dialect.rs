// ── ChirpStack wire dialects ──
//
// Both API generations share endpoints, auth and error handling and
// differ only in body shapes. A `Dialect` names one generation's wire
// types and maps them to and from canonical entities; the adapter is
// written once against it.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lorasync_api::chirpstack::models::{v1, v2};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::adapter::{IntegrationTarget, Remote};
use crate::error::CoreError;
use crate::model::{
    Application, Device, DeviceProfile, DownlinkArgs, NetworkSettings, RemoteId,
};
use crate::normalize::{chirpstack_v1, chirpstack_v2};

/// Credential bodies for a device, keyed by join support.
pub(super) enum Credentials<K, A> {
    Keys(K),
    Activation(A),
}

pub(super) trait Dialect: Send + Sync + 'static {
    type ApplicationRow: DeserializeOwned + Send;
    /// Body of `GET`, `POST` and `PUT /api/applications`.
    type Application: DeserializeOwned + Serialize + Send + Sync;
    type ProfileRow: DeserializeOwned + Send;
    type Profile: DeserializeOwned + Serialize + Send + Sync;
    type DeviceRow: DeserializeOwned + Send + Sync;
    type Device: Serialize + Send + Sync;
    /// Read from `/keys` and written back to it.
    type Keys: DeserializeOwned + Serialize + Send + Sync;
    /// Read from `/activation`, written to `/activate`.
    type Activation: DeserializeOwned + Serialize + Send + Sync;
    type Integration: Serialize + Send + Sync;
    type QueueItem: Serialize + Send + Sync;

    fn application_from_row(row: &Self::ApplicationRow) -> Result<Remote<Application>, CoreError>;
    fn application_from_wire(w: &Self::Application) -> Application;
    fn application_to_wire(
        app: &Application,
        settings: &NetworkSettings,
        id: Option<&RemoteId>,
    ) -> Result<Self::Application, CoreError>;

    fn profile_row_id(row: &Self::ProfileRow) -> Result<RemoteId, CoreError>;
    fn profile_from_wire(w: &Self::Profile) -> DeviceProfile;
    fn profile_to_wire(
        profile: &DeviceProfile,
        settings: &NetworkSettings,
        id: Option<&RemoteId>,
    ) -> Result<Self::Profile, CoreError>;

    fn device_row_dev_eui(row: &Self::DeviceRow) -> &str;
    fn device_row_profile_id(row: &Self::DeviceRow) -> Option<&String>;
    fn device_from_wire(
        row: &Self::DeviceRow,
        profile: &DeviceProfile,
        keys: Option<&Self::Keys>,
        activation: Option<&Self::Activation>,
    ) -> Result<Device, CoreError>;
    fn device_to_wire(device: &Device, application_id: &RemoteId, profile_id: &RemoteId)
    -> Self::Device;

    /// `Err` when the credentials contradict the profile's join support.
    fn credentials_to_wire(
        device: &Device,
        profile: &DeviceProfile,
    ) -> Result<Option<Credentials<Self::Keys, Self::Activation>>, CoreError>;

    fn integration(target: &IntegrationTarget, application_id: &str) -> Self::Integration;
    fn queue_item(args: &DownlinkArgs) -> Self::QueueItem;
}

pub(super) fn row_id(id: Option<&String>, entity: &str) -> Result<RemoteId, CoreError> {
    id.map(|id| RemoteId::new(id.as_str()))
        .ok_or_else(|| CoreError::Internal(format!("{entity} row without an id")))
}

// ── LoRa App Server 1.x ─────────────────────────────────────────────

pub(super) struct V1;

impl Dialect for V1 {
    type ApplicationRow = v1::Application;
    type Application = v1::Application;
    type ProfileRow = v1::DeviceProfile;
    type Profile = v1::DeviceProfile;
    type DeviceRow = v1::Device;
    type Device = v1::Device;
    type Keys = v1::DeviceKeysRequest;
    type Activation = v1::DeviceActivation;
    type Integration = v1::HttpIntegration;
    type QueueItem = v1::DeviceQueueItem;

    fn application_from_row(row: &v1::Application) -> Result<Remote<Application>, CoreError> {
        Ok(Remote::new(
            row_id(row.id.as_ref(), "application")?,
            chirpstack_v1::application_from_wire(row),
        ))
    }

    fn application_from_wire(w: &v1::Application) -> Application {
        chirpstack_v1::application_from_wire(w)
    }

    fn application_to_wire(
        app: &Application,
        settings: &NetworkSettings,
        id: Option<&RemoteId>,
    ) -> Result<v1::Application, CoreError> {
        let mut body = chirpstack_v1::application_to_wire(app, settings)?;
        body.id = id.map(ToString::to_string);
        Ok(body)
    }

    fn profile_row_id(row: &v1::DeviceProfile) -> Result<RemoteId, CoreError> {
        row_id(row.device_profile_id.as_ref(), "device profile")
    }

    fn profile_from_wire(w: &v1::DeviceProfile) -> DeviceProfile {
        chirpstack_v1::device_profile_from_wire(w)
    }

    fn profile_to_wire(
        profile: &DeviceProfile,
        settings: &NetworkSettings,
        id: Option<&RemoteId>,
    ) -> Result<v1::DeviceProfile, CoreError> {
        let mut body = chirpstack_v1::device_profile_to_wire(profile, settings)?;
        body.device_profile_id = id.map(ToString::to_string);
        Ok(body)
    }

    fn device_row_dev_eui(row: &v1::Device) -> &str {
        &row.dev_eui
    }

    fn device_row_profile_id(row: &v1::Device) -> Option<&String> {
        row.device_profile_id.as_ref()
    }

    fn device_from_wire(
        row: &v1::Device,
        profile: &DeviceProfile,
        keys: Option<&v1::DeviceKeysRequest>,
        activation: Option<&v1::DeviceActivation>,
    ) -> Result<Device, CoreError> {
        chirpstack_v1::device_from_wire(row, profile, keys.map(|k| &k.device_keys), activation)
    }

    fn device_to_wire(device: &Device, application_id: &RemoteId, profile_id: &RemoteId) -> v1::Device {
        chirpstack_v1::device_to_wire(device, application_id, profile_id)
    }

    fn credentials_to_wire(
        device: &Device,
        profile: &DeviceProfile,
    ) -> Result<Option<Credentials<v1::DeviceKeysRequest, v1::DeviceActivation>>, CoreError> {
        Ok(
            chirpstack_v1::credentials_to_wire(device, profile)?.map(|body| match body {
                chirpstack_v1::CredentialsBody::Keys(k) => Credentials::Keys(k),
                chirpstack_v1::CredentialsBody::Activation(a) => Credentials::Activation(a),
            }),
        )
    }

    fn integration(target: &IntegrationTarget, application_id: &str) -> v1::HttpIntegration {
        target.chirpstack_v1(application_id)
    }

    fn queue_item(args: &DownlinkArgs) -> v1::DeviceQueueItem {
        v1::DeviceQueueItem {
            dev_eui: args.device_id.to_string(),
            confirmed: args.downlink.confirmed,
            f_port: args.downlink.f_port,
            data: STANDARD.encode(&args.downlink.data),
        }
    }
}

// ── ChirpStack 2.x ──────────────────────────────────────────────────

pub(super) struct V2;

impl Dialect for V2 {
    type ApplicationRow = v2::Application;
    type Application = v2::ApplicationEnvelope;
    type ProfileRow = v2::DeviceProfileListItem;
    type Profile = v2::DeviceProfileEnvelope;
    type DeviceRow = v2::Device;
    type Device = v2::DeviceEnvelope;
    type Keys = v2::DeviceKeysEnvelope;
    type Activation = v2::DeviceActivationEnvelope;
    type Integration = v2::HttpIntegrationEnvelope;
    type QueueItem = v2::DeviceQueueItemEnvelope;

    fn application_from_row(row: &v2::Application) -> Result<Remote<Application>, CoreError> {
        Ok(Remote::new(
            row_id(row.id.as_ref(), "application")?,
            chirpstack_v2::application_from_wire(row),
        ))
    }

    fn application_from_wire(w: &v2::ApplicationEnvelope) -> Application {
        chirpstack_v2::application_from_wire(&w.application)
    }

    fn application_to_wire(
        app: &Application,
        settings: &NetworkSettings,
        id: Option<&RemoteId>,
    ) -> Result<v2::ApplicationEnvelope, CoreError> {
        let mut body = chirpstack_v2::application_to_wire(app, settings)?;
        body.application.id = id.map(ToString::to_string);
        Ok(body)
    }

    fn profile_row_id(row: &v2::DeviceProfileListItem) -> Result<RemoteId, CoreError> {
        Ok(RemoteId::new(row.id.as_str()))
    }

    fn profile_from_wire(w: &v2::DeviceProfileEnvelope) -> DeviceProfile {
        chirpstack_v2::device_profile_from_wire(&w.device_profile)
    }

    fn profile_to_wire(
        profile: &DeviceProfile,
        settings: &NetworkSettings,
        id: Option<&RemoteId>,
    ) -> Result<v2::DeviceProfileEnvelope, CoreError> {
        let mut body = chirpstack_v2::device_profile_to_wire(profile, settings)?;
        body.device_profile.id = id.map(ToString::to_string);
        Ok(body)
    }

    fn device_row_dev_eui(row: &v2::Device) -> &str {
        &row.dev_eui
    }

    fn device_row_profile_id(row: &v2::Device) -> Option<&String> {
        row.device_profile_id.as_ref()
    }

    fn device_from_wire(
        row: &v2::Device,
        profile: &DeviceProfile,
        keys: Option<&v2::DeviceKeysEnvelope>,
        activation: Option<&v2::DeviceActivationEnvelope>,
    ) -> Result<Device, CoreError> {
        chirpstack_v2::device_from_wire(
            row,
            profile,
            keys.map(|k| &k.device_keys),
            activation.map(|a| &a.device_activation),
        )
    }

    fn device_to_wire(
        device: &Device,
        application_id: &RemoteId,
        profile_id: &RemoteId,
    ) -> v2::DeviceEnvelope {
        chirpstack_v2::device_to_wire(device, application_id, profile_id)
    }

    fn credentials_to_wire(
        device: &Device,
        profile: &DeviceProfile,
    ) -> Result<Option<Credentials<v2::DeviceKeysEnvelope, v2::DeviceActivationEnvelope>>, CoreError>
    {
        Ok(
            chirpstack_v2::credentials_to_wire(device, profile)?.map(|body| match body {
                chirpstack_v2::CredentialsBody::Keys(k) => Credentials::Keys(k),
                chirpstack_v2::CredentialsBody::Activation(a) => Credentials::Activation(a),
            }),
        )
    }

    fn integration(target: &IntegrationTarget, application_id: &str) -> v2::HttpIntegrationEnvelope {
        target.chirpstack_v2(application_id)
    }

    fn queue_item(args: &DownlinkArgs) -> v2::DeviceQueueItemEnvelope {
        v2::DeviceQueueItemEnvelope {
            device_queue_item: v2::DeviceQueueItem {
                dev_eui: args.device_id.to_string(),
                confirmed: args.downlink.confirmed,
                f_port: args.downlink.f_port,
                data: STANDARD.encode(&args.downlink.data),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Downlink;

    fn args() -> DownlinkArgs {
        DownlinkArgs {
            application_id: RemoteId::new("1"),
            device_id: RemoteId::new("0004a30b001c0530"),
            downlink: Downlink {
                f_port: 2,
                confirmed: true,
                data: vec![0x01, 0xff],
            },
        }
    }

    #[test]
    fn queue_items_differ_only_in_envelope() {
        let bare = serde_json::to_value(V1::queue_item(&args())).unwrap();
        let wrapped = serde_json::to_value(V2::queue_item(&args())).unwrap();
        assert_eq!(wrapped["deviceQueueItem"], bare);
        assert_eq!(bare["data"], "Af8=");
    }

    #[test]
    fn update_bodies_carry_the_remote_id() {
        let app = Application {
            name: "Acme".into(),
            ..Default::default()
        };
        let settings = NetworkSettings {
            organization_id: Some("1".into()),
            service_profile_id: Some("sp".into()),
            ..Default::default()
        };
        let id = RemoteId::new("9");

        let created = V1::application_to_wire(&app, &settings, None).unwrap();
        assert_eq!(created.id, None);
        let updated = V2::application_to_wire(&app, &settings, Some(&id)).unwrap();
        assert_eq!(updated.application.id.as_deref(), Some("9"));
    }
}
