// ChirpStack device endpoints
//
// Devices are addressed by DevEUI. Keys (OTAA) and activation (ABP) are
// separate sub-resources; which one applies depends on the profile.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::chirpstack::client::ChirpStackClient;
use crate::chirpstack::models::ListResponse;
use crate::error::Error;

impl ChirpStackClient {
    /// `GET /api/devices?applicationID=&limit=&offset=`
    pub async fn list_devices<T: DeserializeOwned>(
        &self,
        application_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<ListResponse<T>, Error> {
        let params = [
            ("applicationID", application_id.to_owned()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        self.get("devices", &params).await
    }

    /// `GET /api/devices/{devEUI}`
    pub async fn get_device<T: DeserializeOwned>(&self, dev_eui: &str) -> Result<T, Error> {
        self.get(&format!("devices/{dev_eui}"), &[]).await
    }

    /// `POST /api/devices`. The device is keyed by the DevEUI in the body,
    /// so the response carries no id.
    pub async fn create_device<B: Serialize + Sync>(&self, body: &B) -> Result<(), Error> {
        self.post_no_response("devices", body).await?;
        debug!("device created");
        Ok(())
    }

    /// `PUT /api/devices/{devEUI}`
    pub async fn update_device<B: Serialize + Sync>(
        &self,
        dev_eui: &str,
        body: &B,
    ) -> Result<(), Error> {
        self.put(&format!("devices/{dev_eui}"), body).await
    }

    /// `DELETE /api/devices/{devEUI}`
    pub async fn delete_device(&self, dev_eui: &str) -> Result<(), Error> {
        self.delete(&format!("devices/{dev_eui}")).await
    }

    // ── OTAA keys ────────────────────────────────────────────────────

    /// `GET /api/devices/{devEUI}/keys`
    pub async fn get_device_keys<T: DeserializeOwned>(&self, dev_eui: &str) -> Result<T, Error> {
        self.get(&format!("devices/{dev_eui}/keys"), &[]).await
    }

    /// `POST /api/devices/{devEUI}/keys`
    pub async fn create_device_keys<B: Serialize + Sync>(
        &self,
        dev_eui: &str,
        body: &B,
    ) -> Result<(), Error> {
        self.post_no_response(&format!("devices/{dev_eui}/keys"), body)
            .await
    }

    /// `PUT /api/devices/{devEUI}/keys`
    pub async fn update_device_keys<B: Serialize + Sync>(
        &self,
        dev_eui: &str,
        body: &B,
    ) -> Result<(), Error> {
        self.put(&format!("devices/{dev_eui}/keys"), body).await
    }

    // ── ABP activation ───────────────────────────────────────────────

    /// `GET /api/devices/{devEUI}/activation`
    pub async fn get_device_activation<T: DeserializeOwned>(
        &self,
        dev_eui: &str,
    ) -> Result<T, Error> {
        self.get(&format!("devices/{dev_eui}/activation"), &[]).await
    }

    /// `POST /api/devices/{devEUI}/activate`
    pub async fn activate_device<B: Serialize + Sync>(
        &self,
        dev_eui: &str,
        body: &B,
    ) -> Result<(), Error> {
        self.post_no_response(&format!("devices/{dev_eui}/activate"), body)
            .await
    }

    // ── Downlink queue ───────────────────────────────────────────────

    /// `POST /api/devices/{devEUI}/queue`
    pub async fn enqueue_downlink<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        dev_eui: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.post(&format!("devices/{dev_eui}/queue"), body).await
    }
}
