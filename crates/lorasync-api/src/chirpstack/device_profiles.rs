// ChirpStack device-profile endpoints

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::chirpstack::client::ChirpStackClient;
use crate::chirpstack::models::{CreatedResponse, ListResponse};
use crate::error::Error;

impl ChirpStackClient {
    /// List one page of device profiles, optionally scoped to an
    /// organization and/or the profiles usable by one application.
    ///
    /// `GET /api/device-profiles?limit=&offset=[&organizationID=][&applicationID=]`
    pub async fn list_device_profiles<T: DeserializeOwned>(
        &self,
        organization_id: Option<&str>,
        application_id: Option<&str>,
        offset: u32,
        limit: u32,
    ) -> Result<ListResponse<T>, Error> {
        let mut params = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(org) = organization_id {
            params.push(("organizationID", org.to_owned()));
        }
        if let Some(app) = application_id {
            params.push(("applicationID", app.to_owned()));
        }
        self.get("device-profiles", &params).await
    }

    /// `GET /api/device-profiles/{id}`
    pub async fn get_device_profile<T: DeserializeOwned>(&self, id: &str) -> Result<T, Error> {
        self.get(&format!("device-profiles/{id}"), &[]).await
    }

    /// `POST /api/device-profiles`, returning the allocated id.
    pub async fn create_device_profile<B: Serialize + Sync>(
        &self,
        body: &B,
    ) -> Result<String, Error> {
        let created: CreatedResponse = self.post("device-profiles", body).await?;
        debug!(id = %created.id, "device profile created");
        Ok(created.id)
    }

    /// `PUT /api/device-profiles/{id}`
    pub async fn update_device_profile<B: Serialize + Sync>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<(), Error> {
        self.put(&format!("device-profiles/{id}"), body).await
    }

    /// `DELETE /api/device-profiles/{id}`
    pub async fn delete_device_profile(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("device-profiles/{id}")).await
    }
}
