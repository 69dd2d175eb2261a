// ChirpStack application endpoints
//
// Bodies are generic: callers pass `models::v1::Application` or
// `models::v2::ApplicationEnvelope` depending on the server generation.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::chirpstack::client::ChirpStackClient;
use crate::chirpstack::models::{CreatedResponse, ListResponse};
use crate::error::Error;

impl ChirpStackClient {
    /// List one page of applications.
    ///
    /// `GET /api/applications?limit=&offset=[&organizationID=]`
    pub async fn list_applications<T: DeserializeOwned>(
        &self,
        organization_id: Option<&str>,
        offset: u32,
        limit: u32,
    ) -> Result<ListResponse<T>, Error> {
        let mut params = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(org) = organization_id {
            params.push(("organizationID", org.to_owned()));
        }
        self.get("applications", &params).await
    }

    /// `GET /api/applications/{id}`
    pub async fn get_application<T: DeserializeOwned>(&self, id: &str) -> Result<T, Error> {
        self.get(&format!("applications/{id}"), &[]).await
    }

    /// `POST /api/applications`, returning the allocated id.
    pub async fn create_application<B: Serialize + Sync>(&self, body: &B) -> Result<String, Error> {
        let created: CreatedResponse = self.post("applications", body).await?;
        debug!(id = %created.id, "application created");
        Ok(created.id)
    }

    /// `PUT /api/applications/{id}`
    pub async fn update_application<B: Serialize + Sync>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<(), Error> {
        self.put(&format!("applications/{id}"), body).await
    }

    /// `DELETE /api/applications/{id}`
    pub async fn delete_application(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("applications/{id}")).await
    }
}
