// ChirpStack HTTP integration endpoints
//
// One HTTP integration per application, addressed by the application id.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::chirpstack::client::ChirpStackClient;
use crate::error::Error;

impl ChirpStackClient {
    /// `GET /api/applications/{id}/integrations/http`
    pub async fn get_http_integration<T: DeserializeOwned>(
        &self,
        application_id: &str,
    ) -> Result<T, Error> {
        self.get(&format!("applications/{application_id}/integrations/http"), &[])
            .await
    }

    /// `POST /api/applications/{id}/integrations/http`
    pub async fn create_http_integration<B: Serialize + Sync>(
        &self,
        application_id: &str,
        body: &B,
    ) -> Result<(), Error> {
        self.post_no_response(
            &format!("applications/{application_id}/integrations/http"),
            body,
        )
        .await
    }

    /// `PUT /api/applications/{id}/integrations/http`
    pub async fn update_http_integration<B: Serialize + Sync>(
        &self,
        application_id: &str,
        body: &B,
    ) -> Result<(), Error> {
        self.put(
            &format!("applications/{application_id}/integrations/http"),
            body,
        )
        .await
    }

    /// `DELETE /api/applications/{id}/integrations/http`
    pub async fn delete_http_integration(&self, application_id: &str) -> Result<(), Error> {
        self.delete(&format!("applications/{application_id}/integrations/http"))
            .await
    }
}
