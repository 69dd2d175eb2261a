// TTN application endpoints (account server + handler registration)

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::ttn::client::{Server, TtnClient};
use crate::ttn::models::{Application, HandlerApplication, HttpIntegration};

impl TtnClient {
    /// `GET {account}/applications`
    pub async fn list_applications(&self) -> Result<Vec<Application>, Error> {
        self.get(Server::Account, "applications").await
    }

    /// `GET {account}/applications/{id}`
    pub async fn get_application(&self, app_id: &str) -> Result<Application, Error> {
        self.get(Server::Account, &format!("applications/{app_id}"))
            .await
    }

    /// `POST {account}/applications`
    ///
    /// The application is not usable for devices until it is registered
    /// with the handler.
    pub async fn create_application(&self, app: &Application) -> Result<(), Error> {
        self.post(Server::Account, "applications", app).await
    }

    /// `POST {handler}/applications`
    ///
    /// A handler that already knows the application answers with a
    /// conflict, which is treated as success.
    pub async fn register_handler_application(&self, app_id: &str) -> Result<(), Error> {
        match self
            .post(Server::Handler, "applications", &json!({ "app_id": app_id }))
            .await
        {
            Err(e) if e.is_conflict() => Ok(()),
            other => {
                other?;
                debug!(app_id, "application registered with handler");
                Ok(())
            }
        }
    }

    /// `DELETE {account}/applications/{id}`
    pub async fn delete_application(&self, app_id: &str) -> Result<(), Error> {
        self.delete(Server::Account, &format!("applications/{app_id}"))
            .await
    }

    /// `GET {handler}/applications/{id}`
    pub async fn get_handler_application(
        &self,
        app_id: &str,
    ) -> Result<HandlerApplication, Error> {
        self.get(Server::Handler, &format!("applications/{app_id}"))
            .await
    }

    /// `PUT {handler}/applications/{id}`
    pub async fn update_handler_application(&self, app: &HandlerApplication) -> Result<(), Error> {
        self.put(
            Server::Handler,
            &format!("applications/{}", app.app_id),
            app,
        )
        .await
    }

    // ── HTTP integration ─────────────────────────────────────────────

    /// `GET {handler}/applications/{id}/integrations/http`
    pub async fn get_http_integration(&self, app_id: &str) -> Result<HttpIntegration, Error> {
        self.get(
            Server::Handler,
            &format!("applications/{app_id}/integrations/http"),
        )
        .await
    }

    /// `POST {handler}/applications/{id}/integrations/http`
    pub async fn create_http_integration(
        &self,
        app_id: &str,
        hook: &HttpIntegration,
    ) -> Result<(), Error> {
        self.post(
            Server::Handler,
            &format!("applications/{app_id}/integrations/http"),
            hook,
        )
        .await
    }

    /// `PUT {handler}/applications/{id}/integrations/http`
    pub async fn update_http_integration(
        &self,
        app_id: &str,
        hook: &HttpIntegration,
    ) -> Result<(), Error> {
        self.put(
            Server::Handler,
            &format!("applications/{app_id}/integrations/http"),
            hook,
        )
        .await
    }

    /// `DELETE {handler}/applications/{id}/integrations/http`
    pub async fn delete_http_integration(&self, app_id: &str) -> Result<(), Error> {
        self.delete(
            Server::Handler,
            &format!("applications/{app_id}/integrations/http"),
        )
        .await
    }
}
