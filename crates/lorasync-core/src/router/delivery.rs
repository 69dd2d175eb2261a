// ── Application delivery ──
//
// Where uplinks end up once they are not answering a downlink. The
// default POSTs the normalized uplink to the owning application's
// `base_url`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::Uplink;
use crate::store::LocalStore;

#[async_trait]
pub trait ApplicationDelivery: Send + Sync {
    async fn deliver(&self, uplink: &Uplink) -> Result<(), CoreError>;
}

/// Forward uplinks as JSON to the application's webhook.
pub struct WebhookDelivery {
    http: reqwest::Client,
    locals: Arc<dyn LocalStore>,
}

impl WebhookDelivery {
    pub fn new(http: reqwest::Client, locals: Arc<dyn LocalStore>) -> Self {
        Self { http, locals }
    }
}

#[async_trait]
impl ApplicationDelivery for WebhookDelivery {
    async fn deliver(&self, uplink: &Uplink) -> Result<(), CoreError> {
        let record = self
            .locals
            .get_application(uplink.application_id)
            .await?
            .ok_or_else(|| CoreError::not_found("application", uplink.application_id))?;

        let Some(url) = record.application.base_url.as_deref() else {
            warn!(
                application = %record.application.name,
                device_id = %uplink.device_id,
                "application has no base_url; uplink dropped"
            );
            return Ok(());
        };

        let resp = self
            .http
            .post(url)
            .json(uplink)
            .send()
            .await
            .map_err(|e| CoreError::Connectivity {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                message: format!("application webhook {url} answered {status}"),
                status: Some(status.as_u16()),
                code: None,
            });
        }

        debug!(url, device_id = %uplink.device_id, "uplink delivered");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Application, LocalId, NetworkId, RemoteId};
    use crate::store::MemoryStore;
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uplink(application_id: LocalId) -> Uplink {
        Uplink {
            network_id: NetworkId::from("cs2"),
            application_id,
            device_id: RemoteId::new("0004a30b001c0530"),
            dev_eui: None,
            f_port: Some(2),
            f_cnt: Some(1),
            payload: Some("AQI=".into()),
            decoded: None,
            correlation_id: None,
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn posts_uplink_to_application_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({"f_port": 2, "payload": "AQI="})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let company = store.create_company("acme").await.unwrap();
        let app = store
            .create_application(
                company.id,
                Application {
                    name: "meters".into(),
                    base_url: Some(format!("{}/hook", server.uri())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let delivery = WebhookDelivery::new(reqwest::Client::new(), store);
        delivery.deliver(&uplink(app.id)).await.unwrap();
    }

    #[tokio::test]
    async fn application_without_webhook_drops_silently() {
        let store = Arc::new(MemoryStore::new());
        let company = store.create_company("acme").await.unwrap();
        let app = store
            .create_application(company.id, Application::default())
            .await
            .unwrap();

        let delivery = WebhookDelivery::new(reqwest::Client::new(), store);
        assert!(delivery.deliver(&uplink(app.id)).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_application_is_not_found() {
        let delivery = WebhookDelivery::new(reqwest::Client::new(), Arc::new(MemoryStore::new()));
        assert!(delivery.deliver(&uplink(LocalId(99))).await.unwrap_err().is_not_found());
    }
}
