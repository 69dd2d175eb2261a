// ── Integration target ──
//
// Every backend delivers uplinks to the same ingest URL, one per
// (application, network) pair, authenticated with
// `Basic base64(networkId:uplinkApiKey)`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lorasync_api::chirpstack::models::{IntegrationHeader, v1, v2};
use lorasync_api::ttn::models as ttn;
use secrecy::ExposeSecret;
use url::Url;

use crate::error::CoreError;
use crate::model::{LocalId, Network};

/// Where and how a network server should POST uplink notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationTarget {
    pub url: Url,
    /// Full `Authorization` header value.
    pub authorization: String,
}

impl IntegrationTarget {
    /// `<ingest_base>/api/ingest/<appId>/<networkId>` with the network's
    /// uplink key as Basic credentials.
    pub fn new(
        ingest_base: &Url,
        network: &Network,
        application_id: LocalId,
    ) -> Result<Self, CoreError> {
        let key = network.security.uplink_api_key.as_ref().ok_or_else(|| {
            CoreError::validation(format!(
                "network {} has no uplink_api_key; cannot register an integration",
                network.id
            ))
        })?;

        let base = ingest_base.as_str().trim_end_matches('/');
        let url = Url::parse(&format!(
            "{base}/api/ingest/{application_id}/{}",
            network.id
        ))
        .map_err(|e| CoreError::validation(format!("invalid ingest URL: {e}")))?;

        let credentials = STANDARD.encode(format!("{}:{}", network.id, key.expose_secret()));
        Ok(Self {
            url,
            authorization: format!("Basic {credentials}"),
        })
    }

    fn header(&self) -> IntegrationHeader {
        IntegrationHeader {
            key: "Authorization".into(),
            value: self.authorization.clone(),
        }
    }

    /// v1 registers five notification roles, all on the same URL.
    pub fn chirpstack_v1(&self, application_id: &str) -> v1::HttpIntegration {
        let url = self.url.to_string();
        v1::HttpIntegration {
            id: Some(application_id.to_owned()),
            headers: vec![self.header()],
            uplink_data_url: url.clone(),
            join_notification_url: url.clone(),
            ack_notification_url: url.clone(),
            error_notification_url: url.clone(),
            status_notification_url: url,
        }
    }

    /// v2 adds location notifications.
    pub fn chirpstack_v2(&self, application_id: &str) -> v2::HttpIntegrationEnvelope {
        let url = self.url.to_string();
        v2::HttpIntegrationEnvelope {
            integration: v2::HttpIntegration {
                id: Some(application_id.to_owned()),
                headers: vec![self.header()],
                uplink_data_url: url.clone(),
                join_notification_url: url.clone(),
                ack_notification_url: url.clone(),
                error_notification_url: url.clone(),
                status_notification_url: url.clone(),
                location_notification_url: url,
            },
        }
    }

    /// TTN takes a single URL plus a verbatim `Authorization` value.
    pub fn ttn(&self) -> ttn::HttpIntegration {
        ttn::HttpIntegration {
            url: self.url.to_string(),
            method: "POST".into(),
            authorization: self.authorization.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ProtocolKind;
    use secrecy::SecretString;

    fn network() -> Network {
        let mut network = Network::new("cs2", ProtocolKind::ChirpStackV2);
        network.security.uplink_api_key = Some(SecretString::from("s3cret"));
        network
    }

    #[test]
    fn url_and_basic_header() {
        let base = Url::parse("https://ingest.example.com/").unwrap();
        let target = IntegrationTarget::new(&base, &network(), LocalId(12)).unwrap();

        assert_eq!(
            target.url.as_str(),
            "https://ingest.example.com/api/ingest/12/cs2"
        );
        // base64("cs2:s3cret")
        assert_eq!(target.authorization, "Basic Y3MyOnMzY3JldA==");
    }

    #[test]
    fn every_role_points_at_the_ingest_url() {
        let base = Url::parse("https://ingest.example.com").unwrap();
        let target = IntegrationTarget::new(&base, &network(), LocalId(1)).unwrap();

        let v2 = target.chirpstack_v2("9").integration;
        for url in [
            &v2.uplink_data_url,
            &v2.join_notification_url,
            &v2.ack_notification_url,
            &v2.error_notification_url,
            &v2.status_notification_url,
            &v2.location_notification_url,
        ] {
            assert_eq!(url, target.url.as_str());
        }
        assert_eq!(v2.headers[0].value, target.authorization);
    }

    #[test]
    fn missing_uplink_key_is_a_validation_error() {
        let base = Url::parse("https://ingest.example.com").unwrap();
        let network = Network::new("cs2", ProtocolKind::ChirpStackV2);
        assert!(matches!(
            IntegrationTarget::new(&base, &network, LocalId(1)),
            Err(CoreError::Validation { .. })
        ));
    }
}
