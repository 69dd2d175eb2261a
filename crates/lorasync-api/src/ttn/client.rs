// The Things Network v2 HTTP client
//
// Two base URLs: the account server owns applications, the regional
// handler owns devices, integrations and downlinks. The access token is
// baked into the `reqwest::Client` as a default `Authorization` header.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// TTN error shape: `{"error": "...", "code": 5}`.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

/// Which TTN server a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Server {
    Account,
    Handler,
}

/// Raw HTTP client for the TTN v2 account server and handler APIs.
pub struct TtnClient {
    http: reqwest::Client,
    account_url: Url,
    handler_url: Url,
}

impl TtnClient {
    /// Create a client authorised with a bearer access token.
    pub fn new(
        account_url: Url,
        handler_url: Url,
        access_token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Bearer {}", access_token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid access token: {e}"),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, account_url, handler_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, account_url: Url, handler_url: Url) -> Self {
        Self {
            http,
            account_url,
            handler_url,
        }
    }

    pub fn account_url(&self) -> &Url {
        &self.account_url
    }

    pub fn handler_url(&self) -> &Url {
        &self.handler_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn url(&self, server: Server, path: &str) -> Result<Url, Error> {
        let base = match server {
            Server::Account => &self.account_url,
            Server::Handler => &self.handler_url,
        };
        let base = base.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        server: Server,
        path: &str,
    ) -> Result<T, Error> {
        let url = self.url(server, path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn post<B: Serialize + Sync>(
        &self,
        server: Server,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(server, path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_empty(resp).await
    }

    pub(crate) async fn put<B: Serialize + Sync>(
        &self,
        server: Server,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(server, path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        handle_empty(resp).await
    }

    pub(crate) async fn delete(&self, server: Server, path: &str) -> Result<(), Error> {
        let url = self.url(server, path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        handle_empty(resp).await
    }
}

// ── Response handling ───────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(status, resp).await);
    }

    let body = resp.text().await?;
    trace!(len = body.len(), "response body received");
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!(
            "{e} (body preview: {:?})",
            body.chars().take(200).collect::<String>()
        ),
        body: body.clone(),
    })
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Error::Authentication {
            message: format!("access token rejected (HTTP {status})"),
        };
    }

    match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(ErrorResponse {
            error: Some(message),
            code,
        }) => Error::Api {
            status: status.as_u16(),
            message,
            code,
        },
        _ => Error::Api {
            status: status.as_u16(),
            message: if raw.is_empty() {
                status.to_string()
            } else {
                raw.chars().take(200).collect()
            },
            code: None,
        },
    }
}
