// ChirpStack HTTP client
//
// Wraps `reqwest::Client` with ChirpStack URL construction, JWT header
// injection, and grpc-gateway error decoding. Both API generations share
// this transport; their bodies differ and live in `models::{v1, v2}`.
// Endpoint methods are inherent impls in sibling files to keep this
// module focused on transport mechanics.

use std::future::Future;
use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::chirpstack::models::ListResponse;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Header carrying the JWT through the grpc-gateway.
const AUTH_HEADER: &str = "Grpc-Metadata-Authorization";

/// grpc-gateway error shape: `{"error": "...", "code": 5, "message": "..."}`.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

/// Raw HTTP client for a ChirpStack (LoRa App Server) REST API.
///
/// Every request except `login` carries the session JWT. Methods are
/// generic over the wire body type so the v1 and v2 schemas can share
/// one transport.
pub struct ChirpStackClient {
    http: reqwest::Client,
    base_url: Url,
    /// JWT returned by `POST /api/internal/login`.
    jwt: RwLock<Option<SecretString>>,
}

impl ChirpStackClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the application server root, e.g. `https://lora.example.com:8080`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            jwt: RwLock::new(None),
        }
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The application server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a session token is currently held.
    pub fn has_session(&self) -> bool {
        self.jwt.read().expect("JWT lock poisoned").is_some()
    }

    // ── Session token management ─────────────────────────────────────

    pub(crate) fn set_jwt(&self, token: SecretString) {
        debug!("storing session token");
        *self.jwt.write().expect("JWT lock poisoned") = Some(token);
    }

    pub(crate) fn clear_jwt(&self) {
        *self.jwt.write().expect("JWT lock poisoned") = None;
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let guard = self.jwt.read().expect("JWT lock poisoned");
        match guard.as_ref() {
            Some(token) => Ok(builder.header(AUTH_HEADER, format!("Bearer {}", token.expose_secret()))),
            None => Err(Error::NotLoggedIn),
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.authorize(self.http.get(url).query(params))?.send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body))?.send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.api_url(path)?;
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body))?.send().await?;
        self.handle_empty(resp).await
    }

    pub(crate) async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.api_url(path)?;
        debug!("PUT {url}");

        let resp = self.authorize(self.http.put(url).json(body))?.send().await?;
        self.handle_empty(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.api_url(path)?;
        debug!("DELETE {url}");

        let resp = self.authorize(self.http.delete(url))?.send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        trace!(len = body.len(), "response body received");
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(parse_error(status, resp).await)
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Collect all pages of a list endpoint into a single `Vec<T>`.
    pub async fn paginate_all<T, F, Fut>(&self, limit: u32, fetch: F) -> Result<Vec<T>, Error>
    where
        F: Fn(u32, u32) -> Fut,
        Fut: Future<Output = Result<ListResponse<T>, Error>>,
    {
        let mut all = Vec::new();
        let mut offset: u32 = 0;

        loop {
            let page = fetch(offset, limit).await?;
            let received = page.result.len();
            all.extend(page.result);

            let limit_usize = usize::try_from(limit).unwrap_or(usize::MAX);
            if received == 0
                || received < limit_usize
                || u64::try_from(all.len()).unwrap_or(u64::MAX) >= page.total_count
            {
                break;
            }

            offset = offset.saturating_add(u32::try_from(received).unwrap_or(u32::MAX));
        }

        Ok(all)
    }
}

/// Decode a non-success response into [`Error`].
///
/// 401 maps to `Authentication`; everything else keeps its status so
/// callers can branch on 404/409.
pub(crate) async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::Authentication {
            message: if raw.is_empty() {
                "session expired or invalid credentials".into()
            } else {
                raw
            },
        };
    }

    match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(err) => Error::Api {
            status: status.as_u16(),
            message: err
                .message
                .or(err.error)
                .unwrap_or_else(|| status.to_string()),
            code: err.code,
        },
        Err(_) => Error::Api {
            status: status.as_u16(),
            message: if raw.is_empty() {
                status.to_string()
            } else {
                preview(&raw)
            },
            code: None,
        },
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
