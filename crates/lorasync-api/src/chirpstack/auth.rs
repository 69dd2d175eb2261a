// ChirpStack authentication
//
// Username/password login against `/api/internal/login`. The returned JWT
// is stored in the client and attached to every subsequent request.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::chirpstack::client::{ChirpStackClient, parse_error};
use crate::error::Error;

#[derive(Deserialize)]
struct LoginResponse {
    jwt: String,
}

impl ChirpStackClient {
    /// Authenticate with the application server using username/password.
    ///
    /// `POST /api/internal/login` with `{"username", "password"}`; the
    /// `jwt` from the response becomes the session token.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.api_url("internal/login")?;
        debug!("logging in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self.http().post(url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let err = parse_error(status, resp).await;
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {err}"),
            });
        }

        let login: LoginResponse = self.handle_response(resp).await?;
        if login.jwt.is_empty() {
            return Err(Error::Authentication {
                message: "login response did not contain a token".into(),
            });
        }
        self.set_jwt(SecretString::from(login.jwt));

        debug!("login successful");
        Ok(())
    }

    /// Drop the session token. ChirpStack JWTs are stateless, so there is
    /// no server-side logout call.
    pub fn logout(&self) {
        self.clear_jwt();
        debug!("session token cleared");
    }
}
