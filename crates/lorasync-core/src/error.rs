// ── Core error types ──
//
// User-facing errors from lorasync-core. The CLI maps these into
// miette diagnostics; transport errors from lorasync-api are converted
// here and never leak through the public API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    /// Credentials missing or rejected at `connect`.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Cannot reach network server at {url}: {reason}")]
    Connectivity { url: String, reason: String },

    /// An HTTP request ran past the transport timeout.
    #[error("Network server at {url} did not respond in time")]
    Timeout { url: String },

    /// No correlated result arrived for a submitted downlink.
    #[error("No downlink result within {timeout_secs}s")]
    DownlinkTimeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    /// Remote 404, or a local lookup that found nothing.
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// A local entity carries a relationship id that disagrees with the
    /// id configured on the network.
    #[error(
        "{entity} {field} mismatch: entity carries {carried:?}, network is configured for {configured:?}"
    )]
    RelationshipMismatch {
        entity: &'static str,
        field: &'static str,
        carried: String,
        configured: String,
    },

    /// A protocol-data mapping that must exist does not.
    #[error("No remote mapping for {key} on network {network}")]
    MappingNotFound { network: String, key: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Store errors ─────────────────────────────────────────────────
    #[error("Store error: {message}")]
    Store { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
        code: Option<i64>,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported by {protocol}: {operation}")]
    Unsupported { operation: String, protocol: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity_type: impl Into<String>, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Errors that make every further call to the same network pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Auth { .. } | Self::Connectivity { .. } | Self::Timeout { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lorasync_api::Error> for CoreError {
    fn from(err: lorasync_api::Error) -> Self {
        match err {
            lorasync_api::Error::Authentication { message } => CoreError::Auth { message },
            lorasync_api::Error::NotLoggedIn => CoreError::Auth {
                message: "not connected -- call connect() first".into(),
            },
            lorasync_api::Error::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() {
                    CoreError::Connectivity {
                        url,
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        entity_type: "resource".into(),
                        identifier: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                        code: None,
                    }
                }
            }
            lorasync_api::Error::InvalidUrl(e) => CoreError::Validation {
                message: format!("Invalid URL: {e}"),
            },
            lorasync_api::Error::Tls(msg) => CoreError::Connectivity {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            lorasync_api::Error::Api {
                status: 404,
                message,
                ..
            } => CoreError::NotFound {
                entity_type: "remote resource".into(),
                identifier: message,
            },
            lorasync_api::Error::Api {
                status,
                message,
                code,
            } => CoreError::Api {
                message,
                status: Some(status),
                code,
            },
            lorasync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Malformed remote payload: {message}"))
            }
            lorasync_api::Error::UnsupportedOperation(op) => CoreError::Unsupported {
                operation: op.to_string(),
                protocol: "this backend".into(),
            },
        }
    }
}
