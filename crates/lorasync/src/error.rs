//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use lorasync_config::ConfigError;
use lorasync_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach network server at {url}: {reason}")]
    #[diagnostic(
        code(lorasync::connection_failed),
        help(
            "Check that the network server is running and reachable.\n\
             Try: lorasync networks test <network> --insecure"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(lorasync::auth_failed),
        help(
            "Verify username/password (ChirpStack) or access_token (TTN).\n\
             Secrets resolve from the *_env variable, then the keyring, then the config file."
        )
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(lorasync::not_found),
        help("Run: lorasync {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{0}")]
    #[diagnostic(
        code(lorasync::mismatch),
        help("The entity belongs to a different organization or network server than the network is configured for.")
    )]
    Mismatch(String),

    #[error("No remote mapping for {key} on network {network}")]
    #[diagnostic(
        code(lorasync::unmapped),
        help("Run: lorasync push {network}")
    )]
    Unmapped { network: String, key: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(lorasync::api_error))]
    ApiError { message: String },

    #[error("Operation '{operation}' is not supported by {protocol}")]
    #[diagnostic(code(lorasync::unsupported))]
    Unsupported { operation: String, protocol: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lorasync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Network '{name}' not found in configuration")]
    #[diagnostic(
        code(lorasync::network_not_found),
        help(
            "Available networks: {available}\n\
             Add a [networks.{name}] table to {path}"
        )
    )]
    NetworkNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error(transparent)]
    #[diagnostic(code(lorasync::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Network server at {url} did not respond in time")]
    #[diagnostic(
        code(lorasync::request_timeout),
        help("Raise defaults.timeout or the network's timeout in the config file.")
    )]
    RequestTimeout { url: String },

    #[error("No downlink result within {seconds}s")]
    #[diagnostic(
        code(lorasync::timeout),
        help("Increase ingest.downlink_timeout or pass --timeout.")
    )]
    Timeout { seconds: u64 },

    #[error("{0}")]
    #[diagnostic(code(lorasync::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::NetworkNotFound { .. } => exit_code::NOT_FOUND,
            Self::Mismatch(_) | Self::Unmapped { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } | Self::RequestTimeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth { message } => Self::AuthFailed { message },

            CoreError::Connectivity { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::Timeout { url } => Self::RequestTimeout { url },

            CoreError::DownlinkTimeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: list_command_for(&entity_type).into(),
                resource_type: entity_type,
                identifier,
            },

            err @ CoreError::RelationshipMismatch { .. } => Self::Mismatch(err.to_string()),

            CoreError::MappingNotFound { network, key } => Self::Unmapped { network, key },

            CoreError::Validation { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Unsupported {
                operation,
                protocol,
            } => Self::Unsupported {
                operation,
                protocol,
            },

            CoreError::Api { message, .. } => Self::ApiError { message },

            CoreError::Store { message } | CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

fn list_command_for(entity_type: &str) -> &'static str {
    match entity_type {
        "device" => "devices list",
        "company" | "application" => "apps list",
        _ => "mappings",
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownNetwork { name } => Self::NetworkNotFound {
                name,
                available: String::new(),
                path: lorasync_config::config_path().display().to_string(),
            },
            other => Self::Config(Box::new(other)),
        }
    }
}
