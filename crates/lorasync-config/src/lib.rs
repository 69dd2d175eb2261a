//! Configuration for the lorasync CLI.
//!
//! A TOML file with `[defaults]`, `[ingest]`, `[store]` and one
//! `[networks.<name>]` table per network server, merged with
//! `LORASYNC_`-prefixed environment variables. Secrets resolve from an
//! environment variable, then the system keyring, then plaintext.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use lorasync_api::{TlsMode, TransportConfig};
use lorasync_core::{Network, NetworkSettings, ProtocolKind, SecurityData};

const KEYRING_SERVICE: &str = "lorasync";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no network named '{name}' in the configuration")]
    UnknownNetwork { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Network used when a command does not name one.
    pub default_network: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub ingest: Ingest,

    #[serde(default)]
    pub store: StoreSettings,

    /// Named network servers.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

/// Where network servers deliver uplinks.
#[derive(Debug, Deserialize, Serialize)]
pub struct Ingest {
    /// Public base URL of the ingest endpoint, e.g. `https://lora.example.com`.
    pub public_url: Option<String>,

    /// Seconds a downlink waits for its result.
    #[serde(default = "default_downlink_timeout")]
    pub downlink_timeout: u64,
}

impl Default for Ingest {
    fn default() -> Self {
        Self {
            public_url: None,
            downlink_timeout: default_downlink_timeout(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StoreSettings {
    /// JSON snapshot of local entities and protocol data.
    pub state_file: Option<PathBuf>,
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_downlink_timeout() -> u64 {
    30
}

/// One `[networks.<name>]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkProfile {
    pub protocol: ProtocolKind,

    /// Display name; defaults to the table key.
    pub name: Option<String>,

    /// Application server (ChirpStack) or account server (TTN).
    pub base_url: Option<String>,

    /// TTN handler root.
    pub handler_url: Option<String>,

    pub organization_id: Option<String>,
    pub service_profile_id: Option<String>,
    pub network_server_id: Option<String>,
    pub handler_id: Option<String>,

    pub username: Option<String>,

    /// Plaintext password (prefer keyring or `password_env`).
    pub password: Option<String>,
    pub password_env: Option<String>,

    pub access_token: Option<String>,
    pub access_token_env: Option<String>,

    /// Shared secret network servers present on uplink delivery.
    pub uplink_api_key: Option<String>,
    pub uplink_api_key_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the global insecure setting.
    pub insecure: Option<bool>,

    /// Override the global timeout.
    pub timeout: Option<u64>,
}

impl NetworkProfile {
    pub fn new(protocol: ProtocolKind) -> Self {
        Self {
            protocol,
            name: None,
            base_url: None,
            handler_url: None,
            organization_id: None,
            service_profile_id: None,
            network_server_id: None,
            handler_id: None,
            username: None,
            password: None,
            password_env: None,
            access_token: None,
            access_token_env: None,
            uplink_api_key: None,
            uplink_api_key_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "lorasync", "lorasync")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// State file from `[store]`, or `state.json` in the platform data dir.
pub fn state_path(config: &Config) -> PathBuf {
    if let Some(path) = &config.store.state_file {
        return path.clone();
    }
    project_dirs().map_or_else(
        || dirs_fallback().join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lorasync");
    p
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. `LORASYNC_DEFAULTS__TIMEOUT=60` style
/// variables override file values; `__` separates nesting levels.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LORASYNC_").split("__"));

    Ok(figment.extract()?)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve one secret: `env_name` variable, then keyring entry
/// `lorasync / <network>/<kind>`, then the plaintext value.
pub fn resolve_secret(
    network: &str,
    kind: &str,
    env_name: Option<&str>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    resolve_secret_with(|name| std::env::var(name).ok(), network, kind, env_name, plaintext)
}

fn resolve_secret_with(
    env: impl Fn(&str) -> Option<String>,
    network: &str,
    kind: &str,
    env_name: Option<&str>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    // 1. Named environment variable
    if let Some(value) = env_name.and_then(&env) {
        return Some(SecretString::from(value));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{network}/{kind}")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|s| SecretString::from(s.to_owned()))
}

// ── Translation into core types ─────────────────────────────────────

fn parse_url(field: &str, raw: Option<&str>) -> Result<Option<Url>, ConfigError> {
    raw.map(|s| {
        s.parse().map_err(|_| ConfigError::Validation {
            field: field.into(),
            reason: format!("invalid URL: {s}"),
        })
    })
    .transpose()
}

/// Build a core `Network` from its profile, resolving secrets.
pub fn network_from_profile(name: &str, profile: &NetworkProfile) -> Result<Network, ConfigError> {
    let base_url = parse_url("base_url", profile.base_url.as_deref())?;
    let handler_url = parse_url("handler_url", profile.handler_url.as_deref())?;

    if matches!(
        profile.protocol,
        ProtocolKind::ChirpStackV1 | ProtocolKind::ChirpStackV2
    ) && base_url.is_none()
    {
        return Err(ConfigError::Validation {
            field: format!("networks.{name}.base_url"),
            reason: "required for ChirpStack networks".into(),
        });
    }
    if profile.protocol == ProtocolKind::TtnV2 && handler_url.is_none() {
        return Err(ConfigError::Validation {
            field: format!("networks.{name}.handler_url"),
            reason: "required for TTN networks".into(),
        });
    }

    let security = SecurityData {
        username: profile.username.clone(),
        password: resolve_secret(
            name,
            "password",
            profile.password_env.as_deref(),
            profile.password.as_deref(),
        ),
        access_token: resolve_secret(
            name,
            "access-token",
            profile.access_token_env.as_deref(),
            profile.access_token.as_deref(),
        ),
        uplink_api_key: resolve_secret(
            name,
            "uplink-api-key",
            profile.uplink_api_key_env.as_deref(),
            profile.uplink_api_key.as_deref(),
        ),
    };

    let mut network = Network::new(name, profile.protocol);
    if let Some(display) = &profile.name {
        network.name.clone_from(display);
    }
    network.base_url = base_url;
    network.handler_url = handler_url;
    network.security = security;
    network.settings = NetworkSettings {
        organization_id: profile.organization_id.clone(),
        service_profile_id: profile.service_profile_id.clone(),
        network_server_id: profile.network_server_id.clone(),
        handler_id: profile.handler_id.clone(),
    };
    Ok(network)
}

impl Config {
    pub fn network(&self, name: &str) -> Result<&NetworkProfile, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork { name: name.into() })
    }

    /// TLS and timeout for one network; `insecure` forces it on.
    pub fn transport_for(&self, profile: &NetworkProfile, insecure: bool) -> TransportConfig {
        let tls = if insecure || profile.insecure.unwrap_or(self.defaults.insecure) {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ca_path) = &profile.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(profile.timeout.unwrap_or(self.defaults.timeout)),
        }
    }

    pub fn ingest_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .ingest
            .public_url
            .as_deref()
            .ok_or_else(|| ConfigError::Validation {
                field: "ingest.public_url".into(),
                reason: "not configured".into(),
            })?;
        raw.parse().map_err(|_| ConfigError::Validation {
            field: "ingest.public_url".into(),
            reason: format!("invalid URL: {raw}"),
        })
    }

    pub fn downlink_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest.downlink_timeout)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
default_network = "cs2"

[defaults]
timeout = 10

[ingest]
public_url = "https://lora.example.com"

[networks.cs2]
protocol = "chirpstack-v2"
base_url = "https://cs.example.com:8080"
organization_id = "1"
service_profile_id = "sp-1"
network_server_id = "ns-1"
username = "admin"
password = "admin"
uplink_api_key = "s3cret"

[networks.ttn]
protocol = "ttn-v2"
handler_url = "https://eu.thethings.network:8084"
handler_id = "ttn-handler-eu"
access_token = "tok"
timeout = 60
"#;

    fn load(toml: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn sections_load_with_defaults() {
        let cfg = load(SAMPLE);
        assert_eq!(cfg.default_network.as_deref(), Some("cs2"));
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.downlink_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.networks.len(), 2);
        assert_eq!(
            cfg.ingest_url().unwrap().as_str(),
            "https://lora.example.com/"
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.networks.is_empty());
        assert!(cfg.ingest_url().is_err());
    }

    #[test]
    fn chirpstack_profile_becomes_network() {
        let cfg = load(SAMPLE);
        let network = network_from_profile("cs2", cfg.network("cs2").unwrap()).unwrap();

        assert_eq!(network.protocol, ProtocolKind::ChirpStackV2);
        assert_eq!(network.settings.service_profile_id.as_deref(), Some("sp-1"));
        assert_eq!(network.security.username.as_deref(), Some("admin"));
        assert!(network.security.password.is_some());
        assert_eq!(
            network.base_url.unwrap().as_str(),
            "https://cs.example.com:8080/"
        );
    }

    #[test]
    fn ttn_profile_needs_handler_url() {
        let mut profile = NetworkProfile::new(ProtocolKind::TtnV2);
        let err = network_from_profile("ttn", &profile).unwrap_err();
        assert!(err.to_string().contains("handler_url"));

        profile.handler_url = Some("https://eu.thethings.network:8084".into());
        assert!(network_from_profile("ttn", &profile).is_ok());
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let mut profile = NetworkProfile::new(ProtocolKind::ChirpStackV1);
        profile.base_url = Some("not a url".into());
        assert!(matches!(
            network_from_profile("cs1", &profile),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn per_network_transport_overrides_defaults() {
        let cfg = load(SAMPLE);
        let ttn = cfg.transport_for(cfg.network("ttn").unwrap(), false);
        assert_eq!(ttn.timeout, Duration::from_secs(60));
        assert!(matches!(ttn.tls, TlsMode::System));

        let forced = cfg.transport_for(cfg.network("cs2").unwrap(), true);
        assert_eq!(forced.timeout, Duration::from_secs(10));
        assert!(matches!(forced.tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn env_secret_wins_over_plaintext() {
        let env = |name: &str| (name == "CS2_PASSWORD").then(|| "from-env".to_string());
        let secret =
            resolve_secret_with(env, "cs2", "password", Some("CS2_PASSWORD"), Some("plain"))
                .unwrap();
        assert_eq!(secret.expose_secret(), "from-env");
    }

    #[test]
    fn unknown_network_is_reported_by_name() {
        let cfg = load(SAMPLE);
        let err = cfg.network("nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut cfg = Config::default();
        cfg.networks
            .insert("lab".into(), NetworkProfile::new(ProtocolKind::GenericIp));
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.networks["lab"].protocol, ProtocolKind::GenericIp);
    }
}
