//! CLI configuration: thin wrapper around `lorasync_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` overrides (--config,
//! --state, --insecure) and opens the state-file backed store.

use std::path::PathBuf;
use std::sync::Arc;

use lorasync_core::{MemoryStore, Network, NetworkProtocol, adapter_for};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use lorasync_config::{Config, NetworkProfile, config_path};

/// Load the config file named by `--config`, or the canonical one.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let cfg = match &global.config {
        Some(path) => lorasync_config::load_config_from(path)?,
        None => lorasync_config::load_config()?,
    };
    Ok(cfg)
}

pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// `--state` beats `[store].state_file` beats the platform data dir.
pub fn state_path(global: &GlobalOpts, cfg: &Config) -> PathBuf {
    global
        .state
        .clone()
        .unwrap_or_else(|| lorasync_config::state_path(cfg))
}

pub fn open_store(global: &GlobalOpts, cfg: &Config) -> Result<Arc<MemoryStore>, CliError> {
    Ok(Arc::new(MemoryStore::load(&state_path(global, cfg))?))
}

pub fn save_store(global: &GlobalOpts, cfg: &Config, store: &MemoryStore) -> Result<(), CliError> {
    store.save(&state_path(global, cfg))?;
    Ok(())
}

fn profile<'a>(
    global: &GlobalOpts,
    cfg: &'a Config,
    name: &str,
) -> Result<&'a NetworkProfile, CliError> {
    cfg.networks.get(name).ok_or_else(|| CliError::NetworkNotFound {
        name: name.into(),
        available: if cfg.networks.is_empty() {
            "(none)".into()
        } else {
            cfg.networks.keys().cloned().collect::<Vec<_>>().join(", ")
        },
        path: active_config_path(global).display().to_string(),
    })
}

/// Resolve a named network and build its protocol adapter.
pub fn resolve_network(
    global: &GlobalOpts,
    cfg: &Config,
    name: &str,
) -> Result<(Network, Arc<dyn NetworkProtocol>), CliError> {
    let profile = profile(global, cfg, name)?;
    let network = lorasync_config::network_from_profile(name, profile)?;
    let transport = cfg.transport_for(profile, global.insecure);
    let adapter = adapter_for(&network, &transport)?;
    Ok((network, adapter))
}
