//! Config subcommand handlers.

use std::fmt::Write;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Format config for display, masking secrets.
fn format_config_redacted(cfg: &Config, state: &std::path::Path) -> String {
    let mut out = String::new();

    if let Some(default) = &cfg.default_network {
        let _ = writeln!(out, "default_network = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let _ = writeln!(out);
    let _ = writeln!(out, "[ingest]");
    if let Some(url) = &cfg.ingest.public_url {
        let _ = writeln!(out, "public_url = \"{url}\"");
    }
    let _ = writeln!(out, "downlink_timeout = {}", cfg.ingest.downlink_timeout);

    let _ = writeln!(out);
    let _ = writeln!(out, "[store]");
    let _ = writeln!(out, "state_file = \"{}\"", state.display());

    for (name, p) in &cfg.networks {
        let _ = writeln!(out);
        let _ = writeln!(out, "[networks.{name}]");
        let _ = writeln!(out, "protocol = \"{}\"", p.protocol);
        for (key, value) in [
            ("base_url", &p.base_url),
            ("handler_url", &p.handler_url),
            ("organization_id", &p.organization_id),
            ("service_profile_id", &p.service_profile_id),
            ("network_server_id", &p.network_server_id),
            ("handler_id", &p.handler_id),
            ("username", &p.username),
            ("password_env", &p.password_env),
            ("access_token_env", &p.access_token_env),
            ("uplink_api_key_env", &p.uplink_api_key_env),
        ] {
            if let Some(v) = value {
                let _ = writeln!(out, "{key} = \"{v}\"");
            }
        }
        for (key, secret) in [
            ("password", &p.password),
            ("access_token", &p.access_token),
            ("uplink_api_key", &p.uplink_api_key),
        ] {
            if secret.is_some() {
                let _ = writeln!(out, "{key} = \"****\"");
            }
        }
        if let Some(ca) = &p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }
    out
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(
                &config::active_config_path(global).display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let state = config::state_path(global, &cfg);
            output::print_output(&format_config_redacted(&cfg, &state), global.quiet);
            Ok(())
        }
    }
}
