//! Network command handlers.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, NetworksArgs, NetworksCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct NetworkSummary {
    name: String,
    protocol: String,
    endpoint: Option<String>,
    organization_id: Option<String>,
    handler_id: Option<String>,
}

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Org")]
    organization: String,
}

impl From<&NetworkSummary> for NetworkRow {
    fn from(n: &NetworkSummary) -> Self {
        Self {
            name: n.name.clone(),
            protocol: n.protocol.clone(),
            endpoint: output::or_dash(n.endpoint.as_deref()),
            organization: output::or_dash(
                n.organization_id.as_deref().or(n.handler_id.as_deref()),
            ),
        }
    }
}

pub async fn handle(args: NetworksArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;

    match args.command {
        NetworksCommand::List => {
            let summaries: Vec<NetworkSummary> = cfg
                .networks
                .iter()
                .map(|(name, p)| NetworkSummary {
                    name: name.clone(),
                    protocol: p.protocol.to_string(),
                    endpoint: p.base_url.clone().or_else(|| p.handler_url.clone()),
                    organization_id: p.organization_id.clone(),
                    handler_id: p.handler_id.clone(),
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &summaries,
                |n| NetworkRow::from(n),
                |n| n.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NetworksCommand::Test { network } => {
            let (network, adapter) = config::resolve_network(global, &cfg, &network)?;
            adapter.connect(&network).await?;
            adapter.test(&network).await?;
            util::status(
                global.quiet,
                &format!("{} ({}) is reachable", network.name, network.protocol),
            );
            Ok(())
        }
    }
}
