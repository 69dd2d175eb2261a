//! Application command handlers.

use tabled::Tabled;

use lorasync_core::{
    ApplicationRecord, CoreError, DataKey, EntityKind, IntegrationTarget, LocalId, LocalStore,
    MemoryStore, Network, ProtocolDataStore, RemoteId,
};

use crate::cli::{AppsArgs, AppsCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Reporting")]
    reporting: String,
    #[tabled(rename = "Base URL")]
    base_url: String,
}

impl From<&ApplicationRecord> for AppRow {
    fn from(a: &ApplicationRecord) -> Self {
        Self {
            id: a.id.to_string(),
            company: a.company_id.to_string(),
            name: a.application.name.clone(),
            reporting: a.reporting_protocol.to_string(),
            base_url: output::or_dash(a.application.base_url.as_deref()),
        }
    }
}

/// Remote id an application was pushed or pulled under.
async fn remote_application_id(
    store: &MemoryStore,
    network: &Network,
    app_id: LocalId,
) -> Result<RemoteId, CliError> {
    let key = DataKey::remote_id(EntityKind::Application, app_id);
    match store.load_value(&network.id, &key).await? {
        Some(value) => Ok(RemoteId::new(value)),
        None => Err(CoreError::MappingNotFound {
            network: network.id.to_string(),
            key: key.to_string(),
        }
        .into()),
    }
}

pub async fn handle(args: AppsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let store = config::open_store(global, &cfg)?;

    match args.command {
        AppsCommand::List => {
            let apps = store.list_applications().await?;
            let out = output::render_list(&global.output, &apps, |a| AppRow::from(a), |a| {
                a.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Start { network, app_id } => {
            let app_id = LocalId(app_id);
            let app = util::require_application(&store, app_id).await?;
            let (network, adapter) = config::resolve_network(global, &cfg, &network)?;
            let remote_id = remote_application_id(&store, &network, app_id).await?;
            let target = IntegrationTarget::new(&cfg.ingest_url()?, &network, app_id)?;

            adapter.connect(&network).await?;
            adapter.start_application(&network, &remote_id, &target).await?;
            util::status(
                global.quiet,
                &format!(
                    "{} on {}: uplinks now delivered to {}",
                    app.application.name, network.id, target.url
                ),
            );
            Ok(())
        }

        AppsCommand::Stop { network, app_id } => {
            let app_id = LocalId(app_id);
            let app = util::require_application(&store, app_id).await?;
            let (network, adapter) = config::resolve_network(global, &cfg, &network)?;
            let remote_id = remote_application_id(&store, &network, app_id).await?;

            adapter.connect(&network).await?;
            adapter.stop_application(&network, &remote_id).await?;
            util::status(
                global.quiet,
                &format!("{} on {}: uplink integration removed", app.application.name, network.id),
            );
            Ok(())
        }
    }
}
