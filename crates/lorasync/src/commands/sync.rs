//! Pull and push handlers.

use std::sync::Arc;

use tabled::Tabled;

use lorasync_core::{
    EntityReport, LocalStore, MemoryStore, PushOptions, SyncEngine, SyncReport,
};

use crate::cli::{GlobalOpts, PullArgs, PushArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Local ID")]
    local_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

/// Report entries flattened with their network for one table.
#[derive(serde::Serialize)]
struct Line<'a> {
    network: &'a str,
    #[serde(flatten)]
    entry: &'a EntityReport,
}

fn render_reports(global: &GlobalOpts, reports: &[SyncReport]) {
    let lines: Vec<Line<'_>> = reports
        .iter()
        .flat_map(|r| {
            r.entries.iter().map(|entry| Line {
                network: r.network_id.as_str(),
                entry,
            })
        })
        .collect();
    let out = output::render_list(
        &global.output,
        &lines,
        |l| ReportRow {
            network: l.network.to_owned(),
            kind: l.entry.kind.to_string(),
            local_id: l.entry.local_id.to_string(),
            name: l.entry.name.clone(),
            outcome: l.entry.outcome.to_string(),
        },
        |l| format!("{}:{}", l.entry.kind.prefix(), l.entry.local_id),
    );
    output::print_output(&out, global.quiet);

    for r in reports {
        util::status(
            global.quiet,
            &format!(
                "{}: {} created, {} already synced, {} failed",
                r.network_id,
                r.created(),
                r.already_synced(),
                r.failed()
            ),
        );
    }
}

fn engine(store: &Arc<MemoryStore>) -> SyncEngine {
    SyncEngine::new(store.clone(), store.clone())
}

pub async fn pull(args: &PullArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let store = config::open_store(global, &cfg)?;
    let (network, adapter) = config::resolve_network(global, &cfg, &args.network)?;

    let company = match store
        .list_companies()
        .await?
        .into_iter()
        .find(|c| c.name == args.company)
    {
        Some(company) => company,
        None => store.create_company(&args.company).await?,
    };

    let result = engine(&store)
        .pull(&network, adapter.as_ref(), company.id)
        .await;
    // Mappings recorded before a failure are still valid.
    config::save_store(global, &cfg, &store)?;
    render_reports(global, &[result?]);
    Ok(())
}

pub async fn push(args: PushArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let store = config::open_store(global, &cfg)?;

    let names: Vec<String> = if args.networks.is_empty() {
        cfg.networks.keys().cloned().collect()
    } else {
        args.networks
    };
    let targets = names
        .iter()
        .map(|name| config::resolve_network(global, &cfg, name))
        .collect::<Result<Vec<_>, _>>()?;

    let options = PushOptions {
        verify_mappings: args.verify,
    };
    let results = engine(&store).push_networks(&targets, &options).await;
    config::save_store(global, &cfg, &store)?;

    let mut reports = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (network_id, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::error!(network = %network_id, error = %e, "push failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    render_reports(global, &reports);

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
