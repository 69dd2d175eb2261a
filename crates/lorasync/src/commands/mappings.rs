//! Protocol-data listing.

use tabled::Tabled;

use lorasync_core::{NetworkId, ProtocolDataEntry};

use crate::cli::{GlobalOpts, MappingsArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct MappingRow {
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Remote ID")]
    value: String,
}

impl From<&ProtocolDataEntry> for MappingRow {
    fn from(e: &ProtocolDataEntry) -> Self {
        Self {
            network: e.network_id.to_string(),
            key: e.data_key.clone(),
            value: e.value.clone(),
        }
    }
}

pub fn handle(args: &MappingsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let store = config::open_store(global, &cfg)?;

    let network = args.network.as_deref().map(NetworkId::new);
    let entries = store.protocol_entries(network.as_ref());
    let out = output::render_list(&global.output, &entries, |e| MappingRow::from(e), |e| {
        format!("{}\t{}", e.data_key, e.value)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
