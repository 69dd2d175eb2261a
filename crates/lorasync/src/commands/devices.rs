//! Device command handlers.

use tabled::Tabled;

use lorasync_core::{DeviceCredentials, DeviceRecord, LocalId, LocalStore};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "App")]
    application: String,
    #[tabled(rename = "DevEUI")]
    dev_eui: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Activation")]
    activation: String,
}

impl From<&DeviceRecord> for DeviceRow {
    fn from(d: &DeviceRecord) -> Self {
        let activation = match &d.device.credentials {
            Some(DeviceCredentials::Keys(_)) => "OTAA".into(),
            Some(DeviceCredentials::Activation(a)) => format!("ABP {}", a.dev_addr),
            None => "-".into(),
        };
        Self {
            id: d.id.to_string(),
            application: d.application_id.to_string(),
            dev_eui: d.device.dev_eui.to_string(),
            name: d.device.name.clone(),
            activation,
        }
    }
}

pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let store = config::open_store(global, &cfg)?;

    match args.command {
        DevicesCommand::List { app } => {
            let devices = store.list_devices(app.map(LocalId)).await?;
            let out = output::render_list(&global.output, &devices, |d| DeviceRow::from(d), |d| {
                d.device.dev_eui.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
