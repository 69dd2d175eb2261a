//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod apps;
pub mod config_cmd;
pub mod devices;
pub mod downlink;
pub mod mappings;
pub mod networks;
pub mod sync;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Networks(args) => networks::handle(args, global).await,
        Command::Pull(args) => sync::pull(&args, global).await,
        Command::Push(args) => sync::push(args, global).await,
        Command::Apps(args) => apps::handle(args, global).await,
        Command::Devices(args) => devices::handle(args, global).await,
        Command::Mappings(args) => mappings::handle(&args, global),
        Command::Downlink(args) => downlink::handle(&args, global).await,
        Command::Config(args) => config_cmd::handle(&args, global),
        // Completions are handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}
