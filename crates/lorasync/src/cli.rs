//! Clap derive structures for the `lorasync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lorasync -- keep LoRaWAN applications and devices in step across network servers
#[derive(Debug, Parser)]
#[command(
    name = "lorasync",
    version,
    about = "Synchronize LoRaWAN applications, device profiles and devices across network servers",
    long_about = "Pull applications and devices from ChirpStack or The Things Network into a\n\
        local store, push locally linked entities back out, and manage uplink\n\
        integrations and downlinks.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "LORASYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// State file holding local entities and remote mappings
    #[arg(long, env = "LORASYNC_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LORASYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LORASYNC_INSECURE", global = true)]
    pub insecure: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and test configured network servers
    #[command(alias = "net", alias = "n")]
    Networks(NetworksArgs),

    /// Import a network's applications and devices into the local store
    Pull(PullArgs),

    /// Export locally linked applications, profiles and devices
    Push(PushArgs),

    /// Manage local applications and their uplink integrations
    #[command(alias = "app")]
    Apps(AppsArgs),

    /// List local devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show recorded remote ids
    Mappings(MappingsArgs),

    /// Send a downlink to a device and wait for the result
    Downlink(DownlinkArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Networks ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NetworksArgs {
    #[command(subcommand)]
    pub command: NetworksCommand,
}

#[derive(Debug, Subcommand)]
pub enum NetworksCommand {
    /// List configured networks
    #[command(alias = "ls")]
    List,

    /// Log in and perform one read against a network server
    Test {
        /// Network name from the config file
        network: String,
    },
}

// ── Sync ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PullArgs {
    /// Network name from the config file
    pub network: String,

    /// Company that owns imported entities (created if missing)
    #[arg(long, short = 'c')]
    pub company: String,
}

#[derive(Debug, Args)]
pub struct PushArgs {
    /// Network names; every configured network when omitted
    pub networks: Vec<String>,

    /// Re-check stored application mappings against the network
    #[arg(long)]
    pub verify: bool,
}

// ── Applications ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AppsArgs {
    #[command(subcommand)]
    pub command: AppsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AppsCommand {
    /// List local applications
    #[command(alias = "ls")]
    List,

    /// Register the uplink integration for an application on a network
    Start {
        /// Network name from the config file
        network: String,
        /// Local application id
        app_id: u64,
    },

    /// Remove the uplink integration for an application on a network
    Stop {
        /// Network name from the config file
        network: String,
        /// Local application id
        app_id: u64,
    },
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List local devices
    #[command(alias = "ls")]
    List {
        /// Only devices of this local application
        #[arg(long, short = 'a')]
        app: Option<u64>,
    },
}

// ── Mappings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MappingsArgs {
    /// Only mappings recorded for this network
    #[arg(long, short = 'n')]
    pub network: Option<String>,
}

// ── Downlink ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DownlinkArgs {
    /// Network name from the config file
    pub network: String,

    /// Device EUI (16 hex digits)
    pub dev_eui: String,

    /// LoRaWAN FPort (1-223)
    #[arg(long, short = 'p', value_parser = clap::value_parser!(u8).range(1..=223))]
    pub port: u8,

    /// Payload as hex
    #[arg(long, short = 'd')]
    pub data: String,

    /// Request a confirmed downlink
    #[arg(long)]
    pub confirmed: bool,

    /// Seconds to wait for the result (overrides `ingest.downlink_timeout`)
    #[arg(long)]
    pub timeout: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective configuration (secrets redacted)
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
