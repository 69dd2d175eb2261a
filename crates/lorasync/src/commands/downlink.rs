//! Downlink submission through the uplink router.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lorasync_core::{
    CoreError, DataKey, DevEui, Downlink, DownlinkArgs as CoreDownlinkArgs, EntityKind, LocalId,
    LocalStore, MemoryStore, NetworkId, ProtocolDataStore, RemoteId, UplinkRouter,
    WebhookDelivery, run_downlink_worker,
};

use crate::cli::{DownlinkArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

async fn require_remote_id(
    store: &MemoryStore,
    network: &NetworkId,
    kind: EntityKind,
    local_id: LocalId,
) -> Result<RemoteId, CliError> {
    let key = DataKey::remote_id(kind, local_id);
    match store.load_value(network, &key).await? {
        Some(value) => Ok(RemoteId::new(value)),
        None => Err(CoreError::MappingNotFound {
            network: network.to_string(),
            key: key.to_string(),
        }
        .into()),
    }
}

async fn join_worker(worker: JoinHandle<()>) -> Result<(), CliError> {
    worker.await.map_err(|e| {
        tracing::error!(error = %e, "downlink worker failed");
        CliError::Internal(format!("downlink worker failed: {e}"))
    })
}

pub async fn handle(args: &DownlinkArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let store = config::open_store(global, &cfg)?;
    let (network, adapter) = config::resolve_network(global, &cfg, &args.network)?;

    let dev_eui = DevEui::new(&args.dev_eui)?;
    let record = store
        .find_device_by_dev_eui(&dev_eui)
        .await?
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: dev_eui.to_string(),
            list_command: "devices list".into(),
        })?;

    let downlink = CoreDownlinkArgs {
        application_id: require_remote_id(
            &store,
            &network.id,
            EntityKind::Application,
            record.application_id,
        )
        .await?,
        device_id: require_remote_id(&store, &network.id, EntityKind::Device, record.id).await?,
        downlink: Downlink {
            f_port: args.port,
            confirmed: args.confirmed,
            data: super::util::parse_hex(&args.data)?,
        },
    };

    adapter.connect(&network).await?;
    adapter
        .restore(&network, store.as_ref(), store.as_ref())
        .await?;

    let timeout = args
        .timeout
        .map_or_else(|| cfg.downlink_timeout(), Duration::from_secs);
    let delivery = Arc::new(WebhookDelivery::new(reqwest::Client::new(), store.clone()));
    let (router, rx) = UplinkRouter::new(delivery, timeout);
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(run_downlink_worker(
        router.clone(),
        rx,
        adapter,
        network,
        cancel.clone(),
    ));

    let result = router.submit_downlink(downlink).await;
    cancel.cancel();
    // A panicked worker explains any missing result better than the result does.
    join_worker(worker).await?;

    let payload = result?;
    let out = output::render_single(
        &global.output,
        &payload,
        |p| format!("Downlink accepted for {dev_eui}\n{p}"),
        |_| dev_eui.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
