// ── Uplink correlation router ──
//
// Downlink submissions register a oneshot under a fresh correlation id,
// travel to a worker over an mpsc channel, and wait (bounded by a
// timeout) for exactly one result under that id. Uncorrelated uplinks
// go to application delivery.

mod delivery;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapter::NetworkProtocol;
use crate::error::CoreError;
use crate::model::{DownlinkArgs, DownlinkRequest, Network, Uplink, UplinkOutcome, UplinkResult};

pub use delivery::{ApplicationDelivery, WebhookDelivery};

pub const DEFAULT_DOWNLINK_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_CHANNEL_SIZE: usize = 64;

/// What a waiting submitter receives. Worker failures keep their
/// `CoreError` kind; failures reported as result events become `Api`.
type Resolution = Result<serde_json::Value, CoreError>;

pub struct UplinkRouter {
    pending: DashMap<Uuid, oneshot::Sender<Resolution>>,
    requests: mpsc::Sender<DownlinkRequest>,
    timeout: Duration,
    delivery: Arc<dyn ApplicationDelivery>,
}

/// Removes a registration when its submitter stops waiting, whether it
/// was resolved, timed out, or dropped.
struct PendingGuard<'a> {
    pending: &'a DashMap<Uuid, oneshot::Sender<Resolution>>,
    id: Uuid,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

impl UplinkRouter {
    /// Create a router and the receiving end its worker should consume.
    pub fn new(
        delivery: Arc<dyn ApplicationDelivery>,
        timeout: Duration,
    ) -> (Arc<Self>, mpsc::Receiver<DownlinkRequest>) {
        let (requests, rx) = mpsc::channel(REQUEST_CHANNEL_SIZE);
        let router = Arc::new(Self {
            pending: DashMap::new(),
            requests,
            timeout,
            delivery,
        });
        (router, rx)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of submissions still waiting for a result.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Emit a downlink and wait for the result reported under its id.
    pub async fn submit_downlink(&self, args: DownlinkArgs) -> Result<serde_json::Value, CoreError> {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };

        self.requests
            .send(DownlinkRequest { id, args })
            .await
            .map_err(|_| CoreError::Internal("downlink worker is not running".into()))?;
        debug!(%id, "downlink submitted");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(_)) => Err(CoreError::Internal(format!(
                "downlink {id} was dropped without a result"
            ))),
            Err(_) => {
                warn!(%id, timeout_secs = self.timeout.as_secs(), "downlink timed out");
                Err(CoreError::DownlinkTimeout {
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }

    /// Resolve the submission registered under `result.id`. Returns
    /// `false` when nothing is waiting (unknown id or already resolved).
    pub fn report_uplink_result(&self, result: UplinkResult) -> bool {
        let resolution = match result.outcome {
            UplinkOutcome::Ok(payload) => Ok(payload),
            UplinkOutcome::Fail(message) => Err(CoreError::Api {
                message,
                status: None,
                code: None,
            }),
        };
        self.resolve(result.id, resolution)
    }

    /// Fail the submission registered under `id` with a typed error.
    pub fn report_failure(&self, id: Uuid, err: CoreError) -> bool {
        self.resolve(id, Err(err))
    }

    fn resolve(&self, id: Uuid, resolution: Resolution) -> bool {
        match self.pending.remove(&id) {
            Some((_, tx)) => tx.send(resolution).is_ok(),
            None => {
                debug!(%id, "no pending downlink for result");
                false
            }
        }
    }

    /// Route a normalized uplink: a correlated one resolves its pending
    /// submission, anything else goes to application delivery.
    pub async fn dispatch_uplink(&self, uplink: Uplink) -> Result<(), CoreError> {
        if let Some(id) = uplink.correlation_id {
            let payload = serde_json::to_value(&uplink)
                .map_err(|e| CoreError::Internal(format!("cannot encode uplink: {e}")))?;
            if self.report_uplink_result(UplinkResult {
                id,
                outcome: UplinkOutcome::Ok(payload),
            }) {
                return Ok(());
            }
        }
        self.delivery.deliver(&uplink).await
    }
}

/// Consume downlink requests and hand them to the network's adapter.
/// Adapter failures are reported back under the request id with their
/// error kind intact.
pub async fn run_downlink_worker(
    router: Arc<UplinkRouter>,
    mut rx: mpsc::Receiver<DownlinkRequest>,
    adapter: Arc<dyn NetworkProtocol>,
    network: Network,
    cancel: CancellationToken,
) {
    info!(network = %network.id, "downlink worker started");
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            request = rx.recv() => {
                let Some(request) = request else { break };
                match adapter.pass_data_to_device(&network, &request.args).await {
                    Ok(()) => {
                        router.report_uplink_result(UplinkResult {
                            id: request.id,
                            outcome: UplinkOutcome::Ok(serde_json::json!({
                                "accepted": true,
                                "deviceId": request.args.device_id,
                            })),
                        });
                    }
                    Err(e) => {
                        warn!(id = %request.id, error = %e, "downlink rejected");
                        router.report_failure(request.id, e);
                    }
                }
            }
        }
    }
    debug!(network = %network.id, "downlink worker stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Downlink, LocalId, NetworkId, RemoteId};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Uplink>>);

    #[async_trait]
    impl ApplicationDelivery for Recorder {
        async fn deliver(&self, uplink: &Uplink) -> Result<(), CoreError> {
            self.0.lock().unwrap().push(uplink.clone());
            Ok(())
        }
    }

    fn args() -> DownlinkArgs {
        DownlinkArgs {
            application_id: RemoteId::new("1"),
            device_id: RemoteId::new("0004a30b001c0530"),
            downlink: Downlink {
                f_port: 1,
                confirmed: false,
                data: vec![1],
            },
        }
    }

    fn uplink(correlation_id: Option<Uuid>) -> Uplink {
        Uplink {
            network_id: NetworkId::from("lab"),
            application_id: LocalId(1),
            device_id: RemoteId::new("0004a30b001c0530"),
            dev_eui: None,
            f_port: Some(1),
            f_cnt: Some(7),
            payload: Some("AQ==".into()),
            decoded: None,
            correlation_id,
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn result_resolves_exactly_once() {
        let (router, mut rx) = UplinkRouter::new(Arc::new(Recorder::default()), DEFAULT_DOWNLINK_TIMEOUT);

        let submitter = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.submit_downlink(args()).await })
        };

        let request = rx.recv().await.unwrap();
        assert_eq!(router.pending_len(), 1);

        let ok = UplinkResult {
            id: request.id,
            outcome: UplinkOutcome::Ok(serde_json::json!({"ack": true})),
        };
        assert!(router.report_uplink_result(ok.clone()));
        assert!(!router.report_uplink_result(ok));

        let payload = submitter.await.unwrap().unwrap();
        assert_eq!(payload["ack"], true);
        assert_eq!(router.pending_len(), 0);
    }

    #[tokio::test]
    async fn failure_outcome_is_an_error() {
        let (router, mut rx) = UplinkRouter::new(Arc::new(Recorder::default()), DEFAULT_DOWNLINK_TIMEOUT);
        let submitter = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.submit_downlink(args()).await })
        };

        let request = rx.recv().await.unwrap();
        router.report_uplink_result(UplinkResult {
            id: request.id,
            outcome: UplinkOutcome::Fail("device unknown".into()),
        });

        let err = submitter.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("device unknown"));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_submission_times_out_and_is_removed() {
        let (router, _rx) =
            UplinkRouter::new(Arc::new(Recorder::default()), Duration::from_secs(5));

        let err = router.submit_downlink(args()).await.unwrap_err();
        assert!(matches!(err, CoreError::DownlinkTimeout { timeout_secs: 5 }));
        assert_eq!(router.pending_len(), 0);
    }

    #[tokio::test]
    async fn worker_keeps_the_unknown_device_error_kind() {
        use crate::adapter::IpAdapter;
        use crate::model::ProtocolKind;

        let (router, rx) =
            UplinkRouter::new(Arc::new(Recorder::default()), DEFAULT_DOWNLINK_TIMEOUT);
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(run_downlink_worker(
            Arc::clone(&router),
            rx,
            Arc::new(IpAdapter::new()),
            Network::new("lab", ProtocolKind::GenericIp),
            cancel.clone(),
        ));

        // nothing registered, so the adapter rejects the device
        let err = router.submit_downlink(args()).await.unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
        assert_eq!(router.pending_len(), 0);

        cancel.cancel();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn correlated_uplink_resolves_pending_submission() {
        let recorder = Arc::new(Recorder::default());
        let (router, mut rx) = UplinkRouter::new(recorder.clone(), DEFAULT_DOWNLINK_TIMEOUT);
        let submitter = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.submit_downlink(args()).await })
        };

        let request = rx.recv().await.unwrap();
        router.dispatch_uplink(uplink(Some(request.id))).await.unwrap();

        let payload = submitter.await.unwrap().unwrap();
        assert_eq!(payload["f_cnt"], 7);
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn uncorrelated_uplink_is_delivered() {
        let recorder = Arc::new(Recorder::default());
        let (router, _rx) = UplinkRouter::new(recorder.clone(), DEFAULT_DOWNLINK_TIMEOUT);

        router.dispatch_uplink(uplink(None)).await.unwrap();
        // an id nobody waits for falls through to delivery too
        router.dispatch_uplink(uplink(Some(Uuid::new_v4()))).await.unwrap();

        assert_eq!(recorder.0.lock().unwrap().len(), 2);
    }
}
