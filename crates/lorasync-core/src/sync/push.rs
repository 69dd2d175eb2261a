// ── Push: local → remote ──

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::{PushOptions, SyncEngine, SyncOutcome, SyncReport};
use crate::adapter::{DeviceContext, NetworkProtocol};
use crate::error::CoreError;
use crate::model::{
    ApplicationLink, DeviceLink, DeviceProfileRecord, LocalId, Network, NetworkId, RemoteId,
};
use crate::store::{DataKey, EntityKind};

impl SyncEngine {
    /// Export every application, device profile and device linked to
    /// `network`. Per-entity failures land in the report; only errors
    /// that make the network unusable abort the run.
    pub async fn push(
        &self,
        network: &Network,
        adapter: &dyn NetworkProtocol,
        options: &PushOptions,
    ) -> Result<SyncReport, CoreError> {
        adapter.connect(network).await?;
        let mut report = SyncReport::new(network.id.clone());

        let app_links = self.locals.list_application_links(&network.id).await?;
        self.record_company_mappings(network, &app_links).await?;

        for link in &app_links {
            let name = link.settings.name.as_str();
            let outcome = match self.push_application(network, adapter, link, options).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(network = %network.id, application = name, error = %e, "application push failed");
                    SyncOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.record(EntityKind::Application, link.application_id, name, outcome);
        }

        let device_links = self.locals.list_device_links(&network.id).await?;

        if adapter.has_native_profiles() {
            let profile_ids: BTreeSet<LocalId> =
                device_links.iter().map(|l| l.device_profile_id).collect();
            for profile_id in profile_ids {
                let (name, result) = match self.locals.get_device_profile(profile_id).await {
                    Ok(Some(record)) => (
                        record.profile.name.clone(),
                        self.push_device_profile(network, adapter, &record).await,
                    ),
                    Ok(None) => (
                        profile_id.to_string(),
                        Err(CoreError::not_found("device profile", profile_id)),
                    ),
                    Err(e) => (profile_id.to_string(), Err(e)),
                };
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(network = %network.id, profile = %name, error = %e, "device profile push failed");
                        SyncOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                report.record(EntityKind::DeviceProfile, profile_id, name, outcome);
            }
        }

        // Devices go out as one batch; every member settles on its own.
        let results = join_all(
            device_links
                .iter()
                .map(|link| self.push_device(network, adapter, link)),
        )
        .await;

        let mut fatal = None;
        for (link, result) in device_links.iter().zip(results) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(network = %network.id, device = %link.settings.dev_eui, error = %e, "device push failed");
                    let outcome = SyncOutcome::Failed {
                        reason: e.to_string(),
                    };
                    if e.is_fatal() && fatal.is_none() {
                        fatal = Some(e);
                    }
                    outcome
                }
            };
            report.record(EntityKind::Device, link.device_id, &link.settings.name, outcome);
        }
        if let Some(e) = fatal {
            return Err(e);
        }

        info!(
            network = %network.id,
            created = report.created(),
            already_synced = report.already_synced(),
            failed = report.failed(),
            "push complete"
        );
        Ok(report)
    }

    /// Push to several networks concurrently. Each result belongs to its
    /// own network; a failure never stops the others.
    pub async fn push_networks(
        &self,
        targets: &[(Network, Arc<dyn NetworkProtocol>)],
        options: &PushOptions,
    ) -> Vec<(NetworkId, Result<SyncReport, CoreError>)> {
        let runs = targets.iter().map(|(network, adapter)| async move {
            let result = self.push(network, adapter.as_ref(), options).await;
            if let Err(e) = &result {
                warn!(network = %network.id, error = %e, "push aborted");
            }
            (network.id.clone(), result)
        });
        join_all(runs).await
    }

    // ── Companies ────────────────────────────────────────────────────

    /// Companies map onto the network's configured organization.
    async fn record_company_mappings(
        &self,
        network: &Network,
        links: &[ApplicationLink],
    ) -> Result<(), CoreError> {
        let Some(org) = network.settings.organization_id.as_deref() else {
            return Ok(());
        };
        let mut companies = BTreeSet::new();
        for link in links {
            if let Some(record) = self.locals.get_application(link.application_id).await? {
                companies.insert(record.company_id);
            }
        }
        for company_id in companies {
            let key = DataKey::remote_id(EntityKind::Company, company_id);
            if self.data.load_value(&network.id, &key).await?.is_none() {
                self.data.upsert(&network.id, &key, org).await?;
                debug!(network = %network.id, %company_id, organization_id = org, "company mapped");
            }
        }
        Ok(())
    }

    // ── Applications ─────────────────────────────────────────────────

    async fn push_application(
        &self,
        network: &Network,
        adapter: &dyn NetworkProtocol,
        link: &ApplicationLink,
        options: &PushOptions,
    ) -> Result<SyncOutcome, CoreError> {
        let key = DataKey::remote_id(EntityKind::Application, link.application_id);

        if let Some(stored) = self.data.load_value(&network.id, &key).await? {
            let remote_id = RemoteId::new(stored);
            if !options.verify_mappings
                || adapter.application_exists(network, &remote_id).await?
            {
                debug!(network = %network.id, application_id = %link.application_id, %remote_id, "application already synced");
                return Ok(SyncOutcome::AlreadySynced);
            }
            warn!(
                network = %network.id,
                application_id = %link.application_id,
                %remote_id,
                "remote application is gone, dropping stale mapping"
            );
            self.data.delete_key(&network.id, &key).await?;
        }

        let remote_id = adapter
            .create_application(network, link.application_id, &link.settings)
            .await?;
        self.data
            .upsert(&network.id, &key, remote_id.as_str())
            .await?;
        Ok(SyncOutcome::Created { remote_id })
    }

    // ── Device profiles ──────────────────────────────────────────────

    async fn push_device_profile(
        &self,
        network: &Network,
        adapter: &dyn NetworkProtocol,
        record: &DeviceProfileRecord,
    ) -> Result<SyncOutcome, CoreError> {
        let key = DataKey::remote_id(EntityKind::DeviceProfile, record.id);
        if self.data.load_value(&network.id, &key).await?.is_some() {
            return Ok(SyncOutcome::AlreadySynced);
        }
        let remote_id = adapter
            .create_device_profile(network, record.id, &record.profile)
            .await?;
        self.data
            .upsert(&network.id, &key, remote_id.as_str())
            .await?;
        Ok(SyncOutcome::Created { remote_id })
    }

    // ── Devices ──────────────────────────────────────────────────────

    async fn push_device(
        &self,
        network: &Network,
        adapter: &dyn NetworkProtocol,
        link: &DeviceLink,
    ) -> Result<SyncOutcome, CoreError> {
        let record = self
            .locals
            .get_device(link.device_id)
            .await?
            .ok_or_else(|| CoreError::not_found("device", link.device_id))?;

        // The owning application must already have a remote twin.
        let application_id = self
            .require_mapping(&network.id, EntityKind::Application, record.application_id)
            .await?;

        let key = DataKey::remote_id(EntityKind::Device, link.device_id);
        if self.data.load_value(&network.id, &key).await?.is_some() {
            return Ok(SyncOutcome::AlreadySynced);
        }

        let profile = self
            .locals
            .get_device_profile(link.device_profile_id)
            .await?
            .ok_or_else(|| CoreError::not_found("device profile", link.device_profile_id))?;
        let profile_id = if adapter.has_native_profiles() {
            Some(
                self.require_mapping(&network.id, EntityKind::DeviceProfile, link.device_profile_id)
                    .await?,
            )
        } else {
            None
        };

        let ctx = DeviceContext {
            local_id: link.device_id,
            application_id,
            profile_id,
            profile: profile.profile,
        };
        let remote_id = adapter.create_device(network, &ctx, &link.settings).await?;
        self.data
            .upsert(&network.id, &key, remote_id.as_str())
            .await?;
        Ok(SyncOutcome::Created { remote_id })
    }

    async fn require_mapping(
        &self,
        network: &NetworkId,
        kind: EntityKind,
        local_id: LocalId,
    ) -> Result<RemoteId, CoreError> {
        let key = DataKey::remote_id(kind, local_id);
        match self.data.load_value(network, &key).await? {
            Some(value) => Ok(RemoteId::new(value)),
            None => Err(CoreError::MappingNotFound {
                network: network.to_string(),
                key: key.to_string(),
            }),
        }
    }
}
